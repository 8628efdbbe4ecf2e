/*
 * @Author       : 老董
 * @Date         : 2025-12-22
 * @Description  : 二维卷积（及其转置）的数值实现
 *
 * 约定：
 * - 输入/输出：Batch-First 的 NCHW，即 [batch, C, H, W]
 * - 卷积核：HWIO，即 [kH, kW, C_in/groups, C_out]
 * - 卷积为深度学习意义上的互相关（不翻转卷积核）
 * - 使用 Rayon 在 batch 维度并行加速
 *
 * 所有变体都归结为一个“通用膨胀卷积”：窗口步长、上下填充、输入（lhs）膨胀、卷积核（rhs）膨胀、分组数。
 * 转置卷积即“输入膨胀 = 步长、窗口步长 = 1”的通用卷积，再配合翻转并交换输入/输出通道的卷积核。
 */

use crate::errors::TensorError;
use crate::tensor::Tensor;
use ndarray::{Array, ArrayView4, Ix4, IxDyn, s};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// 卷积的填充策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConvPadding {
    /// 步长为1时输出与输入的空间尺寸相同
    #[default]
    Same,
    /// 不填充
    Valid,
}

struct ConvParams {
    window_strides: (usize, usize),
    /// 每个空间维的(上/左, 下/右)填充量
    padding: [(usize, usize); 2],
    lhs_dilation: (usize, usize),
    rhs_dilation: (usize, usize),
    groups: usize,
}

/// 膨胀后的尺寸：相邻元素之间插入`dilation - 1`个空洞
const fn dilate_dim(size: usize, dilation: usize) -> usize {
    if size == 0 { 0 } else { (size - 1) * dilation + 1 }
}

/// 普通卷积的 SAME 填充：输出尺寸为`ceil(in / stride)`，多出的填充量放在后侧
fn same_padding(input: usize, kernel: usize, stride: usize) -> (usize, usize) {
    let out = input.div_ceil(stride);
    let pad = ((out.saturating_sub(1)) * stride + kernel).saturating_sub(input);
    (pad / 2, pad - pad / 2)
}

/// 转置卷积的填充量（`kernel`为膨胀后的有效尺寸）。
/// SAME 得到的输出尺寸为`in * stride`；VALID 为`in * stride + max(kernel - stride, 0)`
fn transpose_padding(kernel: usize, stride: usize, padding: ConvPadding) -> (usize, usize) {
    let (pad_len, lo) = match padding {
        ConvPadding::Same => {
            let pad_len = kernel + stride - 2;
            let lo = if stride > kernel - 1 {
                kernel - 1
            } else {
                pad_len.div_ceil(2)
            };
            (pad_len, lo)
        }
        ConvPadding::Valid => (kernel + stride - 2 + kernel.saturating_sub(stride), kernel - 1),
    };
    (lo, pad_len - lo)
}

/// 将“膨胀并填充后”坐标映射回原输入的下标；落在填充区或空洞上时返回None
fn source_index(pos: usize, pad_lo: usize, dilation: usize, size: usize) -> Option<usize> {
    let rel = pos.checked_sub(pad_lo)?;
    if rel % dilation != 0 {
        return None;
    }
    let index = rel / dilation;
    (index < size).then_some(index)
}

fn check_positive(name: &'static str, values: (usize, usize)) -> Result<(), TensorError> {
    match values {
        (0, _) => Err(TensorError::InvalidConvParam { name, value: 0 }),
        (_, 0) => Err(TensorError::InvalidConvParam { name, value: 0 }),
        _ => Ok(()),
    }
}

fn as_4d<'a>(tensor: &'a Tensor, op: &'static str) -> Result<ArrayView4<'a, f32>, TensorError> {
    tensor
        .data
        .view()
        .into_dimensionality::<Ix4>()
        .map_err(|_| TensorError::RankMismatch {
            op,
            expected: 4,
            got: tensor.shape().to_vec(),
        })
}

fn conv_general_dilated(
    input: ArrayView4<'_, f32>,
    kernel: ArrayView4<'_, f32>,
    params: &ConvParams,
) -> Result<Tensor, TensorError> {
    let (batch, in_c, in_h, in_w) = input.dim();
    let (k_h, k_w, k_in, out_c) = kernel.dim();
    let groups = params.groups;
    if groups == 0 || out_c % groups != 0 {
        return Err(TensorError::InvalidConvParam {
            name: "groups",
            value: groups,
        });
    }
    if in_c != k_in * groups {
        return Err(TensorError::ChannelMismatch {
            expected: k_in * groups,
            got: in_c,
        });
    }

    let [(pad_top, pad_bottom), (pad_left, pad_right)] = params.padding;
    let (stride_h, stride_w) = params.window_strides;
    let (lhs_h, lhs_w) = params.lhs_dilation;
    let (rhs_h, rhs_w) = params.rhs_dilation;
    let padded_h = dilate_dim(in_h, lhs_h) + pad_top + pad_bottom;
    let padded_w = dilate_dim(in_w, lhs_w) + pad_left + pad_right;
    let (eff_k_h, eff_k_w) = (dilate_dim(k_h, rhs_h), dilate_dim(k_w, rhs_w));
    if eff_k_h == 0 || eff_k_w == 0 || padded_h < eff_k_h || padded_w < eff_k_w {
        return Err(TensorError::EmptyConvOutput {
            input: input.shape().to_vec(),
            kernel: kernel.shape().to_vec(),
        });
    }
    let out_h = (padded_h - eff_k_h) / stride_h + 1;
    let out_w = (padded_w - eff_k_w) / stride_w + 1;
    let out_per_group = out_c / groups;
    let single_sample_size = out_c * out_h * out_w;

    // Rayon 并行计算每个 batch 样本
    let batch_results: Vec<Vec<f32>> = (0..batch)
        .into_par_iter()
        .map(|b| {
            let mut sample_data = vec![0.0f32; single_sample_size];
            for oc in 0..out_c {
                let first_in_channel = (oc / out_per_group) * k_in;
                for oh in 0..out_h {
                    for ow in 0..out_w {
                        let mut sum = 0.0f32;
                        for ic in 0..k_in {
                            for kh in 0..k_h {
                                let Some(ih) =
                                    source_index(oh * stride_h + kh * rhs_h, pad_top, lhs_h, in_h)
                                else {
                                    continue;
                                };
                                for kw in 0..k_w {
                                    let Some(iw) = source_index(
                                        ow * stride_w + kw * rhs_w,
                                        pad_left,
                                        lhs_w,
                                        in_w,
                                    ) else {
                                        continue;
                                    };
                                    sum += input[[b, first_in_channel + ic, ih, iw]]
                                        * kernel[[kh, kw, ic, oc]];
                                }
                            }
                        }
                        sample_data[(oc * out_h + oh) * out_w + ow] = sum;
                    }
                }
            }
            sample_data
        })
        .collect();

    let all_data: Vec<f32> = batch_results.into_iter().flatten().collect();
    let data = Array::from_shape_vec(IxDyn(&[batch, out_c, out_h, out_w]), all_data)
        .map_err(|_| TensorError::IncompatibleShape)?;
    Ok(Tensor::from_array(data))
}

impl Tensor {
    /// 分组、膨胀的二维卷积（互相关）。
    /// * `self` - 输入 [batch, C_in, H, W]
    /// * `kernel` - 卷积核 [kH, kW, C_in/groups, C_out]
    ///
    /// 输出 [batch, C_out, H', W']
    pub fn conv2d(
        &self,
        kernel: &Tensor,
        strides: (usize, usize),
        padding: ConvPadding,
        dilations: (usize, usize),
        groups: usize,
    ) -> Result<Tensor, TensorError> {
        check_positive("strides", strides)?;
        check_positive("dilations", dilations)?;
        let input = as_4d(self, "conv2d")?;
        let kernel = as_4d(kernel, "conv2d")?;
        let (_, _, in_h, in_w) = input.dim();
        let (k_h, k_w, _, _) = kernel.dim();

        let padding = match padding {
            ConvPadding::Same => [
                same_padding(in_h, dilate_dim(k_h, dilations.0), strides.0),
                same_padding(in_w, dilate_dim(k_w, dilations.1), strides.1),
            ],
            ConvPadding::Valid => [(0, 0), (0, 0)],
        };
        let params = ConvParams {
            window_strides: strides,
            padding,
            lhs_dilation: (1, 1),
            rhs_dilation: dilations,
            groups,
        };
        conv_general_dilated(input, kernel, &params)
    }

    /// 二维转置卷积（即普通卷积关于输入的梯度运算）。
    /// * `self` - 输入 [batch, C_in, H, W]
    /// * `kernel` - 以“被转置的前向卷积”的视角存放的卷积核 [kH, kW, C_out, C_in]；
    ///   计算前会先在空间维上翻转，并交换其输入/输出通道轴
    ///
    /// 输出 [batch, C_out, H', W']，其中 SAME 时`H' = H * stride`，
    /// VALID 时`H' = H * stride + max(kH_eff - stride, 0)`（`kH_eff`为膨胀后的卷积核尺寸）
    pub fn conv_transpose2d(
        &self,
        kernel: &Tensor,
        strides: (usize, usize),
        padding: ConvPadding,
        dilations: (usize, usize),
    ) -> Result<Tensor, TensorError> {
        check_positive("strides", strides)?;
        check_positive("dilations", dilations)?;
        let input = as_4d(self, "conv_transpose2d")?;
        let kernel = as_4d(kernel, "conv_transpose2d")?;
        let (k_h, k_w, _, _) = kernel.dim();
        if k_h == 0 || k_w == 0 {
            return Err(TensorError::EmptyConvOutput {
                input: input.shape().to_vec(),
                kernel: kernel.shape().to_vec(),
            });
        }
        let kernel = kernel.slice_move(s![..;-1, ..;-1, .., ..]).permuted_axes([0, 1, 3, 2]);

        let params = ConvParams {
            window_strides: (1, 1),
            padding: [
                transpose_padding(dilate_dim(k_h, dilations.0), strides.0, padding),
                transpose_padding(dilate_dim(k_w, dilations.1), strides.1, padding),
            ],
            lhs_dilation: strides,
            rhs_dilation: dilations,
            groups: 1,
        };
        conv_general_dilated(input, kernel, &params)
    }
}
