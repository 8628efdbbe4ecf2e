/*
 * @Author       : 老董
 * @Date         : 2026-01-28
 * @Description  : ConvTranspose2d (2D 转置卷积) 层
 *
 * 卷积核以“被转置的那个前向卷积”的视角存放：即 in_channels = nout、out_channels = nin 的
 * Conv2d 卷积核，形状 [kernel_h, kernel_w, nout, nin]。计算时在空间维翻转，并交换其输入/输出通道轴。
 *
 * 输出尺寸（k_eff = (k - 1) * dilation + 1）：
 * - SAME：H' = H * stride_h
 * - VALID：H' = H * stride_h + max(k_eff - stride_h, 0)
 */

use super::{Layer, check_at_least_one, init_param};
use crate::nn::{Accepts, Bias, Kwargs, LayerError, Module, TrainVar};
use crate::tensor::{ConvPadding, Tensor};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// ConvTranspose2d 的超参数（不支持分组）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvTransposeConfig {
    pub strides: (usize, usize),
    pub dilations: (usize, usize),
    pub padding: ConvPadding,
    pub use_bias: bool,
}

impl Default for ConvTransposeConfig {
    fn default() -> Self {
        Self {
            strides: (1, 1),
            dilations: (1, 1),
            padding: ConvPadding::Same,
            use_bias: true,
        }
    }
}

/// ConvTranspose2d (2D 转置卷积) 层，即普通卷积关于其输入的梯度运算
#[derive(Debug, Clone)]
pub struct ConvTranspose2d {
    /// 卷积核参数 [kernel_h, kernel_w, out_channels, in_channels]
    weight: TrainVar,
    /// 偏置参数 [out_channels, 1, 1]（可选）
    bias: Bias,
    in_channels: usize,
    out_channels: usize,
    kernel_size: (usize, usize),
    config: ConvTransposeConfig,
}

impl ConvTranspose2d {
    /// 创建新的 ConvTranspose2d 层
    ///
    /// # 参数
    /// - `nin`: 输入通道数
    /// - `nout`: 输出通道数
    /// - `kernel_size`: 卷积核大小 (kH, kW)
    /// - `config`: 步长、膨胀、填充及是否使用偏置
    /// - `w_init`: 由卷积核形状生成初始权重的函数
    pub fn new(
        nin: usize,
        nout: usize,
        kernel_size: (usize, usize),
        config: ConvTransposeConfig,
        w_init: impl FnOnce(&[usize]) -> Tensor,
    ) -> Result<Self, LayerError> {
        check_at_least_one("strides", config.strides.0.min(config.strides.1))?;
        check_at_least_one("dilations", config.dilations.0.min(config.dilations.1))?;

        let (k_h, k_w) = kernel_size;
        // 前向卷积视角：输入 nout 通道，输出 nin 通道
        let weight = init_param(w_init, &[k_h, k_w, nout, nin])?;
        let bias = Bias::zeros(config.use_bias, &[nout, 1, 1]);
        debug!(nin, nout, ?kernel_size, ?config, "创建ConvTranspose2d");

        Ok(Self {
            weight,
            bias,
            in_channels: nin,
            out_channels: nout,
            kernel_size,
            config,
        })
    }

    /// 前向传播：[batch_size, in_channels, H, W] -> [batch_size, out_channels, H', W']
    pub fn forward(&self, x: &Tensor) -> Result<Tensor, LayerError> {
        let ConvTransposeConfig {
            strides,
            dilations,
            padding,
            ..
        } = self.config;
        let y = x.conv_transpose2d(self.weight.value(), strides, padding, dilations)?;
        self.bias.apply(y)
    }

    pub fn weight(&self) -> &TrainVar {
        &self.weight
    }

    pub fn bias(&self) -> &Bias {
        &self.bias
    }

    pub fn in_channels(&self) -> usize {
        self.in_channels
    }

    pub fn out_channels(&self) -> usize {
        self.out_channels
    }

    pub fn kernel_size(&self) -> (usize, usize) {
        self.kernel_size
    }

    pub fn config(&self) -> ConvTransposeConfig {
        self.config
    }
}

impl Layer for ConvTranspose2d {
    fn accepts(&self) -> Accepts {
        Accepts::InputOnly
    }

    fn call(&mut self, x: &Tensor, kwargs: &Kwargs) -> Result<Tensor, LayerError> {
        self.accepts().check(kwargs)?;
        self.forward(x)
    }
}

impl Module for ConvTranspose2d {
    fn parameters(&self) -> Vec<&TrainVar> {
        let mut params = vec![&self.weight];
        params.extend(self.bias.var());
        params
    }

    fn parameters_mut(&mut self) -> Vec<&mut TrainVar> {
        let mut params = vec![&mut self.weight];
        params.extend(self.bias.var_mut());
        params
    }
}
