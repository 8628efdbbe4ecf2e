/*
 * @Author       : 老董
 * @Date         : 2025-12-22
 * @Description  : Conv2d (2D 卷积) 层
 *
 * 输入/输出形状：
 * - 输入：[batch_size, in_channels, H, W]
 * - 卷积核：[kernel_h, kernel_w, in_channels / groups, out_channels]（HWIO）
 * - 输出：[batch_size, out_channels, H', W']
 *
 * 输出尺寸计算（k_eff = (k - 1) * dilation + 1）：
 * - SAME：H' = ceil(H / stride_h)
 * - VALID：H' = (H - k_eff) / stride_h + 1
 *
 * 计算：output = conv2d(x, K) + b
 */

use super::{Layer, check_at_least_one, init_param};
use crate::nn::{Accepts, Bias, Kwargs, LayerError, Module, TrainVar};
use crate::tensor::{ConvPadding, Tensor};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Conv2d 的超参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Conv2dConfig {
    /// 步长 (stride_h, stride_w)
    pub strides: (usize, usize),
    /// 卷积核膨胀 (dilation_h, dilation_w)
    pub dilations: (usize, usize),
    /// 分组数，输入、输出通道数都须能被其整除
    pub groups: usize,
    pub padding: ConvPadding,
    pub use_bias: bool,
}

impl Default for Conv2dConfig {
    fn default() -> Self {
        Self {
            strides: (1, 1),
            dilations: (1, 1),
            groups: 1,
            padding: ConvPadding::Same,
            use_bias: true,
        }
    }
}

/// Conv2d (2D 卷积) 层
///
/// 深度学习意义上的卷积（互相关，不翻转卷积核），支持步长、膨胀与分组。
///
/// # 使用示例
/// ```ignore
/// let init = Init::KaimingNormal.initializer(generator.clone());
/// let mut conv = Conv2d::new(3, 16, (3, 3), Conv2dConfig::default(), init)?;
/// let h = conv.forward(&x)?; // [N, 3, H, W] -> [N, 16, H, W]
/// ```
#[derive(Debug, Clone)]
pub struct Conv2d {
    /// 卷积核参数 [kernel_h, kernel_w, in_channels / groups, out_channels]
    weight: TrainVar,
    /// 偏置参数 [out_channels, 1, 1]（可选）
    bias: Bias,
    in_channels: usize,
    out_channels: usize,
    kernel_size: (usize, usize),
    config: Conv2dConfig,
}

impl Conv2d {
    /// 创建新的 Conv2d 层
    ///
    /// # 参数
    /// - `nin`: 输入通道数
    /// - `nout`: 输出通道数
    /// - `kernel_size`: 卷积核大小 (kH, kW)
    /// - `config`: 步长、膨胀、分组、填充及是否使用偏置
    /// - `w_init`: 由卷积核形状生成初始权重的函数
    ///
    /// # 错误
    /// `nin`或`nout`不能被`groups`整除时，返回`GroupsNotDivisible`
    pub fn new(
        nin: usize,
        nout: usize,
        kernel_size: (usize, usize),
        config: Conv2dConfig,
        w_init: impl FnOnce(&[usize]) -> Tensor,
    ) -> Result<Self, LayerError> {
        check_at_least_one("groups", config.groups)?;
        check_at_least_one("strides", config.strides.0.min(config.strides.1))?;
        check_at_least_one("dilations", config.dilations.0.min(config.dilations.1))?;
        for (name, value) in [("nin", nin), ("nout", nout)] {
            if value % config.groups != 0 {
                return Err(LayerError::GroupsNotDivisible {
                    name,
                    value,
                    groups: config.groups,
                });
            }
        }

        let (k_h, k_w) = kernel_size;
        let weight = init_param(w_init, &[k_h, k_w, nin / config.groups, nout])?;
        let bias = Bias::zeros(config.use_bias, &[nout, 1, 1]);
        debug!(nin, nout, ?kernel_size, ?config, "创建Conv2d");

        Ok(Self {
            weight,
            bias,
            in_channels: nin,
            out_channels: nout,
            kernel_size,
            config,
        })
    }

    /// 前向传播
    ///
    /// # 参数
    /// - `x`: 输入，形状 [batch_size, in_channels, H, W]
    ///
    /// # 返回
    /// 输出，形状 [batch_size, out_channels, H', W']
    pub fn forward(&self, x: &Tensor) -> Result<Tensor, LayerError> {
        let Conv2dConfig {
            strides,
            dilations,
            groups,
            padding,
            ..
        } = self.config;
        let y = x.conv2d(self.weight.value(), strides, padding, dilations, groups)?;
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

    pub fn config(&self) -> Conv2dConfig {
        self.config
    }
}

impl Layer for Conv2d {
    fn accepts(&self) -> Accepts {
        Accepts::InputOnly
    }

    fn call(&mut self, x: &Tensor, kwargs: &Kwargs) -> Result<Tensor, LayerError> {
        self.accepts().check(kwargs)?;
        self.forward(x)
    }
}

impl Module for Conv2d {
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
