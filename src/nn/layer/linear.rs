/*
 * @Author       : 老董
 * @Date         : 2026-01-17
 * @Description  : Linear (全连接) 层
 */

use super::{Layer, init_param};
use crate::nn::{Accepts, Bias, Kwargs, LayerError, Module, TrainVar};
use crate::tensor::Tensor;
use tracing::debug;

/// Linear (全连接) 层：`output = x @ W + b`
///
/// # 输入/输出形状
/// - 输入：[..., in_features]（前导维度任意）
/// - 输出：[..., out_features]
///
/// # 使用示例
/// ```ignore
/// let fc = Linear::new(784, 128, true, Init::XavierNormal.initializer(generator.clone()))?;
/// let h = fc.forward(&x)?;
/// ```
#[derive(Debug, Clone)]
pub struct Linear {
    /// 权重参数 [in_features, out_features]
    weight: TrainVar,
    /// 偏置参数 [out_features]（可选）
    bias: Bias,
}

impl Linear {
    /// 创建新的 Linear 层
    ///
    /// # 参数
    /// - `nin`: 输入特征维度
    /// - `nout`: 输出特征维度
    /// - `use_bias`: 是否使用偏置
    /// - `w_init`: 由权重形状生成初始权重的函数
    pub fn new(
        nin: usize,
        nout: usize,
        use_bias: bool,
        w_init: impl FnOnce(&[usize]) -> Tensor,
    ) -> Result<Self, LayerError> {
        let weight = init_param(w_init, &[nin, nout])?;
        let bias = Bias::zeros(use_bias, &[nout]);
        debug!(nin, nout, use_bias, "创建Linear");
        Ok(Self { weight, bias })
    }

    pub fn forward(&self, x: &Tensor) -> Result<Tensor, LayerError> {
        let y = x.mat_mul(self.weight.value())?;
        self.bias.apply(y)
    }

    pub fn weight(&self) -> &TrainVar {
        &self.weight
    }

    pub fn bias(&self) -> &Bias {
        &self.bias
    }

    pub fn in_features(&self) -> usize {
        self.weight.shape()[0]
    }

    pub fn out_features(&self) -> usize {
        self.weight.shape()[1]
    }
}

impl Layer for Linear {
    fn accepts(&self) -> Accepts {
        Accepts::InputOnly
    }

    fn call(&mut self, x: &Tensor, kwargs: &Kwargs) -> Result<Tensor, LayerError> {
        self.accepts().check(kwargs)?;
        self.forward(x)
    }
}

impl Module for Linear {
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
