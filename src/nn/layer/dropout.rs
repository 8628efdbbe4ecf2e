/*
 * @Author       : 老董
 * @Date         : 2026-01-28
 * @Description  : Dropout 层（反向缩放：保留的元素除以 keep，使激活的期望不变）
 */

use super::Layer;
use crate::distribution::Generator;
use crate::nn::{Accepts, Kwargs, LayerError, Module, TrainVar};
use crate::tensor::Tensor;
use tracing::debug;

/// Dropout 层
///
/// 非训练模式、或实际保留概率不小于1时原样返回输入，且**不**消耗随机数；
/// 否则逐元素抽取 Bernoulli(keep) 掩码，输出`mask ? x / keep : 0`。
#[derive(Debug, Clone)]
pub struct Dropout {
    keep: f32,
    generator: Generator,
}

impl Dropout {
    const KWARGS: &'static [&'static str] = &["training", "dropout_keep"];

    /// * `keep` - 保留概率，应位于(0, 1]
    /// * `generator` - 掩码的随机来源
    pub fn new(keep: f32, generator: Generator) -> Self {
        debug!(keep, "创建Dropout");
        Self { keep, generator }
    }

    /// * `dropout_keep` - 临时覆盖保留概率；为`None`或0时使用构造时的`keep`
    pub fn forward(
        &self,
        x: &Tensor,
        training: bool,
        dropout_keep: Option<f32>,
    ) -> Result<Tensor, LayerError> {
        let keep = dropout_keep.filter(|&k| k != 0.0).unwrap_or(self.keep);
        if !training || keep >= 1.0 {
            return Ok(x.clone());
        }
        let mask = self.generator.bernoulli(keep, x.shape());
        Ok(x.keep_where(&mask, |v| v / keep)?)
    }

    pub fn keep(&self) -> f32 {
        self.keep
    }
}

impl Layer for Dropout {
    fn accepts(&self) -> Accepts {
        Accepts::Named(Self::KWARGS)
    }

    fn call(&mut self, x: &Tensor, kwargs: &Kwargs) -> Result<Tensor, LayerError> {
        self.accepts().check(kwargs)?;
        let training = kwargs.require_bool("training")?;
        let dropout_keep = kwargs.float("dropout_keep")?;
        self.forward(x, training, dropout_keep)
    }
}

impl Module for Dropout {
    fn parameters(&self) -> Vec<&TrainVar> {
        Vec::new()
    }

    fn parameters_mut(&mut self) -> Vec<&mut TrainVar> {
        Vec::new()
    }
}
