/*
 * @Author       : 老董
 * @Date         : 2026-01-29
 * @Description  : Sequential：按顺序串联多个层
 *
 * 每一步都以上一步的输出为输入，并只向该步转发它能接受的具名参数：
 * - `Accepts::Any`：转发全部具名参数
 * - `Accepts::Named(..)`：只转发交集
 * - `Accepts::InputOnly`：不转发
 * 每个层的接受能力在加入时确定，调用时不再重新判断。
 */

use super::{AnyLayer, Layer};
use crate::nn::{Accepts, Kwargs, LayerError, Module, StateReset, StateVar, TrainVar};
use crate::tensor::Tensor;
use tracing::trace;

/// 按顺序串联的层
///
/// # 使用示例
/// ```ignore
/// let mut model = Sequential::new(vec![
///     Conv2d::new(3, 8, (3, 3), Conv2dConfig::default(), init)?.into(),
///     BatchNorm::d2(8, BatchNormConfig::default()).into(),
///     Lambda::new(|x| Ok(x.map(|v| v.max(0.0)))).into(),
/// ]);
/// let y = model.forward(&x, &Kwargs::new().with("training", true))?;
/// ```
#[derive(Debug, Default)]
pub struct Sequential {
    entries: Vec<(Accepts, AnyLayer)>,
}

impl Sequential {
    pub fn new(layers: Vec<AnyLayer>) -> Self {
        let mut seq = Self::default();
        for layer in layers {
            seq.push(layer);
        }
        seq
    }

    /// 在末尾追加一个层
    pub fn push(&mut self, layer: impl Into<AnyLayer>) {
        let layer = layer.into();
        self.entries.push((layer.accepts(), layer));
    }

    pub fn forward(&mut self, x: &Tensor, kwargs: &Kwargs) -> Result<Tensor, LayerError> {
        let mut y = x.clone();
        for (index, (accepts, layer)) in self.entries.iter_mut().enumerate() {
            let forwarded = kwargs.select(*accepts);
            trace!(index, ?accepts, forwarded = forwarded.len(), "Sequential调度");
            y = layer.call(&y, &forwarded)?;
        }
        Ok(y)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&AnyLayer> {
        self.entries.get(index).map(|(_, layer)| layer)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut AnyLayer> {
        self.entries.get_mut(index).map(|(_, layer)| layer)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnyLayer> {
        self.entries.iter().map(|(_, layer)| layer)
    }
}

impl Layer for Sequential {
    fn accepts(&self) -> Accepts {
        Accepts::Any
    }

    fn call(&mut self, x: &Tensor, kwargs: &Kwargs) -> Result<Tensor, LayerError> {
        self.forward(x, kwargs)
    }
}

impl Module for Sequential {
    fn parameters(&self) -> Vec<&TrainVar> {
        self.iter().flat_map(|layer| layer.parameters()).collect()
    }

    fn parameters_mut(&mut self) -> Vec<&mut TrainVar> {
        self.entries
            .iter_mut()
            .flat_map(|(_, layer)| layer.parameters_mut())
            .collect()
    }

    fn states(&self) -> Vec<&StateVar> {
        self.iter().flat_map(|layer| layer.states()).collect()
    }

    fn states_mut(&mut self) -> Vec<StateReset<'_>> {
        self.entries
            .iter_mut()
            .flat_map(|(_, layer)| layer.states_mut())
            .collect()
    }
}
