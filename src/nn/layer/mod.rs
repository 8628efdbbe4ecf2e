/*
 * @Author       : 老董
 * @Date         : 2025-12-22
 * @Description  : Layer 模块：各种网络层，以及统一的调用入口`Layer::call`
 *
 * 每个层都有签名各异的`forward()`（显式参数），同时实现`Layer` trait，
 * 以“输入张量 + 具名参数”的统一形式被`Sequential`调度。
 */

mod batch_norm;
mod conv2d;
mod conv_transpose2d;
mod dropout;
mod lambda;
mod linear;
mod moving_average;
mod sequential;
mod synced_batch_norm;

pub use batch_norm::{BatchNorm, BatchNormConfig, batch_norm_0d, batch_norm_1d, batch_norm_2d};
pub use conv_transpose2d::{ConvTranspose2d, ConvTransposeConfig};
pub use conv2d::{Conv2d, Conv2dConfig};
pub use dropout::Dropout;
pub use lambda::Lambda;
pub use linear::Linear;
pub use moving_average::{
    DEFAULT_EMA_MOMENTUM, ExponentialMovingAverage, MovingAverage, exponential_moving_average,
    moving_average,
};
pub use sequential::Sequential;
pub use synced_batch_norm::{
    SyncedBatchNorm, synced_batch_norm_0d, synced_batch_norm_1d, synced_batch_norm_2d,
};

use super::{Accepts, Kwargs, LayerError, Module, StateReset, StateVar, TrainVar};
use crate::errors::ComparisonOperator;
use crate::tensor::Tensor;
use enum_dispatch::enum_dispatch;
use std::fmt::Debug;

/// 层的统一调用入口
#[enum_dispatch]
pub trait Layer {
    /// 本层能接受的具名参数
    fn accepts(&self) -> Accepts;

    /// 以“输入张量 + 具名参数”的形式调用本层。
    /// 内置层遇到未声明的具名参数时返回`UnexpectedArgument`，缺少必需参数时返回`MissingArgument`
    fn call(&mut self, x: &Tensor, kwargs: &Kwargs) -> Result<Tensor, LayerError>;
}

/// 可被装箱放入`Sequential`的用户自定义层
pub trait DynLayer: Layer + Module + Send + Debug {}

impl<T: Layer + Module + Send + Debug> DynLayer for T {}

/// 装箱的用户自定义层
#[derive(Debug)]
pub struct Custom(Box<dyn DynLayer>);

impl Custom {
    pub fn new(layer: impl DynLayer + 'static) -> Self {
        Self(Box::new(layer))
    }
}

impl Layer for Custom {
    fn accepts(&self) -> Accepts {
        self.0.accepts()
    }

    fn call(&mut self, x: &Tensor, kwargs: &Kwargs) -> Result<Tensor, LayerError> {
        self.0.call(x, kwargs)
    }
}

impl Module for Custom {
    fn parameters(&self) -> Vec<&TrainVar> {
        self.0.parameters()
    }

    fn parameters_mut(&mut self) -> Vec<&mut TrainVar> {
        self.0.parameters_mut()
    }

    fn states(&self) -> Vec<&StateVar> {
        self.0.states()
    }

    fn states_mut(&mut self) -> Vec<StateReset<'_>> {
        self.0.states_mut()
    }
}

/// `Sequential`中可容纳的任意层
#[enum_dispatch(Layer, Module)]
#[derive(Debug)]
pub enum AnyLayer {
    BatchNorm(BatchNorm),
    SyncedBatchNorm(SyncedBatchNorm),
    Conv2d(Conv2d),
    ConvTranspose2d(ConvTranspose2d),
    Dropout(Dropout),
    Linear(Linear),
    MovingAverage(MovingAverage),
    ExponentialMovingAverage(ExponentialMovingAverage),
    Sequential(Sequential),
    Lambda(Lambda),
    Custom(Custom),
}

/// 以`w_init`创建形状为`shape`的可训练参数，并校验其返回的形状
fn init_param(
    w_init: impl FnOnce(&[usize]) -> Tensor,
    shape: &[usize],
) -> Result<TrainVar, LayerError> {
    let value = w_init(shape);
    if value.shape() != shape {
        return Err(LayerError::ParameterShape {
            expected: shape.to_vec(),
            got: value.shape().to_vec(),
        });
    }
    Ok(TrainVar::new(value))
}

/// 构造期校验：`value`须不小于1
fn check_at_least_one(value_name: &'static str, value: usize) -> Result<(), LayerError> {
    if value == 0 {
        return Err(LayerError::ValueMustSatisfyComparison {
            value_name,
            operator: ComparisonOperator::GreaterOrEqual,
            threshold: 1,
        });
    }
    Ok(())
}
