/*
 * @Author       : 老董
 * @Date         : 2026-01-28
 * @Description  : 滑动平均：固定窗口的 MovingAverage，以及指数滑动平均 ExponentialMovingAverage
 */

use super::{Layer, check_at_least_one};
use crate::nn::{Accepts, Kwargs, LayerError, Module, StateReset, StateVar, TrainVar};
use crate::tensor::Tensor;
use tracing::{debug, trace};

/// ExponentialMovingAverage 的默认动量
pub const DEFAULT_EMA_MOMENTUM: f32 = 0.999;

// ==================== MovingAverage ====================

/// 固定窗口的滑动平均
///
/// 缓冲区形状为`[buffer_size, *shape]`，构造时以`init_value`填满。每次调用丢弃最旧的样本、
/// 在末尾追加新样本（先进先出），并返回缓冲区沿第0维的均值。
/// 因此首次调用的结果已包含`buffer_size - 1`个初始值。
#[derive(Debug, Clone)]
pub struct MovingAverage {
    buffer: StateVar,
}

impl MovingAverage {
    /// # 错误
    /// `buffer_size`为0时返回`ValueMustSatisfyComparison`
    pub fn new(shape: &[usize], buffer_size: usize, init_value: f32) -> Result<Self, LayerError> {
        check_at_least_one("buffer_size", buffer_size)?;
        let mut buffer_shape = vec![buffer_size];
        buffer_shape.extend_from_slice(shape);
        debug!(?shape, buffer_size, init_value, "创建MovingAverage");
        Ok(Self {
            buffer: StateVar::new(Tensor::full(init_value, &buffer_shape)),
        })
    }

    /// * `x` - 新样本，形状须为构造时的`shape`
    pub fn forward(&mut self, x: &Tensor) -> Result<Tensor, LayerError> {
        let buffer = self.buffer.value();
        let tail = buffer.slice_axis(0, 1, buffer.shape()[0])?;
        let updated = Tensor::concatenate(&[&tail, &x.unsqueeze(0)?], 0)?;
        let average = updated.mean_axis(0)?;
        self.buffer.assign(updated)?;
        Ok(average)
    }

    pub fn buffer(&self) -> &StateVar {
        &self.buffer
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer.shape()[0]
    }
}

impl Layer for MovingAverage {
    fn accepts(&self) -> Accepts {
        Accepts::InputOnly
    }

    fn call(&mut self, x: &Tensor, kwargs: &Kwargs) -> Result<Tensor, LayerError> {
        self.accepts().check(kwargs)?;
        self.forward(x)
    }
}

impl Module for MovingAverage {
    fn parameters(&self) -> Vec<&TrainVar> {
        Vec::new()
    }

    fn parameters_mut(&mut self) -> Vec<&mut TrainVar> {
        Vec::new()
    }

    fn states(&self) -> Vec<&StateVar> {
        vec![&self.buffer]
    }

    fn states_mut(&mut self) -> Vec<StateReset<'_>> {
        vec![(&mut self.buffer).into()]
    }
}

/// 以初始值0创建 MovingAverage
pub fn moving_average(shape: &[usize], buffer_size: usize) -> Result<MovingAverage, LayerError> {
    MovingAverage::new(shape, buffer_size, 0.0)
}

// ==================== ExponentialMovingAverage ====================

/// 指数滑动平均：`avg <- avg + (avg - x) * (momentum - 1)`，
/// 即`avg <- momentum * avg + (1 - momentum) * x`，并返回更新后的`avg`
#[derive(Debug, Clone)]
pub struct ExponentialMovingAverage {
    avg: StateVar,
    momentum: f32,
}

impl ExponentialMovingAverage {
    pub fn new(shape: &[usize], momentum: f32, init_value: f32) -> Self {
        debug!(?shape, momentum, init_value, "创建ExponentialMovingAverage");
        Self {
            avg: StateVar::new(Tensor::full(init_value, shape)),
            momentum,
        }
    }

    pub fn forward(&mut self, x: &Tensor) -> Result<Tensor, LayerError> {
        let avg = self.avg.value();
        let updated = avg.try_add(&(avg.try_sub(x)? * (self.momentum - 1.0)))?;
        self.avg.assign(updated.clone())?;
        trace!(momentum = self.momentum, "更新指数滑动平均");
        Ok(updated)
    }

    pub fn avg(&self) -> &StateVar {
        &self.avg
    }

    pub fn momentum(&self) -> f32 {
        self.momentum
    }
}

impl Layer for ExponentialMovingAverage {
    fn accepts(&self) -> Accepts {
        Accepts::InputOnly
    }

    fn call(&mut self, x: &Tensor, kwargs: &Kwargs) -> Result<Tensor, LayerError> {
        self.accepts().check(kwargs)?;
        self.forward(x)
    }
}

impl Module for ExponentialMovingAverage {
    fn parameters(&self) -> Vec<&TrainVar> {
        Vec::new()
    }

    fn parameters_mut(&mut self) -> Vec<&mut TrainVar> {
        Vec::new()
    }

    fn states(&self) -> Vec<&StateVar> {
        vec![&self.avg]
    }

    fn states_mut(&mut self) -> Vec<StateReset<'_>> {
        vec![(&mut self.avg).into()]
    }
}

/// 以默认动量（0.999）与初始值0创建 ExponentialMovingAverage
pub fn exponential_moving_average(shape: &[usize]) -> ExponentialMovingAverage {
    ExponentialMovingAverage::new(shape, DEFAULT_EMA_MOMENTUM, 0.0)
}
