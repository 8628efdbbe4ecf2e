/*
 * @Author       : 老董
 * @Date         : 2026-01-27
 * @Description  : BatchNorm（批归一化）层
 *
 * 输出：gamma * (x - m) * rsqrt(v + eps) + beta
 * - 训练模式：m、v 为当前批次沿`redux`各维的均值与（有偏）方差，并以指数滑动平均更新跟踪状态
 *   running <- running + (1 - momentum) * (batch_stat - running)
 * - 评估模式：m、v 直接取跟踪状态，且不修改它们
 *
 * 0D/1D/2D 只是固定了状态形状与归约维度的构造函数，对应通道在前的
 * (N, C)、(N, C, L)、(N, C, H, W) 输入。
 */

use super::Layer;
use crate::nn::{Accepts, Kwargs, LayerError, Module, StateReset, StateVar, TrainVar};
use crate::tensor::Tensor;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// BatchNorm 系列层的超参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchNormConfig {
    /// 滑动统计量的动量
    pub momentum: f32,
    /// 加在方差上的数值稳定项
    pub eps: f32,
}

impl Default for BatchNormConfig {
    fn default() -> Self {
        Self {
            momentum: 0.999,
            eps: 1e-6,
        }
    }
}

/// 0D/1D/2D 各自的（状态形状, 归约维度）
pub(super) fn layout_0d(nin: usize) -> (Vec<usize>, Vec<usize>) {
    (vec![1, nin], vec![0])
}

pub(super) fn layout_1d(nin: usize) -> (Vec<usize>, Vec<usize>) {
    (vec![1, nin, 1], vec![0, 2])
}

pub(super) fn layout_2d(nin: usize) -> (Vec<usize>, Vec<usize>) {
    (vec![1, nin, 1, 1], vec![0, 2, 3])
}

/// BatchNorm 与 SyncedBatchNorm 共有的状态、参数及计算
#[derive(Debug, Clone)]
pub(super) struct NormCore {
    pub(super) running_mean: StateVar,
    pub(super) running_var: StateVar,
    pub(super) beta: TrainVar,
    pub(super) gamma: TrainVar,
    pub(super) redux: Vec<usize>,
    pub(super) config: BatchNormConfig,
}

impl NormCore {
    pub(super) fn new(dims: &[usize], redux: &[usize], config: BatchNormConfig) -> Self {
        Self {
            running_mean: StateVar::new(Tensor::zeros(dims)),
            running_var: StateVar::new(Tensor::ones(dims)),
            beta: TrainVar::new(Tensor::zeros(dims)),
            gamma: TrainVar::new(Tensor::ones(dims)),
            redux: redux.to_vec(),
            config,
        }
    }

    /// 当前批次的均值`m`，以及`mean(x²)`（保留被归约的维度）
    pub(super) fn moments(&self, x: &Tensor) -> Result<(Tensor, Tensor), LayerError> {
        let m = x.mean_axes(&self.redux, true)?;
        let m2 = x.square().mean_axes(&self.redux, true)?;
        Ok((m, m2))
    }

    pub(super) fn update_running(&mut self, m: &Tensor, v: &Tensor) -> Result<(), LayerError> {
        let rate = 1.0 - self.config.momentum;
        let mean = self.running_mean.value();
        let new_mean = mean.try_add(&(m.try_sub(mean)? * rate))?;
        let var = self.running_var.value();
        let new_var = var.try_add(&(v.try_sub(var)? * rate))?;
        self.running_mean.assign(new_mean)?;
        self.running_var.assign(new_var)?;
        trace!(momentum = self.config.momentum, "更新滑动统计量");
        Ok(())
    }

    pub(super) fn normalize(&self, x: &Tensor, m: &Tensor, v: &Tensor) -> Result<Tensor, LayerError> {
        let centered = self.gamma.value().try_mul(&x.try_sub(m)?)?;
        let y = centered.try_mul(&(v + self.config.eps).rsqrt())?;
        Ok(y.try_add(self.beta.value())?)
    }

    pub(super) fn parameters(&self) -> Vec<&TrainVar> {
        vec![&self.beta, &self.gamma]
    }

    pub(super) fn parameters_mut(&mut self) -> Vec<&mut TrainVar> {
        vec![&mut self.beta, &mut self.gamma]
    }

    pub(super) fn states(&self) -> Vec<&StateVar> {
        vec![&self.running_mean, &self.running_var]
    }

    pub(super) fn states_mut(&mut self) -> Vec<StateReset<'_>> {
        vec![(&mut self.running_mean).into(), (&mut self.running_var).into()]
    }
}

/// BatchNorm（批归一化）层
///
/// # 使用示例
/// ```ignore
/// let mut bn = BatchNorm::d2(16, BatchNormConfig::default());
/// let y = bn.forward(&x, true)?; // x: [N, 16, H, W]
/// ```
#[derive(Debug, Clone)]
pub struct BatchNorm {
    core: NormCore,
}

impl BatchNorm {
    const KWARGS: &'static [&'static str] = &["training"];

    /// * `dims` - 跟踪状态与参数的形状（须能与输入广播）
    /// * `redux` - 求批次统计量时归约的维度
    pub fn new(dims: &[usize], redux: &[usize], config: BatchNormConfig) -> Self {
        debug!(?dims, ?redux, ?config, "创建BatchNorm");
        Self {
            core: NormCore::new(dims, redux, config),
        }
    }

    /// 用于 (N, C) 输入
    pub fn d0(nin: usize, config: BatchNormConfig) -> Self {
        let (dims, redux) = layout_0d(nin);
        Self::new(&dims, &redux, config)
    }

    /// 用于 (N, C, L) 输入
    pub fn d1(nin: usize, config: BatchNormConfig) -> Self {
        let (dims, redux) = layout_1d(nin);
        Self::new(&dims, &redux, config)
    }

    /// 用于 (N, C, H, W) 输入
    pub fn d2(nin: usize, config: BatchNormConfig) -> Self {
        let (dims, redux) = layout_2d(nin);
        Self::new(&dims, &redux, config)
    }

    pub fn forward(&mut self, x: &Tensor, training: bool) -> Result<Tensor, LayerError> {
        if !training {
            let core = &self.core;
            return core.normalize(x, core.running_mean.value(), core.running_var.value());
        }
        let (m, m2) = self.core.moments(x)?;
        let v = m2.try_sub(&m.square())?;
        self.core.update_running(&m, &v)?;
        self.core.normalize(x, &m, &v)
    }

    pub fn running_mean(&self) -> &StateVar {
        &self.core.running_mean
    }

    pub fn running_var(&self) -> &StateVar {
        &self.core.running_var
    }

    pub fn beta(&self) -> &TrainVar {
        &self.core.beta
    }

    pub fn gamma(&self) -> &TrainVar {
        &self.core.gamma
    }

    pub fn redux(&self) -> &[usize] {
        &self.core.redux
    }

    pub fn config(&self) -> BatchNormConfig {
        self.core.config
    }
}

impl Layer for BatchNorm {
    fn accepts(&self) -> Accepts {
        Accepts::Named(Self::KWARGS)
    }

    fn call(&mut self, x: &Tensor, kwargs: &Kwargs) -> Result<Tensor, LayerError> {
        self.accepts().check(kwargs)?;
        let training = kwargs.require_bool("training")?;
        self.forward(x, training)
    }
}

impl Module for BatchNorm {
    fn parameters(&self) -> Vec<&TrainVar> {
        self.core.parameters()
    }

    fn parameters_mut(&mut self) -> Vec<&mut TrainVar> {
        self.core.parameters_mut()
    }

    fn states(&self) -> Vec<&StateVar> {
        self.core.states()
    }

    fn states_mut(&mut self) -> Vec<StateReset<'_>> {
        self.core.states_mut()
    }
}

/// 以默认超参数创建用于 (N, C) 输入的 BatchNorm
pub fn batch_norm_0d(nin: usize) -> BatchNorm {
    BatchNorm::d0(nin, BatchNormConfig::default())
}

/// 以默认超参数创建用于 (N, C, L) 输入的 BatchNorm
pub fn batch_norm_1d(nin: usize) -> BatchNorm {
    BatchNorm::d1(nin, BatchNormConfig::default())
}

/// 以默认超参数创建用于 (N, C, H, W) 输入的 BatchNorm
pub fn batch_norm_2d(nin: usize) -> BatchNorm {
    BatchNorm::d2(nin, BatchNormConfig::default())
}
