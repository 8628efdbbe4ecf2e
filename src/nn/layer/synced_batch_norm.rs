/*
 * @Author       : 老董
 * @Date         : 2026-01-28
 * @Description  : SyncedBatchNorm（跨设备同步的批归一化）层
 *
 * 与 BatchNorm 的状态、参数布局及输出公式完全相同，区别仅在训练模式：
 * 本地批次的均值 m 与“本地 mean(x²) - m²”都要经过跨设备均值归约，
 * 使统计量反映所有设备批次的并集，而不只是本地分片。
 */

use super::Layer;
use super::batch_norm::{BatchNormConfig, NormCore, layout_0d, layout_1d, layout_2d};
use crate::nn::{Accepts, Kwargs, LayerError, Module, StateReset, StateVar, TrainVar};
use crate::parallel::{Collective, SingleReplica};
use crate::tensor::Tensor;
use std::sync::Arc;
use tracing::debug;

/// SyncedBatchNorm 层
///
/// # 使用示例
/// ```ignore
/// // 每个线程（副本）各持有一个层实例
/// for replica in Replica::group(2) {
///     let mut bn = SyncedBatchNorm::d0(8, BatchNormConfig::default(), Arc::new(replica));
///     // ... 在各自线程中调用 bn.forward(&x, true, true)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SyncedBatchNorm {
    core: NormCore,
    collective: Arc<dyn Collective>,
}

impl SyncedBatchNorm {
    const KWARGS: &'static [&'static str] = &["training", "batch_norm_update"];

    /// * `dims` - 跟踪状态与参数的形状（须能与输入广播）
    /// * `redux` - 求批次统计量时归约的维度
    /// * `collective` - 跨副本的均值归约
    pub fn new(
        dims: &[usize],
        redux: &[usize],
        config: BatchNormConfig,
        collective: Arc<dyn Collective>,
    ) -> Self {
        debug!(
            ?dims,
            ?redux,
            ?config,
            replicas = collective.replicas(),
            "创建SyncedBatchNorm"
        );
        Self {
            core: NormCore::new(dims, redux, config),
            collective,
        }
    }

    /// 用于 (N, C) 输入
    pub fn d0(nin: usize, config: BatchNormConfig, collective: Arc<dyn Collective>) -> Self {
        let (dims, redux) = layout_0d(nin);
        Self::new(&dims, &redux, config, collective)
    }

    /// 用于 (N, C, L) 输入
    pub fn d1(nin: usize, config: BatchNormConfig, collective: Arc<dyn Collective>) -> Self {
        let (dims, redux) = layout_1d(nin);
        Self::new(&dims, &redux, config, collective)
    }

    /// 用于 (N, C, H, W) 输入
    pub fn d2(nin: usize, config: BatchNormConfig, collective: Arc<dyn Collective>) -> Self {
        let (dims, redux) = layout_2d(nin);
        Self::new(&dims, &redux, config, collective)
    }

    /// * `batch_norm_update` - 为`false`时跳过滑动统计量的更新，
    ///   但本次输出仍使用跨设备归约后的`m`、`v`
    pub fn forward(
        &mut self,
        x: &Tensor,
        training: bool,
        batch_norm_update: bool,
    ) -> Result<Tensor, LayerError> {
        if !training {
            let core = &self.core;
            return core.normalize(x, core.running_mean.value(), core.running_var.value());
        }
        // 本地统计量出错时先中止归约，否则其余副本会一直等待本副本
        let (m, m2) = self
            .core
            .moments(x)
            .inspect_err(|e| self.collective.abort(&e.to_string()))?;
        let m = self.collective.pmean(&m)?;
        let v = self.collective.pmean(&m2.try_sub(&m.square())?)?;
        if batch_norm_update {
            self.core.update_running(&m, &v)?;
        }
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

impl Layer for SyncedBatchNorm {
    fn accepts(&self) -> Accepts {
        Accepts::Named(Self::KWARGS)
    }

    fn call(&mut self, x: &Tensor, kwargs: &Kwargs) -> Result<Tensor, LayerError> {
        self.accepts().check(kwargs)?;
        let training = kwargs.require_bool("training")?;
        let batch_norm_update = kwargs.bool("batch_norm_update")?.unwrap_or(true);
        self.forward(x, training, batch_norm_update)
    }
}

impl Module for SyncedBatchNorm {
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

/// 以默认超参数、单副本归约创建用于 (N, C) 输入的 SyncedBatchNorm
pub fn synced_batch_norm_0d(nin: usize) -> SyncedBatchNorm {
    SyncedBatchNorm::d0(nin, BatchNormConfig::default(), Arc::new(SingleReplica))
}

/// 以默认超参数、单副本归约创建用于 (N, C, L) 输入的 SyncedBatchNorm
pub fn synced_batch_norm_1d(nin: usize) -> SyncedBatchNorm {
    SyncedBatchNorm::d1(nin, BatchNormConfig::default(), Arc::new(SingleReplica))
}

/// 以默认超参数、单副本归约创建用于 (N, C, H, W) 输入的 SyncedBatchNorm
pub fn synced_batch_norm_2d(nin: usize) -> SyncedBatchNorm {
    SyncedBatchNorm::d2(nin, BatchNormConfig::default(), Arc::new(SingleReplica))
}
