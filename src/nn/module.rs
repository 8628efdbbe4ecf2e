/*
 * @Author       : 老董
 * @Date         : 2026-01-09
 * @Description  : Module trait 定义
 */

use super::{StateReset, StateVar, TrainVar};
use enum_dispatch::enum_dispatch;

/// 模块 trait：按固定顺序暴露层所持有的张量单元
///
/// # 设计原则
/// - `forward()` **不是** trait 方法（各层签名各异），统一入口见 [`Layer::call`](super::Layer::call)
/// - `new()` **不是** trait 方法（参数各异）
/// - 参数不按名字检索，只按顺序枚举；顺序在层的生命周期内保持不变
///
/// # 使用示例
///
/// ```ignore
/// // 外部优化器：对每个可训练参数做一步 SGD
/// for (param, grad) in model.parameters_mut().into_iter().zip(grads) {
///     let updated = param.value().try_sub(&(grad * lr))?;
///     param.assign(updated)?;
/// }
/// ```
#[enum_dispatch]
pub trait Module {
    /// 获取所有可训练参数
    fn parameters(&self) -> Vec<&TrainVar>;

    /// 获取所有可训练参数（可写，供优化器使用）
    fn parameters_mut(&mut self) -> Vec<&mut TrainVar>;

    /// 获取所有跟踪状态（只读）
    fn states(&self) -> Vec<&StateVar> {
        Vec::new()
    }

    /// 获取所有跟踪状态（只可重置，写入新值是层自身的事）
    fn states_mut(&mut self) -> Vec<StateReset<'_>> {
        Vec::new()
    }

    /// 可训练参数的标量总数
    fn num_params(&self) -> usize {
        self.parameters().iter().map(|p| p.value().size()).sum()
    }
}
