//! # 跨副本归约
//!
//! `SyncedBatchNorm`只决定哪些值需要跨副本求均值，归约本身由`Collective`的实现完成：
//! - `SingleReplica`：单设备，归约即恒等
//! - `Replica`：同一进程内以线程模拟的多个副本，每次`pmean`都会阻塞到所有副本都提交了各自的值；
//!   某个副本调用`abort`（或其线程 panic）后，整个组失效，其余副本的`pmean`返回`LayerError::Collective`

use crate::nn::LayerError;
use crate::tensor::Tensor;
use std::fmt::Debug;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use tracing::warn;


/// 跨副本的均值归约
pub trait Collective: Send + Sync + Debug {
    /// 对所有副本提交的`x`求均值，每个副本得到相同的结果
    fn pmean(&self, x: &Tensor) -> Result<Tensor, LayerError>;

    /// 参与归约的副本数
    fn replicas(&self) -> usize;

    /// 本副本无法参与后续归约时调用，使其余副本的`pmean`返回错误而不是一直等待
    fn abort(&self, _reason: &str) {}
}

/// 单副本：`pmean`原样返回输入
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleReplica;

impl Collective for SingleReplica {
    fn pmean(&self, x: &Tensor) -> Result<Tensor, LayerError> {
        Ok(x.clone())
    }

    fn replicas(&self) -> usize {
        1
    }
}

/// 可中止的屏障状态
#[derive(Debug, Default)]
struct Rendezvous {
    arrived: usize,
    generation: u64,
    aborted: Option<String>,
}

#[derive(Debug)]
struct GroupInner {
    size: usize,
    slots: Mutex<Vec<Option<Tensor>>>,
    rendezvous: Mutex<Rendezvous>,
    arrivals: Condvar,
}

fn aborted_error(reason: &str) -> LayerError {
    LayerError::Collective(format!("副本组已中止：{reason}"))
}

impl GroupInner {
    fn lock_slots(&self) -> MutexGuard<'_, Vec<Option<Tensor>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_rendezvous(&self) -> MutexGuard<'_, Rendezvous> {
        self.rendezvous.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 阻塞到本轮所有副本都到达；组已中止时立即返回错误
    fn wait(&self) -> Result<(), LayerError> {
        let mut state = self.lock_rendezvous();
        if let Some(reason) = &state.aborted {
            return Err(aborted_error(reason));
        }
        state.arrived += 1;
        if state.arrived == self.size {
            state.arrived = 0;
            state.generation += 1;
            self.arrivals.notify_all();
            return Ok(());
        }
        let generation = state.generation;
        let state = self
            .arrivals
            .wait_while(state, |s| s.generation == generation && s.aborted.is_none())
            .unwrap_or_else(PoisonError::into_inner);
        // 本轮已凑齐后才被中止的，本轮仍算成功
        match &state.aborted {
            Some(reason) if state.generation == generation => Err(aborted_error(reason)),
            _ => Ok(()),
        }
    }

    fn abort(&self, reason: &str) {
        let mut state = self.lock_rendezvous();
        if state.aborted.is_none() {
            state.aborted = Some(reason.to_string());
        }
        self.arrivals.notify_all();
    }

    fn mean(&self) -> Result<Tensor, LayerError> {
        let slots = self.lock_slots();
        let mut values = slots.iter().enumerate().map(|(index, slot)| {
            slot.as_ref()
                .ok_or_else(|| LayerError::Collective(format!("副本{index}未提交数值")))
        });
        let first = match values.next() {
            Some(first) => first?,
            None => return Err(LayerError::Collective("副本组为空".to_string())),
        };
        let mut sum = first.clone();
        for value in values {
            let value = value?;
            if !value.is_same_shape(first) {
                return Err(LayerError::Collective(format!(
                    "各副本提交的形状不一致：{:?}与{:?}",
                    first.shape(),
                    value.shape()
                )));
            }
            sum = sum.try_add(value)?;
        }
        Ok(sum / slots.len() as f32)
    }
}

/// 线程间共享的副本组中的一员。每个线程持有一个，且每一轮所有成员都须调用`pmean`
#[derive(Debug)]
pub struct Replica {
    index: usize,
    group: Arc<GroupInner>,
}

impl Replica {
    /// 创建一个含`size`个成员的副本组
    pub fn group(size: usize) -> Vec<Replica> {
        let group = Arc::new(GroupInner {
            size,
            slots: Mutex::new(vec![None; size]),
            rendezvous: Mutex::new(Rendezvous::default()),
            arrivals: Condvar::new(),
        });
        (0..size)
            .map(|index| Replica {
                index,
                group: Arc::clone(&group),
            })
            .collect()
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

impl Collective for Replica {
    fn pmean(&self, x: &Tensor) -> Result<Tensor, LayerError> {
        self.group.lock_slots()[self.index] = Some(x.clone());
        // 第一道屏障：所有副本都已提交；第二道：所有副本都已读取，之后才允许进入下一轮
        self.group.wait()?;
        let result = self.group.mean();
        self.group.wait()?;
        result
    }

    fn replicas(&self) -> usize {
        self.group.size
    }

    fn abort(&self, reason: &str) {
        warn!(index = self.index, reason, "副本中止归约");
        self.group.abort(reason);
    }
}

impl Drop for Replica {
    fn drop(&mut self) {
        // 持有者线程 panic 时，其余副本不会再等到它
        if thread::panicking() {
            self.abort("持有该副本的线程已panic");
        }
    }
}
