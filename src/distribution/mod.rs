//! # 随机数生成器
//!
//! 各层所需的随机性（Dropout 掩码、权重初始化）统一从`Generator`中抽取。
//! 给定相同的种子，抽取序列完全确定，便于复现测试。

use crate::tensor::Tensor;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};


/// 带状态的伪随机数生成器。
///
/// 克隆得到的是指向同一随机流的句柄（而非独立副本），因此多个层可共享一个生成器，
/// 且每次抽取都会推进共享状态。
#[derive(Debug, Clone)]
pub struct Generator {
    rng: Arc<Mutex<StdRng>>,
}

impl Default for Generator {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Generator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Arc::new(Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }

    /// 以新种子重置随机流（所有共享该生成器的句柄都会受影响）
    pub fn seed(&self, seed: u64) {
        *self.lock() = StdRng::seed_from_u64(seed);
    }

    fn lock(&self) -> MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 按`shape`抽取[0, 1)区间的均匀分布张量
    pub fn uniform(&self, shape: &[usize]) -> Tensor {
        let mut rng = self.lock();
        let data = (0..shape.iter().product::<usize>())
            .map(|_| rng.r#gen::<f32>())
            .collect::<Vec<_>>();
        Tensor::new(&data, shape)
    }

    /// 按`shape`抽取伯努利掩码：每个元素独立地以概率`p`取1，否则取0
    pub fn bernoulli(&self, p: f32, shape: &[usize]) -> Tensor {
        self.uniform(shape).map(|u| if u < p { 1.0 } else { 0.0 })
    }

    /// 按`shape`抽取服从正态分布的张量（Box-Muller 变换）
    pub fn normal(&self, mean: f32, std_dev: f32, shape: &[usize]) -> Tensor {
        let mut rng = self.lock();
        let data_len = shape.iter().product::<usize>();
        let mut data = Vec::with_capacity(data_len);

        while data.len() < data_len {
            let u1: f32 = rng.r#gen();
            let u2: f32 = rng.r#gen();
            let r = (-2.0 * u1.ln()).sqrt();
            let theta = 2.0 * std::f32::consts::PI * u2;
            let z0 = mean + std_dev * r * theta.cos();
            let z1 = mean + std_dev * r * theta.sin();

            if z0.is_finite() {
                data.push(z0);
            }
            if data.len() < data_len && z1.is_finite() {
                data.push(z1);
            }
        }

        Tensor::new(&data, shape)
    }
}
