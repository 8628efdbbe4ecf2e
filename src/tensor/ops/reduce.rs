use crate::errors::TensorError;
use crate::tensor::Tensor;
use ndarray::Axis;

impl Tensor {
    /// 沿多个维度求均值。
    /// * `axes` - 需要被归约的维度（须唯一且在[0, <张量维数>)范围内）；
    /// * `keep_dims` - 为`true`时被归约的维度保留为长度1，便于与原张量广播。
    pub fn mean_axes(&self, axes: &[usize], keep_dims: bool) -> Result<Tensor, TensorError> {
        let rank = self.dimension();
        let mut sorted = axes.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        if let Some(&axis) = sorted.iter().find(|&&a| a >= rank) {
            return Err(TensorError::AxisOutOfRange { axis, rank });
        }

        let count: usize = sorted.iter().map(|&a| self.shape()[a]).product();
        let mut data = self.data.clone();
        // 从高维往低维归约，保证尚未处理的维度索引不变
        for &axis in sorted.iter().rev() {
            data = data.sum_axis(Axis(axis));
            if keep_dims {
                data = data.insert_axis(Axis(axis));
            }
        }
        Ok(Tensor {
            data: data / count as f32,
        })
    }

    /// 沿单个维度求均值（不保留该维度）
    pub fn mean_axis(&self, axis: usize) -> Result<Tensor, TensorError> {
        self.mean_axes(&[axis], false)
    }

    /// 所有元素之和，返回形状为`[]`的标量
    pub fn sum(&self) -> Tensor {
        Tensor::scalar(self.data.sum())
    }

    /// 所有元素的均值，返回形状为`[]`的标量
    pub fn mean(&self) -> Tensor {
        Tensor::scalar(self.data.sum() / self.size() as f32)
    }
}
