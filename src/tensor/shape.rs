use super::Tensor;
use crate::errors::TensorError;
use ndarray::{Axis, IxDyn, Slice};

impl Tensor {
    pub fn reshape(&self, shape: &[usize]) -> Result<Self, TensorError> {
        let new_total_elements: usize = shape.iter().product();
        if self.size() != new_total_elements {
            return Err(TensorError::IncompatibleShape);
        }
        let data = self
            .data
            .as_standard_layout()
            .into_owned()
            .into_shape(IxDyn(shape))
            .map_err(|_| TensorError::IncompatibleShape)?;
        Ok(Self { data })
    }

    /// 在第`axis`维前插入一个长度为1的维度（`axis`可以等于当前阶数，即插在末尾）
    pub fn unsqueeze(&self, axis: usize) -> Result<Self, TensorError> {
        if axis > self.dimension() {
            return Err(TensorError::AxisOutOfRange {
                axis,
                rank: self.dimension(),
            });
        }
        Ok(Self {
            data: self.data.clone().insert_axis(Axis(axis)),
        })
    }

    /// 将多个张量沿`axis`维拼接。除`axis`维外，其余维度须一致。
    pub fn concatenate(tensors: &[&Self], axis: usize) -> Result<Self, TensorError> {
        let first = tensors.first().ok_or(TensorError::EmptyList)?;
        if axis >= first.dimension() {
            return Err(TensorError::AxisOutOfRange {
                axis,
                rank: first.dimension(),
            });
        }
        let views = tensors.iter().map(|t| t.data.view()).collect::<Vec<_>>();
        let data = ndarray::concatenate(Axis(axis), &views)
            .map_err(|_| TensorError::InconsistentShape)?;
        Ok(Self { data })
    }

    /// 取出第`axis`维上`[start, end)`区间的切片（克隆）
    pub fn slice_axis(&self, axis: usize, start: usize, end: usize) -> Result<Self, TensorError> {
        if axis >= self.dimension() {
            return Err(TensorError::AxisOutOfRange {
                axis,
                rank: self.dimension(),
            });
        }
        let len = self.shape()[axis];
        let (start, end) = (start.min(len), end.min(len).max(start.min(len)));
        let sliced = self
            .data
            .slice_axis(Axis(axis), Slice::from(start..end))
            .to_owned();
        Ok(Self { data: sliced })
    }
}
