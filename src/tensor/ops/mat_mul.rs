use crate::errors::{Operator, TensorError};
use crate::tensor::Tensor;
use ndarray::{Ix2, IxDyn};

impl Tensor {
    /// 矩阵乘法：`self`的最后一维与`other`（须为2阶张量`[n, m]`）的第一维相乘。
    /// `self`可带任意多个前导维度，即`[..., n] @ [n, m] -> [..., m]`；
    /// 若`self`为1阶向量`[n]`，则结果为`[m]`。
    pub fn mat_mul(&self, other: &Tensor) -> Result<Tensor, TensorError> {
        let mismatch = || TensorError::OperatorError {
            operator: Operator::MatMul,
            tensor1_shape: self.shape().to_vec(),
            tensor2_shape: other.shape().to_vec(),
        };
        if other.dimension() != 2 || self.dimension() == 0 {
            return Err(mismatch());
        }
        let n = self.shape()[self.dimension() - 1];
        let (k, m) = (other.shape()[0], other.shape()[1]);
        if n != k {
            return Err(mismatch());
        }

        let leading = &self.shape()[..self.dimension() - 1];
        let rows: usize = leading.iter().product();
        // 将前导维度展平成“行”，做一次二维矩阵乘法后再还原
        let lhs = self
            .data
            .as_standard_layout()
            .into_owned()
            .into_shape((rows, n))
            .map_err(|_| mismatch())?;
        let rhs = other
            .data
            .view()
            .into_dimensionality::<Ix2>()
            .map_err(|_| mismatch())?;
        let product = lhs.dot(&rhs);

        let mut out_shape = leading.to_vec();
        out_shape.push(m);
        let data = product
            .into_shape(IxDyn(&out_shape))
            .map_err(|_| mismatch())?;
        Ok(Tensor { data })
    }
}
