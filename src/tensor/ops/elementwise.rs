use crate::errors::{Operator, TensorError};
use crate::tensor::Tensor;
use ndarray::Zip;

impl Tensor {
    /// 对每个元素施加`f`，返回新张量
    pub fn map(&self, f: impl Fn(f32) -> f32) -> Tensor {
        Tensor {
            data: self.data.mapv(f),
        }
    }

    pub fn square(&self) -> Tensor {
        self.map(|x| x * x)
    }

    /// 平方根的倒数 `1/sqrt(x)`。
    /// 对负数输入按 IEEE 754 返回NaN（而非报错）；对`+0`返回`+inf`
    pub fn rsqrt(&self) -> Tensor {
        self.map(|x| x.sqrt().recip())
    }

    /// 按掩码逐元素选取：掩码非零处取`f(x)`，其余处为0。
    /// 掩码须与本张量形状一致。被屏蔽处直接置0，即使`x`为inf/NaN也不会传播
    pub fn keep_where(&self, mask: &Tensor, f: impl Fn(f32) -> f32) -> Result<Tensor, TensorError> {
        if !self.is_same_shape(mask) {
            return Err(TensorError::OperatorError {
                operator: Operator::Mul,
                tensor1_shape: self.shape().to_vec(),
                tensor2_shape: mask.shape().to_vec(),
            });
        }
        let data = Zip::from(&self.data)
            .and(&mask.data)
            .map_collect(|&x, &m| if m != 0.0 { f(x) } else { 0.0 });
        Ok(Tensor { data })
    }
}
