/*
 * @Author       : 老董
 * @Date         : 2023-08-17 17:24:24
 * @Description  : 张量（Tensor），即各层所依赖的“数组引擎”。
 *                 只负责前向数值计算：逐元素运算（支持广播）、按轴求均值、rsqrt、矩阵乘法、
 *                 （分组、膨胀、转置）二维卷积、拼接与切片。不涉及自动求导。
 */

use ndarray::{Array, ArrayD, IxDyn};

use crate::errors::TensorError;

mod ops {
    pub mod arithmetic;
    pub mod conv;
    pub mod elementwise;
    pub mod mat_mul;
    pub mod reduce;
}

mod print;
mod property;
mod shape;

pub use ops::conv::ConvPadding;

#[cfg(test)]
mod tests;

/// 定义张量的结构体。其可以是标量、向量、矩阵或更高维度的数组。
/// 注：只要通Tensor初始化的都是张量（即使标量也是张量）；
/// 而通常意义上的数字（类型为usize、i32、f64等）就只是纯数（number），在这里不被认为是张量。
#[derive(Debug, Clone)]
pub struct Tensor {
    data: ArrayD<f32>,
}

impl Tensor {
    /// 创建一个张量，若为标量，`shape`可以是[]、[1]、[1,1]、[1,1,1]...
    /// 若为向量，`shape`可以是[n]、[1,n]、[n,1]；
    /// 若为矩阵，`shape`可以是[n,m]；
    /// 若为更高维度的数组，`shape`可以是[c,n,m,...]；
    /// 注：`data`的长度必须和`shape`中所有元素的乘积相等，否则会panic。
    pub fn new(data: &[f32], shape: &[usize]) -> Tensor {
        Self::try_new(data.to_vec(), shape).unwrap_or_else(|e| panic!("{e}"))
    }

    /// 同`new`，但以`Result`的形式返回长度不符的错误
    pub fn try_new(data: Vec<f32>, shape: &[usize]) -> Result<Tensor, TensorError> {
        let len = data.len();
        Array::from_shape_vec(IxDyn(shape), data)
            .map(|data| Tensor { data })
            .map_err(|_| TensorError::DataShapeMismatch {
                len,
                shape: shape.to_vec(),
            })
    }

    /// 创建一个所有元素均为`value`的张量
    pub fn full(value: f32, shape: &[usize]) -> Tensor {
        Tensor {
            data: ArrayD::from_elem(IxDyn(shape), value),
        }
    }

    pub fn zeros(shape: &[usize]) -> Tensor {
        Self::full(0.0, shape)
    }

    pub fn ones(shape: &[usize]) -> Tensor {
        Self::full(1.0, shape)
    }

    /// 形状为`[]`的标量
    pub fn scalar(value: f32) -> Tensor {
        Self::full(value, &[])
    }

    pub(crate) fn from_array(data: ArrayD<f32>) -> Tensor {
        Tensor { data }
    }
}
