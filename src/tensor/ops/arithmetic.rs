/*
 * @Author       : 老董
 * @Date         : 2023-08-17 17:24:24
 * @Description  : 张量的加减乘除，实现了两个张量“逐元素”（或张量与纯数）运算，并返回一个新的张量。
 *                 该运算支持以下情况：
 *                 1. 其中一个操作数为纯数而另一个为张量：则返回的张量形状与该张量相同。
 *                 2. 两个操作数均为张量：支持 NumPy 风格的广播（broadcasting）。
 *                 运算符版本在形状无法广播时panic；`try_*`版本则返回`TensorError`，供各层以`?`向上传递。
 *                 除零等情况遵循 IEEE 754 语义（产生 inf/NaN），不做额外检查。
 */

use crate::errors::{Operator, TensorError};
use crate::tensor::Tensor;
use std::ops::{Add, Div, Mul, Sub};

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, $try_method:ident, $operator:expr, $op:tt) => {
        impl Tensor {
            /// 逐元素运算，支持广播；形状不兼容时返回错误
            pub fn $try_method(&self, other: &Tensor) -> Result<Tensor, TensorError> {
                if !self.can_broadcast_with(other) {
                    return Err(TensorError::OperatorError {
                        operator: $operator,
                        tensor1_shape: self.shape().to_vec(),
                        tensor2_shape: other.shape().to_vec(),
                    });
                }
                Ok(Tensor {
                    data: &self.data $op &other.data,
                })
            }
        }

        /*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓（不）带引用的张量 与（不）带引用的张量↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
        impl $trait<&Tensor> for &Tensor {
            type Output = Tensor;

            fn $method(self, other: &Tensor) -> Tensor {
                self.$try_method(other).unwrap_or_else(|e| panic!("{e}"))
            }
        }
        impl $trait<Tensor> for &Tensor {
            type Output = Tensor;

            fn $method(self, other: Tensor) -> Tensor {
                self $op &other
            }
        }
        impl $trait<&Tensor> for Tensor {
            type Output = Tensor;

            fn $method(self, other: &Tensor) -> Tensor {
                &self $op other
            }
        }
        impl $trait<Tensor> for Tensor {
            type Output = Tensor;

            fn $method(self, other: Tensor) -> Tensor {
                &self $op &other
            }
        }
        /*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑（不）带引用的张量 与（不）带引用的张量↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/

        /*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓（不）带引用的张量 与 f32↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
        impl $trait<f32> for &Tensor {
            type Output = Tensor;

            fn $method(self, scalar: f32) -> Tensor {
                Tensor {
                    data: &self.data $op scalar,
                }
            }
        }
        impl $trait<f32> for Tensor {
            type Output = Tensor;

            fn $method(self, scalar: f32) -> Tensor {
                &self $op scalar
            }
        }
        impl $trait<&Tensor> for f32 {
            type Output = Tensor;

            fn $method(self, tensor: &Tensor) -> Tensor {
                Tensor {
                    data: self $op &tensor.data,
                }
            }
        }
        impl $trait<Tensor> for f32 {
            type Output = Tensor;

            fn $method(self, tensor: Tensor) -> Tensor {
                self $op &tensor
            }
        }
        /*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑（不）带引用的张量 与 f32↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/
    };
}

impl_binary_op!(Add, add, try_add, Operator::Add, +);
impl_binary_op!(Sub, sub, try_sub, Operator::Sub, -);
impl_binary_op!(Mul, mul, try_mul, Operator::Mul, *);
impl_binary_op!(Div, div, try_div, Operator::Div, /);
