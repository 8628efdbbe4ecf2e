/*
 * @Author       : 老董
 * @Date         : 2023-08-17 17:24:24
 * @Description  : 张量运算（即“数组引擎”）层面的错误类型
 */

use thiserror::Error;
mod ops;
pub use self::ops::*;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TensorError {
    // 张量二元运算
    #[error(
        "形状不一致，故无法{operator}：第一个张量的形状为{tensor1_shape:?}，第二个张量的形状为{tensor2_shape:?}"
    )]
    OperatorError {
        operator: Operator,
        tensor1_shape: Vec<usize>,
        tensor2_shape: Vec<usize>,
    },
    #[error("数据长度{len}与形状{shape:?}所需的元素个数不符")]
    DataShapeMismatch { len: usize, shape: Vec<usize> },
    #[error("维度{axis}超出范围：张量的阶数为{rank}")]
    AxisOutOfRange { axis: usize, rank: usize },
    #[error("{op}要求输入为{expected}阶张量，实际得到形状{got:?}")]
    RankMismatch {
        op: &'static str,
        expected: usize,
        got: Vec<usize>,
    },
    #[error("输入通道数{got}与卷积核所需的通道数{expected}不一致")]
    ChannelMismatch { expected: usize, got: usize },
    #[error("卷积输出尺寸无效：输入形状{input:?}，卷积核形状{kernel:?}")]
    EmptyConvOutput { input: Vec<usize>, kernel: Vec<usize> },
    #[error("卷积参数`{name}`无效：{value}")]
    InvalidConvParam { name: &'static str, value: usize },

    #[error("张量列表为空")]
    EmptyList,
    #[error("张量形状不一致")]
    InconsistentShape,
    #[error("张量形状不兼容")]
    IncompatibleShape,
}
