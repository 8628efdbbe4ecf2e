/*
 * @Author       : 老董
 * @Date         : 2026-01-27
 * @Description  : 神经网络层的错误类型
 */

use crate::errors::{ComparisonOperator, TensorError};
use thiserror::Error;

/// 层的构造或调用过程中的错误。
///
/// 均属调用方的编程错误：构造期前置条件不满足时立即报错，
/// 调用期的形状错误则由张量运算原样向上传递（`Tensor`变体）。
#[derive(Error, Debug, PartialEq, Eq)]
pub enum LayerError {
    #[error(transparent)]
    Tensor(#[from] TensorError),

    #[error("{name}（={value}）须能被groups（={groups}）整除")]
    GroupsNotDivisible {
        name: &'static str,
        value: usize,
        groups: usize,
    },
    #[error("{value_name}须{operator}{threshold}")]
    ValueMustSatisfyComparison {
        value_name: &'static str,
        operator: ComparisonOperator,
        threshold: usize,
    },

    // 具名参数
    #[error("缺少必需的具名参数`{0}`")]
    MissingArgument(String),
    #[error("收到未声明的具名参数`{0}`")]
    UnexpectedArgument(String),
    #[error("具名参数`{name}`的类型应为{expected}")]
    ArgumentType { name: String, expected: &'static str },

    #[error("参数形状须保持为{expected:?}，实际得到{got:?}")]
    ParameterShape { expected: Vec<usize>, got: Vec<usize> },

    #[error("跨设备均值归约失败：{0}")]
    Collective(String),
}
