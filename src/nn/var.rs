/*
 * @Author       : 老董
 * @Date         : 2026-01-09
 * @Description  : 层所持有的两类张量单元，以及权重初始化方式
 *
 * - `TrainVar`（可训练参数）：由外部优化器依据梯度更新，`assign()`对外公开
 * - `StateVar`（跟踪状态）：如 BatchNorm 的滑动统计量，只由所属层自身的逻辑更新；
 *   外部只能读取，或通过`reset()`恢复为构造时的初始值
 *
 * 两者的形状在构造后均固定不变，写入形状不同的值会报错。
 */

use super::LayerError;
use crate::distribution::Generator;
use crate::tensor::Tensor;
use serde::{Deserialize, Serialize};

fn check_shape(expected: &[usize], value: &Tensor) -> Result<(), LayerError> {
    if expected == value.shape() {
        Ok(())
    } else {
        Err(LayerError::ParameterShape {
            expected: expected.to_vec(),
            got: value.shape().to_vec(),
        })
    }
}

// ==================== TrainVar ====================

/// 可训练参数
#[derive(Debug, Clone, PartialEq)]
pub struct TrainVar {
    value: Tensor,
}

impl TrainVar {
    pub fn new(value: Tensor) -> Self {
        Self { value }
    }

    pub fn value(&self) -> &Tensor {
        &self.value
    }

    pub fn shape(&self) -> &[usize] {
        self.value.shape()
    }

    /// 写入新值（供外部优化器使用），形状须与原值一致
    pub fn assign(&mut self, value: Tensor) -> Result<(), LayerError> {
        check_shape(self.shape(), &value)?;
        self.value = value;
        Ok(())
    }
}

// ==================== StateVar ====================

/// 跟踪状态
#[derive(Debug, Clone, PartialEq)]
pub struct StateVar {
    value: Tensor,
    initial: Tensor,
}

impl StateVar {
    pub fn new(value: Tensor) -> Self {
        Self {
            initial: value.clone(),
            value,
        }
    }

    pub fn value(&self) -> &Tensor {
        &self.value
    }

    pub fn shape(&self) -> &[usize] {
        self.value.shape()
    }

    /// 恢复为构造时的初始值
    pub fn reset(&mut self) {
        self.value = self.initial.clone();
    }

    /// 写入新值（形状须与构造时一致）。仅供持有该状态的层在自身的调用逻辑中使用
    pub fn assign(&mut self, value: Tensor) -> Result<(), LayerError> {
        check_shape(self.shape(), &value)?;
        self.value = value;
        Ok(())
    }
}

/// 经由[`Module::states_mut`](super::Module::states_mut)暴露给外部的跟踪状态：
/// 可读取、可恢复初始值，但不能写入新值
#[derive(Debug)]
pub struct StateReset<'a>(&'a mut StateVar);

impl<'a> From<&'a mut StateVar> for StateReset<'a> {
    fn from(state: &'a mut StateVar) -> Self {
        Self(state)
    }
}

impl StateReset<'_> {
    pub fn value(&self) -> &Tensor {
        self.0.value()
    }

    pub fn shape(&self) -> &[usize] {
        self.0.shape()
    }

    pub fn reset(&mut self) {
        self.0.reset();
    }
}

// ==================== Bias ====================

/// 可选的偏置项
#[derive(Debug, Clone, PartialEq)]
pub enum Bias {
    Absent,
    Present(TrainVar),
}

impl Bias {
    /// `use_bias`为`true`时创建形状为`shape`的零偏置
    pub fn zeros(use_bias: bool, shape: &[usize]) -> Self {
        if use_bias {
            Self::Present(TrainVar::new(Tensor::zeros(shape)))
        } else {
            Self::Absent
        }
    }

    /// 将偏置（广播）加到`y`上；无偏置时原样返回
    pub fn apply(&self, y: Tensor) -> Result<Tensor, LayerError> {
        match self {
            Self::Absent => Ok(y),
            Self::Present(b) => Ok(y.try_add(b.value())?),
        }
    }

    pub fn var(&self) -> Option<&TrainVar> {
        match self {
            Self::Absent => None,
            Self::Present(b) => Some(b),
        }
    }

    pub fn var_mut(&mut self) -> Option<&mut TrainVar> {
        match self {
            Self::Absent => None,
            Self::Present(b) => Some(b),
        }
    }
}

// ==================== Init ====================

/// 权重初始化方式
///
/// 对于`KaimingNormal`与`XavierNormal`，形状的最后一维视作输出维（`fan_out`），
/// 其余各维之积视作输入维（`fan_in`）；这与全连接层的 `[in, out]`、卷积层的 HWIO 布局一致。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Init {
    /// 常数初始化
    Constant(f32),
    /// 全零
    Zeros,
    /// 全一
    Ones,
    /// 正态分布
    Normal { mean: f32, std: f32 },
    /// Kaiming/He 正态初始化：`std = sqrt(1 / fan_in)`
    KaimingNormal,
    /// Xavier/Glorot 正态初始化：`std = sqrt(2 / (fan_in + fan_out))`
    XavierNormal,
}

impl Init {
    fn fans(shape: &[usize]) -> (usize, usize) {
        match shape.split_last() {
            Some((&fan_out, rest)) => (rest.iter().product(), fan_out),
            None => (1, 1),
        }
    }

    /// 生成初始化后的 Tensor（随机性取自`generator`）
    pub fn generate(&self, shape: &[usize], generator: &Generator) -> Tensor {
        match self {
            Self::Constant(v) => Tensor::full(*v, shape),
            Self::Zeros => Tensor::zeros(shape),
            Self::Ones => Tensor::ones(shape),
            Self::Normal { mean, std } => generator.normal(*mean, *std, shape),
            Self::KaimingNormal => {
                let (fan_in, _) = Self::fans(shape);
                generator.normal(0.0, (1.0 / fan_in as f32).sqrt(), shape)
            }
            Self::XavierNormal => {
                let (fan_in, fan_out) = Self::fans(shape);
                generator.normal(0.0, (2.0 / (fan_in + fan_out) as f32).sqrt(), shape)
            }
        }
    }

    /// 转换为各层构造函数所接受的“形状 -> 张量”初始化函数
    pub fn initializer(self, generator: Generator) -> impl Fn(&[usize]) -> Tensor {
        move |shape| self.generate(shape, &generator)
    }
}
