/*
 * @Author       : 老董
 * @Date         : 2026-01-27
 * @Description  : 层调用时的具名参数（如`training`、`dropout_keep`），
 *                 以及各层对具名参数的“接受能力”描述
 */

use super::LayerError;
use std::collections::BTreeMap;

/// 具名参数的取值
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Arg {
    Bool(bool),
    Float(f32),
}

impl From<bool> for Arg {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f32> for Arg {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

/// 一次调用所携带的具名参数集合（按名字排序，便于日志输出稳定）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Kwargs {
    args: BTreeMap<String, Arg>,
}

impl Kwargs {
    pub fn new() -> Self {
        Self::default()
    }

    /// 链式添加一个具名参数
    ///
    /// ```ignore
    /// let kwargs = Kwargs::new().with("training", true).with("dropout_keep", 0.8);
    /// ```
    pub fn with(mut self, name: &str, value: impl Into<Arg>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<Arg>) -> Option<Arg> {
        self.args.insert(name.to_string(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<Arg> {
        self.args.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.args.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.args.keys().map(String::as_str)
    }

    /// 读取布尔参数；不存在时返回None，类型不符时报错
    pub fn bool(&self, name: &str) -> Result<Option<bool>, LayerError> {
        match self.get(name) {
            None => Ok(None),
            Some(Arg::Bool(v)) => Ok(Some(v)),
            Some(Arg::Float(_)) => Err(LayerError::ArgumentType {
                name: name.to_string(),
                expected: "bool",
            }),
        }
    }

    /// 读取必需的布尔参数
    pub fn require_bool(&self, name: &str) -> Result<bool, LayerError> {
        self.bool(name)?
            .ok_or_else(|| LayerError::MissingArgument(name.to_string()))
    }

    /// 读取浮点参数；不存在时返回None，类型不符时报错
    pub fn float(&self, name: &str) -> Result<Option<f32>, LayerError> {
        match self.get(name) {
            None => Ok(None),
            Some(Arg::Float(v)) => Ok(Some(v)),
            Some(Arg::Bool(_)) => Err(LayerError::ArgumentType {
                name: name.to_string(),
                expected: "f32",
            }),
        }
    }

    /// 确认所有参数都在`declared`之中
    pub fn ensure_only(&self, declared: &[&str]) -> Result<(), LayerError> {
        match self.names().find(|name| !declared.contains(name)) {
            Some(name) => Err(LayerError::UnexpectedArgument(name.to_string())),
            None => Ok(()),
        }
    }

    /// 按被调用者的接受能力筛选出应转发给它的参数
    pub fn select(&self, accepts: Accepts) -> Kwargs {
        match accepts {
            Accepts::Any => self.clone(),
            Accepts::InputOnly => Kwargs::new(),
            Accepts::Named(declared) => Kwargs {
                args: self
                    .args
                    .iter()
                    .filter(|(name, _)| declared.contains(&name.as_str()))
                    .map(|(name, arg)| (name.clone(), *arg))
                    .collect(),
            },
        }
    }
}

/// 层在被调用时能够接受哪些具名参数。
///
/// 在被加入`Sequential`时即确定下来，此后每次调用不再重新判断。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accepts {
    /// 只接受输入张量，不接受任何具名参数
    InputOnly,
    /// 只接受所列出的具名参数
    Named(&'static [&'static str]),
    /// 接受任意具名参数
    Any,
}

impl Accepts {
    /// 确认`kwargs`中没有本接受能力之外的参数
    pub fn check(&self, kwargs: &Kwargs) -> Result<(), LayerError> {
        match self {
            Self::Any => Ok(()),
            Self::InputOnly => kwargs.ensure_only(&[]),
            Self::Named(declared) => kwargs.ensure_only(declared),
        }
    }
}
