use super::Layer;
use crate::nn::{Accepts, Kwargs, LayerError, Module, TrainVar};
use crate::tensor::Tensor;
use std::fmt;

type LambdaFn = dyn FnMut(&Tensor, &Kwargs) -> Result<Tensor, LayerError> + Send;

/// 以闭包充当的无参数层（如激活函数、reshape），需显式声明其接受的具名参数
pub struct Lambda {
    accepts: Accepts,
    f: Box<LambdaFn>,
}

impl Lambda {
    /// 只接受输入张量的闭包
    pub fn new(mut f: impl FnMut(&Tensor) -> Result<Tensor, LayerError> + Send + 'static) -> Self {
        Self {
            accepts: Accepts::InputOnly,
            f: Box::new(move |x, _| f(x)),
        }
    }

    /// 接受具名参数的闭包，`accepts`决定`Sequential`会转发哪些参数给它
    pub fn with_kwargs(
        accepts: Accepts,
        f: impl FnMut(&Tensor, &Kwargs) -> Result<Tensor, LayerError> + Send + 'static,
    ) -> Self {
        Self {
            accepts,
            f: Box::new(f),
        }
    }
}

impl fmt::Debug for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lambda")
            .field("accepts", &self.accepts)
            .finish_non_exhaustive()
    }
}

impl Layer for Lambda {
    fn accepts(&self) -> Accepts {
        self.accepts
    }

    fn call(&mut self, x: &Tensor, kwargs: &Kwargs) -> Result<Tensor, LayerError> {
        self.accepts.check(kwargs)?;
        (self.f)(x, kwargs)
    }
}

impl Module for Lambda {
    fn parameters(&self) -> Vec<&TrainVar> {
        Vec::new()
    }

    fn parameters_mut(&mut self) -> Vec<&mut TrainVar> {
        Vec::new()
    }
}
