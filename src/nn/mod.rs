/*
 * @Author       : 老董
 * @Date         : 2024-01-31 20:23:53
 * @LastEditors  : 老董
 * @LastEditTime : 2026-01-29 10:12:40
 * @Description  : 神经网络（neural network）的各种层
 */

mod error;
mod kwargs;
mod module;
mod var;

pub mod layer;

pub use error::LayerError;
pub use kwargs::{Accepts, Arg, Kwargs};
pub use layer::{
    AnyLayer, BatchNorm, BatchNormConfig, Conv2d, Conv2dConfig, ConvTranspose2d,
    ConvTransposeConfig, Custom, DynLayer, Dropout, ExponentialMovingAverage, Lambda, Layer,
    Linear, MovingAverage, Sequential, SyncedBatchNorm,
};
pub use module::Module;
pub use var::{Bias, Init, StateReset, StateVar, TrainVar};

#[cfg(test)]
mod tests;
