//! # Only Layers
//!
//! `only_layers`用纯rust实现一组常见的神经网络层：BatchNorm（含跨设备同步版本）、
//! 二维卷积与转置卷积、Dropout、全连接、滑动平均与指数滑动平均，以及按需转发具名参数的 Sequential。
//!
//! 各层只负责前向计算与状态维护，不包含自动求导；可训练参数通过[`nn::Module`]暴露给外部优化器。

pub mod distribution;
pub mod errors;
pub mod nn;
pub mod parallel;
pub mod tensor;
pub mod utils;
