/*
 * @Author       : 老董
 * @Date         : 2026-01-09
 * @Description  : Module trait 测试：外部优化器经由`parameters_mut()`更新参数
 */

use crate::distribution::Generator;
use crate::nn::layer::batch_norm_2d;
use crate::nn::{
    AnyLayer, Conv2d, Conv2dConfig, Dropout, Init, LayerError, Linear, Module, Sequential,
};
use crate::tensor::Tensor;

/// 最简单的“优化器”：p <- p - lr * g（这里以常数梯度代替）
fn sgd_step(model: &mut impl Module, lr: f32) -> Result<(), LayerError> {
    for param in model.parameters_mut() {
        let grad = Tensor::ones(param.shape());
        let updated = param.value().try_sub(&(grad * lr))?;
        param.assign(updated)?;
    }
    Ok(())
}

#[test]
fn test_optimizer_reaches_every_parameter() -> Result<(), LayerError> {
    let generator = Generator::new(1);
    let mut model = Sequential::new(vec![
        Conv2d::new(
            1,
            2,
            (3, 3),
            Conv2dConfig::default(),
            Init::KaimingNormal.initializer(generator.clone()),
        )?
        .into(),
        batch_norm_2d(2).into(),
        Dropout::new(0.9, generator.clone()).into(),
        Linear::new(4, 1, true, Init::Zeros.initializer(generator))?.into(),
    ]);
    assert_eq!(model.parameters().len(), 2 + 2 + 2);

    let before = model
        .parameters()
        .iter()
        .map(|p| p.value().clone())
        .collect::<Vec<_>>();
    sgd_step(&mut model, 0.1)?;
    for (p, old) in model.parameters().iter().zip(&before) {
        let delta = old.try_sub(p.value())?;
        assert!(delta.to_vec().iter().all(|d| (d - 0.1).abs() < 1e-6));
    }
    Ok(())
}

#[test]
fn test_any_layer_dispatch() {
    let layer: AnyLayer = Dropout::new(0.5, Generator::default()).into();
    assert_eq!(layer.num_params(), 0);
    assert!(layer.states().is_empty());
    assert!(matches!(layer, AnyLayer::Dropout(_)));
}
