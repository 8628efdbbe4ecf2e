/*
 * @Author       : 老董
 * @Date         : 2026-01-29
 * @Description  : 卷积“编码-解码”网络集成测试
 *                 验证：Conv2d + BatchNorm2d + Lambda + ConvTranspose2d + Dropout 在 Sequential 中串联，
 *                 且`training`/`dropout_keep`只被转发给声明了它们的层
 */

use only_layers::distribution::Generator;
use only_layers::nn::layer::batch_norm_2d;
use only_layers::nn::{
    Conv2d, Conv2dConfig, ConvTranspose2d, ConvTransposeConfig, Dropout, Init, Kwargs, Lambda,
    LayerError, Module, Sequential,
};
use only_layers::tensor::Tensor;

/// 网络结构：
/// ```text
/// Input [batch, 1, 8, 8]
///     ↓
/// conv (1→4, 3x3, stride=2, SAME) → [batch, 4, 4, 4]
///     ↓
/// batch_norm_2d → ReLU
///     ↓
/// deconv (4→1, 3x3, stride=2, SAME) → [batch, 1, 8, 8]
///     ↓
/// dropout (keep=0.8)
/// ```
fn build(seed: u64) -> Result<Sequential, LayerError> {
    let generator = Generator::new(seed);
    let conv = Conv2d::new(
        1,
        4,
        (3, 3),
        Conv2dConfig {
            strides: (2, 2),
            ..Default::default()
        },
        Init::KaimingNormal.initializer(generator.clone()),
    )?;
    let deconv = ConvTranspose2d::new(
        4,
        1,
        (3, 3),
        ConvTransposeConfig {
            strides: (2, 2),
            ..Default::default()
        },
        Init::XavierNormal.initializer(generator.clone()),
    )?;
    Ok(Sequential::new(vec![
        conv.into(),
        batch_norm_2d(4).into(),
        Lambda::new(|x| Ok(x.map(|v| v.max(0.0)))).into(),
        deconv.into(),
        Dropout::new(0.8, generator).into(),
    ]))
}

fn batch(seed: u64) -> Tensor {
    Generator::new(seed).normal(0.0, 1.0, &[3, 1, 8, 8])
}

#[test]
fn test_encoder_decoder_shapes_and_state() -> Result<(), LayerError> {
    let mut model = build(42)?;
    // conv: 36 + 4，bn: 4 + 4，deconv: 36 + 1
    assert_eq!(model.num_params(), 40 + 8 + 37);
    assert_eq!(model.states().len(), 2);

    let train = Kwargs::new().with("training", true).with("dropout_keep", 0.5);
    let y = model.forward(&batch(1), &train)?;
    assert_eq!(y.shape(), &[3, 1, 8, 8]);
    // BatchNorm 的滑动均值已被更新
    assert_ne!(model.states()[0].value(), &Tensor::zeros(&[1, 4, 1, 1]));

    // 评估模式：Dropout 恒等，BatchNorm 不改状态，结果幂等
    let eval = Kwargs::new().with("training", false);
    let snapshot = model.states()[0].value().clone();
    let a = model.forward(&batch(2), &eval)?;
    let b = model.forward(&batch(2), &eval)?;
    assert_eq!(a, b);
    assert_eq!(model.states()[0].value(), &snapshot);
    Ok(())
}

#[test]
fn test_encoder_decoder_reproducible() -> Result<(), LayerError> {
    let train = Kwargs::new().with("training", true);
    let y1 = build(7)?.forward(&batch(3), &train)?;
    let y2 = build(7)?.forward(&batch(3), &train)?;
    assert_eq!(y1, y2);

    let y3 = build(8)?.forward(&batch(3), &train)?;
    assert_ne!(y1, y3);
    Ok(())
}

#[test]
fn test_missing_training_flag_is_reported() -> Result<(), LayerError> {
    let mut model = build(0)?;
    let result = model.forward(&batch(0), &Kwargs::new());
    assert_eq!(result, Err(LayerError::MissingArgument("training".to_string())));
    Ok(())
}
