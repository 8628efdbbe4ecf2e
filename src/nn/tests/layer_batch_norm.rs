/*
 * @Author       : 老董
 * @Date         : 2026-01-27
 * @Description  : BatchNorm layer 单元测试（期望值均可手算验证）
 */

use super::assert_tensor_close;
use crate::assert_err;
use crate::errors::TensorError;
use crate::nn::layer::{batch_norm_0d, batch_norm_1d, batch_norm_2d};
use crate::nn::{BatchNorm, BatchNormConfig, Kwargs, Layer, LayerError, Module};
use crate::tensor::Tensor;

fn config(momentum: f32) -> BatchNormConfig {
    BatchNormConfig {
        momentum,
        ..Default::default()
    }
}

#[test]
fn test_batch_norm_layouts() {
    let bn = batch_norm_0d(4);
    assert_eq!(bn.running_mean().shape(), &[1, 4]);
    assert_eq!(bn.redux(), &[0]);

    let bn = batch_norm_1d(4);
    assert_eq!(bn.running_var().shape(), &[1, 4, 1]);
    assert_eq!(bn.redux(), &[0, 2]);

    let bn = batch_norm_2d(4);
    assert_eq!(bn.gamma().shape(), &[1, 4, 1, 1]);
    assert_eq!(bn.beta().shape(), &[1, 4, 1, 1]);
    assert_eq!(bn.redux(), &[0, 2, 3]);

    // 初始值：running_mean/beta 为0，running_var/gamma 为1
    assert_eq!(bn.running_mean().value(), &Tensor::zeros(&[1, 4, 1, 1]));
    assert_eq!(bn.running_var().value(), &Tensor::ones(&[1, 4, 1, 1]));
    assert_eq!(bn.config(), BatchNormConfig::default());
}

#[test]
fn test_batch_norm_training_updates_running_stats() -> Result<(), LayerError> {
    let mut bn = BatchNorm::d0(2, config(0.9));
    // 每列：均值 [2, 4]，有偏方差 [1, 4]
    let x = Tensor::new(&[1., 2., 3., 6.], &[2, 2]);
    let y = bn.forward(&x, true)?;

    assert_tensor_close(&y, &[-1., -1., 1., 1.], 1e-4);
    // running <- running + 0.1 * (stat - running)
    assert_tensor_close(bn.running_mean().value(), &[0.2, 0.4], 1e-6);
    assert_tensor_close(bn.running_var().value(), &[1.0, 1.3], 1e-6);
    Ok(())
}

#[test]
fn test_batch_norm_eval_uses_running_stats() -> Result<(), LayerError> {
    let mut bn = BatchNorm::d0(2, config(0.9));
    bn.forward(&Tensor::new(&[1., 2., 3., 6.], &[2, 2]), true)?;
    let state = bn.running_mean().clone();

    let x = Tensor::new(&[1., 2.], &[1, 2]);
    let first = bn.forward(&x, false)?;
    let second = bn.forward(&x, false)?;
    // (1 - 0.2) / sqrt(1.0)，(2 - 0.4) / sqrt(1.3)
    assert_tensor_close(&first, &[0.8, 1.403_292], 1e-4);
    // 评估模式幂等，且不修改跟踪状态
    assert_eq!(first, second);
    assert_eq!(bn.running_mean(), &state);
    Ok(())
}

#[test]
fn test_batch_norm_2d_normalizes_per_channel() -> Result<(), LayerError> {
    let mut bn = batch_norm_2d(2);
    // 通道0全为3，通道1为 [0, 2, 0, 2]（两个样本相同）
    #[rustfmt::skip]
    let x = Tensor::new(&[
        3., 3., 3., 3.,   0., 2., 0., 2.,
        3., 3., 3., 3.,   0., 2., 0., 2.,
    ], &[2, 2, 2, 2]);
    let y = bn.forward(&x, true)?;
    assert_eq!(y.shape(), &[2, 2, 2, 2]);
    #[rustfmt::skip]
    assert_tensor_close(&y, &[
        0., 0., 0., 0.,   -1., 1., -1., 1.,
        0., 0., 0., 0.,   -1., 1., -1., 1.,
    ], 1e-3);
    assert_eq!(bn.running_mean().shape(), &[1, 2, 1, 1]);
    assert_tensor_close(bn.running_mean().value(), &[0.003, 0.001], 1e-6);
    Ok(())
}

#[test]
fn test_batch_norm_invalid_axis() {
    let mut bn = BatchNorm::new(&[1, 2], &[5], BatchNormConfig::default());
    let x = Tensor::zeros(&[3, 2]);
    assert_eq!(
        bn.forward(&x, true),
        Err(LayerError::Tensor(TensorError::AxisOutOfRange { axis: 5, rank: 2 }))
    );
}

#[test]
fn test_batch_norm_call_kwargs() -> Result<(), LayerError> {
    let mut bn = batch_norm_0d(2);
    let x = Tensor::new(&[1., 2., 3., 6.], &[2, 2]);

    assert_err!(bn.call(&x, &Kwargs::new()), LayerError::MissingArgument("training"));
    assert_err!(
        bn.call(&x, &Kwargs::new().with("training", true).with("dropout_keep", 0.5)),
        LayerError::UnexpectedArgument("dropout_keep")
    );
    assert_err!(
        bn.call(&x, &Kwargs::new().with("training", 1.0)),
        LayerError::ArgumentType { expected: "bool", .. }
    );

    let y = bn.call(&x, &Kwargs::new().with("training", false))?;
    assert_eq!(y.shape(), &[2, 2]);
    Ok(())
}

#[test]
fn test_batch_norm_module() -> Result<(), LayerError> {
    let mut bn = BatchNorm::d0(3, config(0.5));
    assert_eq!(bn.parameters().len(), 2);
    assert_eq!(bn.states().len(), 2);
    assert_eq!(bn.num_params(), 6);

    bn.forward(&Tensor::new(&[1., 2., 3., 3., 4., 5.], &[2, 3]), true)?;
    assert_ne!(bn.running_mean().value(), &Tensor::zeros(&[1, 3]));
    for mut state in bn.states_mut() {
        state.reset();
    }
    assert_eq!(bn.running_mean().value(), &Tensor::zeros(&[1, 3]));
    assert_eq!(bn.running_var().value(), &Tensor::ones(&[1, 3]));
    Ok(())
}
