/*
 * @Author       : 老董
 * @Date         : 2026-01-17
 * @Description  : Linear layer 单元测试
 */

use super::assert_tensor_close;
use crate::assert_err;
use crate::distribution::Generator;
use crate::errors::{Operator, TensorError};
use crate::nn::{Init, Kwargs, Layer, LayerError, Linear, Module};
use crate::tensor::Tensor;

fn weight_3x2(shape: &[usize]) -> Tensor {
    Tensor::new(&[1., 2., 3., 4., 5., 6.], shape)
}

#[test]
fn test_linear_without_bias_is_mat_mul() -> Result<(), LayerError> {
    let fc = Linear::new(3, 2, false, weight_3x2)?;
    let x = Tensor::new(&[1., 1., 1., 1., 0., -1.], &[2, 3]);
    let y = fc.forward(&x)?;
    assert_eq!(y.shape(), &[2, 2]);
    assert_eq!(y, x.mat_mul(fc.weight().value())?);
    assert_eq!(y.to_vec(), vec![9., 12., -4., -4.]);
    assert!(fc.bias().var().is_none());
    Ok(())
}

#[test]
fn test_linear_with_bias() -> Result<(), LayerError> {
    let mut fc = Linear::new(3, 2, true, weight_3x2)?;
    assert_eq!(fc.parameters()[1].shape(), &[2]);
    fc.parameters_mut()[1].assign(Tensor::new(&[0.5, -0.5], &[2]))?;

    let x = Tensor::new(&[1., 1., 1., 1., 0., -1.], &[2, 3]);
    assert_tensor_close(&fc.forward(&x)?, &[9.5, 11.5, -3.5, -4.5], 1e-6);
    Ok(())
}

#[test]
fn test_linear_leading_dims() -> Result<(), LayerError> {
    let fc = Linear::new(3, 2, true, weight_3x2)?;
    assert_eq!(fc.forward(&Tensor::ones(&[2, 5, 3]))?.shape(), &[2, 5, 2]);
    assert_eq!(fc.forward(&Tensor::ones(&[3]))?.shape(), &[2]);
    assert_eq!((fc.in_features(), fc.out_features()), (3, 2));
    Ok(())
}

#[test]
fn test_linear_shape_mismatch() -> Result<(), LayerError> {
    let mut fc = Linear::new(3, 2, true, weight_3x2)?;
    assert_eq!(
        fc.forward(&Tensor::ones(&[2, 4])),
        Err(LayerError::Tensor(TensorError::OperatorError {
            operator: Operator::MatMul,
            tensor1_shape: vec![2, 4],
            tensor2_shape: vec![3, 2],
        }))
    );
    assert_err!(
        fc.call(&Tensor::ones(&[2, 3]), &Kwargs::new().with("training", true)),
        LayerError::UnexpectedArgument("training")
    );
    // 参数形状固定不变
    assert_err!(
        fc.parameters_mut()[0].assign(Tensor::zeros(&[2, 3])),
        LayerError::ParameterShape { .. }
    );
    Ok(())
}

#[test]
fn test_linear_xavier_init() -> Result<(), LayerError> {
    let init = Init::XavierNormal.initializer(Generator::new(7));
    let fc = Linear::new(100, 50, true, init)?;
    let expected_std = (2.0f32 / 150.0).sqrt();
    let w = fc.weight().value();
    let std = w.square().mean().number().unwrap_or_default().sqrt();
    assert!((std / expected_std - 1.0).abs() < 0.1, "std = {std}");
    // 偏置零初始化
    assert_eq!(fc.parameters()[1].value(), &Tensor::zeros(&[50]));
    assert_eq!(fc.num_params(), 100 * 50 + 50);
    Ok(())
}
