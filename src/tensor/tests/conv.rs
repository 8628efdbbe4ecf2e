/*
 * @Author       : 老董
 * @Date         : 2025-12-22
 * @Description  : 二维卷积/转置卷积的数值测试（NCHW 输入，HWIO 卷积核），期望值均可手算验证
 */

use crate::errors::TensorError;
use crate::tensor::{ConvPadding, Tensor};

#[rustfmt::skip]
const X_4X4: &[f32] = &[
    1.0, 2.0, 3.0, 4.0,
    5.0, 6.0, 7.0, 8.0,
    9.0, 10.0, 11.0, 12.0,
    13.0, 14.0, 15.0, 16.0,
];

#[test]
fn test_conv2d_valid_two_filters() -> Result<(), TensorError> {
    let x = Tensor::new(X_4X4, &[1, 1, 4, 4]);
    // filter 0: 对角线；filter 1: 反对角线（HWIO 布局）
    #[rustfmt::skip]
    let kernel = Tensor::new(&[
        1.0, 0.0,   0.0, 1.0,
        0.0, 1.0,   1.0, 0.0,
    ], &[2, 2, 1, 2]);
    let y = x.conv2d(&kernel, (1, 1), ConvPadding::Valid, (1, 1), 1)?;
    assert_eq!(y.shape(), &[1, 2, 3, 3]);
    #[rustfmt::skip]
    assert_eq!(y.to_vec(), vec![
        7.0, 9.0, 11.0, 15.0, 17.0, 19.0, 23.0, 25.0, 27.0,
        7.0, 9.0, 11.0, 15.0, 17.0, 19.0, 23.0, 25.0, 27.0,
    ]);
    Ok(())
}

#[test]
fn test_conv2d_same_padding() -> Result<(), TensorError> {
    let x = Tensor::ones(&[1, 1, 3, 3]);
    let kernel = Tensor::ones(&[3, 3, 1, 1]);
    let y = x.conv2d(&kernel, (1, 1), ConvPadding::Same, (1, 1), 1)?;
    assert_eq!(y.shape(), &[1, 1, 3, 3]);
    // 每个位置的结果即落在图内的邻居个数
    assert_eq!(y.to_vec(), vec![4., 6., 4., 6., 9., 6., 4., 6., 4.]);
    Ok(())
}

#[test]
fn test_conv2d_stride_same() -> Result<(), TensorError> {
    let x = Tensor::new(X_4X4, &[1, 1, 4, 4]);
    let kernel = Tensor::ones(&[1, 1, 1, 1]);
    let y = x.conv2d(&kernel, (2, 2), ConvPadding::Same, (1, 1), 1)?;
    assert_eq!(y.shape(), &[1, 1, 2, 2]);
    assert_eq!(y.to_vec(), vec![1., 3., 9., 11.]);

    // 奇数尺寸：SAME 输出为 ceil(5 / 2) = 3
    let x = Tensor::ones(&[2, 1, 5, 5]);
    let kernel = Tensor::ones(&[3, 3, 1, 1]);
    let y = x.conv2d(&kernel, (2, 2), ConvPadding::Same, (1, 1), 1)?;
    assert_eq!(y.shape(), &[2, 1, 3, 3]);
    assert_eq!(y[[1, 0, 1, 1]], 9.);
    assert_eq!(y[[0, 0, 0, 0]], 4.);
    Ok(())
}

#[test]
fn test_conv2d_dilation() -> Result<(), TensorError> {
    let x = Tensor::new(X_4X4, &[1, 1, 4, 4]);
    let kernel = Tensor::ones(&[2, 2, 1, 1]);
    let y = x.conv2d(&kernel, (1, 1), ConvPadding::Valid, (2, 2), 1)?;
    assert_eq!(y.shape(), &[1, 1, 2, 2]);
    assert_eq!(y.to_vec(), vec![24., 28., 40., 44.]);
    Ok(())
}

#[test]
fn test_conv2d_groups() -> Result<(), TensorError> {
    // 2 组：输出通道 0 只看输入通道 0，输出通道 1 只看输入通道 1
    let x = Tensor::new(&[2., 3.], &[1, 2, 1, 1]);
    let kernel = Tensor::new(&[10., 100.], &[1, 1, 1, 2]);
    let y = x.conv2d(&kernel, (1, 1), ConvPadding::Valid, (1, 1), 2)?;
    assert_eq!(y.to_vec(), vec![20., 300.]);

    // 同样的核不分组时通道数不匹配
    assert_eq!(
        x.conv2d(&kernel, (1, 1), ConvPadding::Valid, (1, 1), 1),
        Err(TensorError::ChannelMismatch {
            expected: 1,
            got: 2
        })
    );
    Ok(())
}

#[test]
fn test_conv2d_invalid_inputs() {
    let kernel = Tensor::ones(&[3, 3, 1, 1]);
    assert!(matches!(
        Tensor::ones(&[1, 3, 3]).conv2d(&kernel, (1, 1), ConvPadding::Valid, (1, 1), 1),
        Err(TensorError::RankMismatch { expected: 4, .. })
    ));
    assert!(matches!(
        Tensor::ones(&[1, 1, 2, 2]).conv2d(&kernel, (1, 1), ConvPadding::Valid, (1, 1), 1),
        Err(TensorError::EmptyConvOutput { .. })
    ));
    assert!(matches!(
        Tensor::ones(&[1, 1, 4, 4]).conv2d(&kernel, (0, 1), ConvPadding::Same, (1, 1), 1),
        Err(TensorError::InvalidConvParam { name: "strides", .. })
    ));
}

#[test]
fn test_conv_transpose2d_scatter_stride2() -> Result<(), TensorError> {
    let x = Tensor::new(&[1., 2., 3., 4.], &[1, 1, 2, 2]);
    let kernel = Tensor::ones(&[1, 1, 1, 1]);
    for padding in [ConvPadding::Valid, ConvPadding::Same] {
        let y = x.conv_transpose2d(&kernel, (2, 2), padding, (1, 1))?;
        assert_eq!(y.shape(), &[1, 1, 4, 4]);
        #[rustfmt::skip]
        assert_eq!(y.to_vec(), vec![
            1., 0., 2., 0.,
            0., 0., 0., 0.,
            3., 0., 4., 0.,
            0., 0., 0., 0.,
        ]);
    }
    Ok(())
}

#[test]
fn test_conv_transpose2d_kernel_orientation() -> Result<(), TensorError> {
    // 单个像素经转置卷积后，输出即卷积核本身（未翻转的原样摆放）
    let x = Tensor::ones(&[1, 1, 1, 1]);
    let kernel = Tensor::new(&[1., 2., 3., 4.], &[2, 2, 1, 1]);
    let y = x.conv_transpose2d(&kernel, (1, 1), ConvPadding::Valid, (1, 1))?;
    assert_eq!(y.shape(), &[1, 1, 2, 2]);
    assert_eq!(y.to_vec(), vec![1., 2., 3., 4.]);
    Ok(())
}

#[test]
fn test_conv_transpose2d_output_sizes() -> Result<(), TensorError> {
    let x = Tensor::ones(&[1, 1, 2, 2]);
    let kernel = Tensor::ones(&[2, 2, 1, 1]);
    let valid = x.conv_transpose2d(&kernel, (2, 2), ConvPadding::Valid, (1, 1))?;
    assert_eq!(valid.shape(), &[1, 1, 4, 4]);
    assert_eq!(valid.to_vec(), vec![1.; 16]);

    // 卷积核大于步长：VALID 多出 k - s 行/列，SAME 恰为 in * s
    let kernel = Tensor::ones(&[3, 3, 1, 1]);
    let valid = x.conv_transpose2d(&kernel, (2, 2), ConvPadding::Valid, (1, 1))?;
    assert_eq!(valid.shape(), &[1, 1, 5, 5]);
    let same = x.conv_transpose2d(&kernel, (2, 2), ConvPadding::Same, (1, 1))?;
    assert_eq!(same.shape(), &[1, 1, 4, 4]);
    Ok(())
}

#[test]
fn test_conv_transpose2d_swaps_channels() -> Result<(), TensorError> {
    // 卷积核 [kH, kW, C_out, C_in] = [1, 1, 2, 1]
    let x = Tensor::new(&[2.], &[1, 1, 1, 1]);
    let kernel = Tensor::new(&[5., 7.], &[1, 1, 2, 1]);
    let y = x.conv_transpose2d(&kernel, (1, 1), ConvPadding::Same, (1, 1))?;
    assert_eq!(y.shape(), &[1, 2, 1, 1]);
    assert_eq!(y.to_vec(), vec![10., 14.]);
    Ok(())
}
