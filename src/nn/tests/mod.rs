use crate::tensor::Tensor;
use approx::assert_abs_diff_eq;

mod layer_batch_norm;
mod layer_linear;
mod module_trait;

/// 逐元素比较张量与期望值（行优先）
fn assert_tensor_close(actual: &Tensor, expected: &[f32], epsilon: f32) {
    let values = actual.to_vec();
    assert_eq!(values.len(), expected.len(), "元素个数不一致：{values:?}");
    for (a, e) in values.iter().zip(expected) {
        assert_abs_diff_eq!(*a, *e, epsilon = epsilon);
    }
}
