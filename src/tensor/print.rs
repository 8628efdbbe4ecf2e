use crate::tensor::Tensor;
use ndarray::{ArrayViewD, Axis};
use std::fmt;

/// 单个维度超过该长度时，只展示首尾各`EDGE_ITEMS`个元素
const MAX_ITEMS: usize = 6;
const EDGE_ITEMS: usize = 3;

fn write_nested(f: &mut fmt::Formatter, view: ArrayViewD<'_, f32>, depth: usize) -> fmt::Result {
    if view.ndim() == 0 {
        return write!(f, "{:8.4}", view.iter().next().copied().unwrap_or(f32::NAN));
    }
    let len = view.len_of(Axis(0));
    let indices: Vec<Option<usize>> = if len > MAX_ITEMS {
        (0..EDGE_ITEMS)
            .map(Some)
            .chain(std::iter::once(None))
            .chain((len - EDGE_ITEMS..len).map(Some))
            .collect()
    } else {
        (0..len).map(Some).collect()
    };
    // 内层为行时换行并缩进，最内层元素用逗号隔开
    let separator = if view.ndim() > 1 {
        format!(",\n{}", " ".repeat(depth + 1))
    } else {
        ", ".to_string()
    };

    write!(f, "[")?;
    for (n, index) in indices.iter().enumerate() {
        if n > 0 {
            write!(f, "{separator}")?;
        }
        match index {
            Some(i) => write_nested(f, view.index_axis(Axis(0), *i), depth + 1)?,
            None => write!(f, "     ...")?,
        }
    }
    write!(f, "]")
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write_nested(f, self.data.view(), 0)?;
        writeln!(f, "\n形状: {:?}", self.shape())
    }
}
