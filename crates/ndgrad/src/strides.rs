//! Column-major index arithmetic.
//!
//! Element `(i0, i1, ...)` of a tensor lives at `i0 + d0 * (i1 + d1 * ...)`
//! in its flat buffer. A rank-0 shape has no strides and one element.

/// Strides of a column-major buffer with the given shape.
///
/// The first axis is contiguous; each later stride is the product of all
/// earlier extents.
///
/// ```
/// use ndgrad::strides::compute_strides;
///
/// // 500 batches of 6 counts: consecutive batches are adjacent.
/// assert_eq!(compute_strides(&[500, 6]), vec![1, 500]);
/// assert_eq!(compute_strides(&[]), Vec::<usize>::new());
/// ```
pub fn compute_strides(shape: &[usize]) -> Vec<usize> {
    shape
        .iter()
        .scan(1, |extent, &dim| {
            let stride = *extent;
            *extent *= dim;
            Some(stride)
        })
        .collect()
}

/// Flat offset of `indices` under `strides`.
#[inline]
pub fn cartesian_to_linear(indices: &[usize], strides: &[usize]) -> usize {
    indices.iter().zip(strides).map(|(&i, &s)| i * s).sum()
}

/// Indices of flat offset `linear` in a column-major buffer of `shape`.
///
/// `linear` must be below the element count of `shape`.
pub fn linear_to_cartesian(linear: usize, shape: &[usize]) -> Vec<usize> {
    shape
        .iter()
        .scan(linear, |rest, &dim| {
            let index = *rest % dim;
            *rest /= dim;
            Some(index)
        })
        .collect()
}
