//! Reductions: full sums, inner products, per-axis sums and running sums.

use crate::error::TensorError;
use crate::scalar::Scalar;
use crate::strides::{compute_strides, linear_to_cartesian};
use crate::tensor::DenseTensor;

/// Sum of all elements.
///
/// ```
/// use ndgrad::Tensor;
/// use ndgrad::operations::sum;
///
/// let t = Tensor::from_vec(vec![1.0, 2.0, 3.0], &[3]).unwrap();
/// assert_eq!(sum(&t), 6.0);
/// ```
pub fn sum<ElT: Scalar>(tensor: &DenseTensor<ElT>) -> ElT {
    tensor
        .data()
        .iter()
        .fold(ElT::zero(), |acc, &x| acc + x)
}

/// Inner product of two vectors of equal length.
///
/// # Errors
///
/// `RankMismatch` if either operand is not rank 1, `IncompatibleShapes` if
/// the lengths differ.
///
/// ```
/// use ndgrad::Tensor;
/// use ndgrad::operations::dot;
///
/// let a = Tensor::from_vec(vec![1.0, 2.0, 3.0], &[3]).unwrap();
/// let b = Tensor::from_vec(vec![4.0, 5.0, 6.0], &[3]).unwrap();
/// assert_eq!(dot(&a, &b).unwrap(), 32.0);
/// ```
pub fn dot<ElT: Scalar>(a: &DenseTensor<ElT>, b: &DenseTensor<ElT>) -> Result<ElT, TensorError> {
    for t in [a, b] {
        if t.ndim() != 1 {
            return Err(TensorError::RankMismatch {
                expected: 1,
                actual: t.ndim(),
            });
        }
    }
    if a.len() != b.len() {
        return Err(TensorError::IncompatibleShapes {
            op: "dot",
            lhs: a.shape().to_vec(),
            rhs: b.shape().to_vec(),
        });
    }
    Ok(a
        .data()
        .iter()
        .zip(b.data().iter())
        .fold(ElT::zero(), |acc, (&x, &y)| acc + x * y))
}

/// Sum along one axis.
///
/// With `keepdim` the reduced axis stays in the shape with extent 1, which
/// is what row-normalisation needs.
///
/// ```
/// use ndgrad::Tensor;
/// use ndgrad::operations::sum_axis;
///
/// // [[1, 3], [2, 4]] in column-major order
/// let t = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
/// let rows = sum_axis(&t, 1, true).unwrap();
/// assert_eq!(rows.shape(), &[2, 1]);
/// assert_eq!(rows.data(), &[4.0, 6.0]);
/// ```
pub fn sum_axis<ElT: Scalar>(
    tensor: &DenseTensor<ElT>,
    axis: usize,
    keepdim: bool,
) -> Result<DenseTensor<ElT>, TensorError> {
    check_axis(tensor, axis)?;

    let mut kept_shape = tensor.shape().to_vec();
    kept_shape[axis] = 1;
    let kept_strides = compute_strides(&kept_shape);

    let mut out = DenseTensor::zeros(&kept_shape);
    {
        let out_data = out.data_mut();
        for (linear, &x) in tensor.data().iter().enumerate() {
            let idx = linear_to_cartesian(linear, tensor.shape());
            let target: usize = idx
                .iter()
                .zip(kept_strides.iter())
                .enumerate()
                .filter(|(dim, _)| *dim != axis)
                .map(|(_, (&i, &s))| i * s)
                .sum();
            out_data[target] = out_data[target] + x;
        }
    }

    if keepdim {
        Ok(out)
    } else {
        let mut squeezed = tensor.shape().to_vec();
        squeezed.remove(axis);
        out.reshape(&squeezed)
    }
}

/// Running sum along one axis; the output has the input's shape.
///
/// ```
/// use ndgrad::Tensor;
/// use ndgrad::operations::cumsum;
///
/// let t = Tensor::from_vec(vec![1.0, 2.0, 3.0], &[3]).unwrap();
/// assert_eq!(cumsum(&t, 0).unwrap().data(), &[1.0, 3.0, 6.0]);
/// ```
pub fn cumsum<ElT: Scalar>(
    tensor: &DenseTensor<ElT>,
    axis: usize,
) -> Result<DenseTensor<ElT>, TensorError> {
    check_axis(tensor, axis)?;

    let stride = tensor.strides()[axis];
    let shape = tensor.shape().to_vec();
    let mut out = tensor.clone();
    let data = out.data_mut();
    for linear in 0..data.len() {
        // Position along `axis` for column-major layout.
        if (linear / stride) % shape[axis] > 0 {
            data[linear] = data[linear] + data[linear - stride];
        }
    }
    Ok(out)
}

fn check_axis<ElT: Scalar>(tensor: &DenseTensor<ElT>, axis: usize) -> Result<(), TensorError> {
    if axis >= tensor.ndim() {
        return Err(TensorError::AxisOutOfBounds {
            axis,
            ndim: tensor.ndim(),
        });
    }
    Ok(())
}
