//! Tensor norm operations.

use crate::scalar::Scalar;
use crate::tensor::DenseTensor;

/// Compute the Euclidean (Frobenius) norm of a tensor.
///
/// For a tensor T, returns sqrt(sum(T_i^2)) where the sum is over all elements.
///
/// # Example
///
/// ```
/// use ndgrad::Tensor;
/// use ndgrad::operations::norm;
///
/// let t = Tensor::from_vec(vec![3.0_f64, 4.0], &[2]).unwrap();
/// assert!((norm(&t) - 5.0).abs() < 1e-10);
/// ```
pub fn norm<ElT: Scalar>(tensor: &DenseTensor<ElT>) -> ElT {
    norm_sqr(tensor).sqrt()
}

/// Compute the squared Euclidean norm of a tensor.
pub fn norm_sqr<ElT: Scalar>(tensor: &DenseTensor<ElT>) -> ElT {
    tensor
        .data()
        .iter()
        .fold(ElT::zero(), |sum, &x| sum + x * x)
}
