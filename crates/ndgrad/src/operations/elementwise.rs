//! Element-wise tensor operations.

use crate::error::TensorError;
use crate::scalar::Scalar;
use crate::tensor::DenseTensor;

/// Multiply all elements by a scalar, returning a new tensor.
///
/// # Example
///
/// ```
/// use ndgrad::Tensor;
/// use ndgrad::operations::scale;
///
/// let t = Tensor::from_vec(vec![1.0, 2.0, 3.0], &[3]).unwrap();
/// let ts = scale(&t, 2.0);
/// assert_eq!(ts.data(), &[2.0, 4.0, 6.0]);
/// ```
pub fn scale<ElT: Scalar>(tensor: &DenseTensor<ElT>, alpha: ElT) -> DenseTensor<ElT> {
    apply(tensor, |x| x * alpha)
}

/// Apply a function to each element, returning a new tensor.
///
/// # Example
///
/// ```
/// use ndgrad::Tensor;
/// use ndgrad::operations::apply;
///
/// let t = Tensor::from_vec(vec![1.0, 4.0, 9.0], &[3]).unwrap();
/// let ts = apply(&t, |x: f64| x.sqrt());
/// assert_eq!(ts.data(), &[1.0, 2.0, 3.0]);
/// ```
pub fn apply<ElT: Scalar, F>(tensor: &DenseTensor<ElT>, f: F) -> DenseTensor<ElT>
where
    F: Fn(ElT) -> ElT,
{
    let data: Vec<ElT> = tensor.data().iter().map(|&x| f(x)).collect();
    DenseTensor::from_vec(data, tensor.shape()).expect("apply: shape unchanged")
}

/// Apply a binary function combining two tensors element-wise.
///
/// Both tensors must have the same shape; there is no broadcasting.
///
/// # Example
///
/// ```
/// use ndgrad::Tensor;
/// use ndgrad::operations::apply_binary;
///
/// let a = Tensor::from_vec(vec![1.0, 2.0, 3.0], &[3]).unwrap();
/// let b = Tensor::from_vec(vec![4.0, 5.0, 6.0], &[3]).unwrap();
/// let c = apply_binary("max", &a, &b, |x, y| if x > y { x } else { y }).unwrap();
/// assert_eq!(c.data(), &[4.0, 5.0, 6.0]);
/// ```
pub fn apply_binary<ElT: Scalar, F>(
    op: &'static str,
    a: &DenseTensor<ElT>,
    b: &DenseTensor<ElT>,
    f: F,
) -> Result<DenseTensor<ElT>, TensorError>
where
    F: Fn(ElT, ElT) -> ElT,
{
    if a.shape() != b.shape() {
        return Err(TensorError::IncompatibleShapes {
            op,
            lhs: a.shape().to_vec(),
            rhs: b.shape().to_vec(),
        });
    }
    let data: Vec<ElT> = a
        .data()
        .iter()
        .zip(b.data().iter())
        .map(|(&x, &y)| f(x, y))
        .collect();
    Ok(DenseTensor::from_vec(data, a.shape()).expect("apply_binary: shape unchanged"))
}

/// Element-wise sum.
pub fn add<ElT: Scalar>(
    a: &DenseTensor<ElT>,
    b: &DenseTensor<ElT>,
) -> Result<DenseTensor<ElT>, TensorError> {
    apply_binary("add", a, b, |x, y| x + y)
}

/// Element-wise difference.
pub fn sub<ElT: Scalar>(
    a: &DenseTensor<ElT>,
    b: &DenseTensor<ElT>,
) -> Result<DenseTensor<ElT>, TensorError> {
    apply_binary("sub", a, b, |x, y| x - y)
}

/// Element-wise (Hadamard) product.
pub fn mul<ElT: Scalar>(
    a: &DenseTensor<ElT>,
    b: &DenseTensor<ElT>,
) -> Result<DenseTensor<ElT>, TensorError> {
    apply_binary("mul", a, b, |x, y| x * y)
}

/// Element-wise quotient. Division by zero follows IEEE semantics.
pub fn div<ElT: Scalar>(
    a: &DenseTensor<ElT>,
    b: &DenseTensor<ElT>,
) -> Result<DenseTensor<ElT>, TensorError> {
    apply_binary("div", a, b, |x, y| x / y)
}
