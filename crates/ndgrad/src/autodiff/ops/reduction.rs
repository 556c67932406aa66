//! Tracked reductions to a scalar.

use crate::autodiff::graph::{OpKind, Tape};
use crate::autodiff::tensor::TrackedTensor;
use crate::error::TensorError;
use crate::operations::{dot, norm, sum};
use crate::tensor::DenseTensor;

impl Tape {
    /// Tracked inner product of two vectors. The result is a scalar.
    ///
    /// # Errors
    ///
    /// `RankMismatch` unless both inputs are vectors, `IncompatibleShapes` if
    /// their lengths differ.
    pub fn dot(&self, a: &TrackedTensor, b: &TrackedTensor) -> Result<TrackedTensor, TensorError> {
        let result = DenseTensor::scalar(dot(a.tensor(), b.tensor())?);
        Ok(self.track(OpKind::Dot, &[a, b], result))
    }

    /// Tracked sum of all elements.
    pub fn sum(&self, a: &TrackedTensor) -> TrackedTensor {
        let result = DenseTensor::scalar(sum(a.tensor()));
        self.track(OpKind::Sum, &[a], result)
    }

    /// Tracked Euclidean norm.
    ///
    /// Differentiating through the norm of a zero tensor fails with
    /// [`GradError::DivisionByZero`](crate::autodiff::GradError::DivisionByZero).
    pub fn norm(&self, a: &TrackedTensor) -> TrackedTensor {
        let result = DenseTensor::scalar(norm(a.tensor()));
        self.track(OpKind::Norm, &[a], result)
    }
}
