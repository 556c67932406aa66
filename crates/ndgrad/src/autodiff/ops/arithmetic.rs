//! Element-wise tracked operations.

use crate::autodiff::graph::{OpKind, Tape};
use crate::autodiff::tensor::TrackedTensor;
use crate::error::TensorError;
use crate::operations::{add, mul, scale};

impl Tape {
    /// Tracked element-wise sum `a + b`.
    ///
    /// # Errors
    ///
    /// `IncompatibleShapes` if the shapes differ; there is no broadcasting.
    pub fn add(&self, a: &TrackedTensor, b: &TrackedTensor) -> Result<TrackedTensor, TensorError> {
        let result = add(a.tensor(), b.tensor())?;
        Ok(self.track(OpKind::Add, &[a, b], result))
    }

    /// Tracked multiplication by a constant.
    ///
    /// ```
    /// use ndgrad::Tensor;
    /// use ndgrad::autodiff::{Tape, TrackedTensor};
    ///
    /// let tape = Tape::new();
    /// let x = TrackedTensor::leaf(Tensor::from_vec(vec![1.0, 2.0], &[2]).unwrap());
    /// let y = tape.scale(&x, 3.0);
    /// assert_eq!(y.data(), &[3.0, 6.0]);
    /// assert!(y.requires_grad());
    /// ```
    pub fn scale(&self, a: &TrackedTensor, factor: f64) -> TrackedTensor {
        let result = scale(a.tensor(), factor);
        self.track(OpKind::Scale { factor }, &[a], result)
    }

    /// Tracked element-wise product `a * b`.
    pub fn mul(&self, a: &TrackedTensor, b: &TrackedTensor) -> Result<TrackedTensor, TensorError> {
        let result = mul(a.tensor(), b.tensor())?;
        Ok(self.track(OpKind::Mul, &[a, b], result))
    }
}
