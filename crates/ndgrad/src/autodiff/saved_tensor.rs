//! Saved tensor for backward pass.

use crate::scalar::Scalar;
use crate::tensor::DenseTensor;

/// Forward data kept on a tape node for its derivative rule.
///
/// Holds a view of the original buffer: saving never copies elements, and a
/// later write to the original tensor copies on write instead of changing what
/// was saved.
#[derive(Debug, Clone)]
pub struct SavedTensor<T: Scalar> {
    data: DenseTensor<T>,
}

impl<T: Scalar> SavedTensor<T> {
    /// Save a view of `tensor`.
    pub fn new(tensor: &DenseTensor<T>) -> Self {
        Self {
            data: tensor.view(),
        }
    }

    /// Get reference to saved data.
    pub fn get(&self) -> &DenseTensor<T> {
        &self.data
    }

    /// Shape of the saved data.
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Check whether the saved data is still the buffer of `tensor`.
    pub fn shares_data_with(&self, tensor: &DenseTensor<T>) -> bool {
        self.data.shares_storage_with(tensor)
    }
}
