//! Gradient storage container.

use super::tensor::ValueId;
use crate::error::TensorError;
use crate::operations::add;
use crate::tensor::DenseTensor;
use std::collections::HashMap;

/// Gradients delivered by one backward pass, keyed by value.
///
/// Holds what this pass contributed, not the running totals in each value's
/// gradient slot. Intermediate values reached by the pass appear here too.
#[derive(Debug, Clone)]
pub struct Gradients {
    grads: HashMap<ValueId, DenseTensor<f64>>,
}

impl Gradients {
    /// Create empty gradient container.
    pub fn new() -> Self {
        Self {
            grads: HashMap::new(),
        }
    }

    /// Accumulate gradient for a value.
    ///
    /// If gradient already exists, adds to it (for multiple paths).
    pub fn accumulate(&mut self, id: ValueId, grad: DenseTensor<f64>) -> Result<(), TensorError> {
        if let Some(existing) = self.grads.get_mut(&id) {
            *existing = add(existing, &grad)?;
        } else {
            self.grads.insert(id, grad);
        }
        Ok(())
    }

    /// Get gradient for a value.
    pub fn get(&self, id: ValueId) -> Option<&DenseTensor<f64>> {
        self.grads.get(&id)
    }

    /// Remove and return gradient.
    pub fn remove(&mut self, id: ValueId) -> Option<DenseTensor<f64>> {
        self.grads.remove(&id)
    }

    /// Check if gradient exists for value.
    pub fn contains(&self, id: ValueId) -> bool {
        self.grads.contains_key(&id)
    }

    /// Number of stored gradients.
    pub fn len(&self) -> usize {
        self.grads.len()
    }

    /// Check if no gradients stored.
    pub fn is_empty(&self) -> bool {
        self.grads.is_empty()
    }

    /// Iterate over all gradients.
    pub fn iter(&self) -> impl Iterator<Item = (&ValueId, &DenseTensor<f64>)> {
        self.grads.iter()
    }
}

impl Default for Gradients {
    fn default() -> Self {
        Self::new()
    }
}
