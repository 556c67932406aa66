//! Dense storage for tensor data.

use crate::scalar::Scalar;
use std::rc::Rc;

/// Dense storage - contiguous array of elements in column-major order.
///
/// The buffer is reference counted: cloning a `Dense` (or taking a
/// [`view`](Dense::view)) shares the elements, and the first mutation through
/// a shared handle copies them (copy-on-write).
#[derive(Debug, Clone, PartialEq)]
pub struct Dense<ElT: Scalar> {
    data: Rc<Vec<ElT>>,
}

impl<ElT: Scalar> Dense<ElT> {
    /// Create dense storage with given length, zero-initialized.
    pub fn zeros(len: usize) -> Self {
        Self::from_vec(vec![ElT::zero(); len])
    }

    /// Create dense storage from existing vector (takes ownership).
    pub fn from_vec(data: Vec<ElT>) -> Self {
        Self {
            data: Rc::new(data),
        }
    }

    /// Length of storage.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if storage is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get immutable slice of data.
    #[inline]
    pub fn as_slice(&self) -> &[ElT] {
        &self.data
    }

    /// Get mutable slice of data, detaching from other views first.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [ElT] {
        Rc::make_mut(&mut self.data).as_mut_slice()
    }

    /// Create a view of the same underlying data.
    #[inline]
    pub fn view(&self) -> Self {
        Self {
            data: Rc::clone(&self.data),
        }
    }

    /// Check whether both storages point at the same buffer.
    #[inline]
    pub fn shares_storage_with(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }

    /// Check whether other views of this buffer exist.
    #[inline]
    pub fn is_shared(&self) -> bool {
        Rc::strong_count(&self.data) > 1
    }

    /// Consume the storage and return its elements, copying if shared.
    pub fn into_vec(self) -> Vec<ElT> {
        Rc::try_unwrap(self.data).unwrap_or_else(|shared| (*shared).clone())
    }
}

impl<ElT: Scalar> std::ops::Index<usize> for Dense<ElT> {
    type Output = ElT;

    #[inline]
    fn index(&self, i: usize) -> &ElT {
        &self.data[i]
    }
}

impl<ElT: Scalar> std::ops::IndexMut<usize> for Dense<ElT> {
    #[inline]
    fn index_mut(&mut self, i: usize) -> &mut ElT {
        &mut self.as_mut_slice()[i]
    }
}
