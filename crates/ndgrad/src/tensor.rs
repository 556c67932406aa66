//! N-dimensional dense tensor.

use crate::error::TensorError;
use crate::scalar::Scalar;
use crate::storage::Dense;
use crate::strides::{cartesian_to_linear, compute_strides};

/// A n-dimensional tensor over dense, column-major storage.
///
/// A tensor with an empty shape is a scalar holding exactly one element.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor<ElT: Scalar> {
    storage: Dense<ElT>,
    shape: Vec<usize>,
    strides: Vec<usize>,
}

/// Type alias kept for call sites that want to spell out the storage kind.
pub type DenseTensor<ElT> = Tensor<ElT>;

impl<ElT: Scalar> Tensor<ElT> {
    /// Create a new tensor with the given shape, zero-initialized.
    ///
    /// # Examples
    ///
    /// ```
    /// use ndgrad::Tensor;
    ///
    /// let t: Tensor<f64> = Tensor::zeros(&[2, 3, 4]);
    /// assert_eq!(t.shape(), &[2, 3, 4]);
    /// assert_eq!(t.len(), 24);
    /// ```
    pub fn zeros(shape: &[usize]) -> Self {
        let len: usize = shape.iter().product();
        Self {
            storage: Dense::zeros(len), // empty shape: product is 1
            shape: shape.to_vec(),
            strides: compute_strides(shape),
        }
    }

    /// Create a tensor filled with ones.
    pub fn ones(shape: &[usize]) -> Self {
        Self::full(shape, ElT::one())
    }

    /// Create a tensor with every element set to `value`.
    pub fn full(shape: &[usize], value: ElT) -> Self {
        let mut t = Self::zeros(shape);
        t.fill(value);
        t
    }

    /// Create a rank-0 tensor holding a single value.
    ///
    /// ```
    /// use ndgrad::Tensor;
    ///
    /// let t = Tensor::scalar(2.5);
    /// assert_eq!(t.ndim(), 0);
    /// assert_eq!(t.item(), Some(2.5));
    /// ```
    pub fn scalar(value: ElT) -> Self {
        Self {
            storage: Dense::from_vec(vec![value]),
            shape: Vec::new(),
            strides: Vec::new(),
        }
    }

    /// Create the vector `[0, 1, ..., n - 1]`.
    ///
    /// ```
    /// use ndgrad::Tensor;
    ///
    /// let t: Tensor<f64> = Tensor::arange(4);
    /// assert_eq!(t.data(), &[0.0, 1.0, 2.0, 3.0]);
    /// ```
    pub fn arange(n: usize) -> Self {
        let data: Vec<ElT> = std::iter::successors(Some(ElT::zero()), |&x| Some(x + ElT::one()))
            .take(n)
            .collect();
        Self {
            storage: Dense::from_vec(data),
            shape: vec![n],
            strides: vec![1],
        }
    }

    /// Create tensor from data and shape.
    ///
    /// Data is expected to be in column-major order.
    ///
    /// # Errors
    ///
    /// Returns `TensorError::ShapeMismatch` if data length doesn't match shape.
    ///
    /// # Examples
    ///
    /// ```
    /// use ndgrad::Tensor;
    ///
    /// let t = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
    /// assert_eq!(t.get(&[1, 0]), Some(&2.0)); // Column-major: [1,0] is second element
    /// assert_eq!(t.get(&[0, 1]), Some(&3.0));
    /// ```
    pub fn from_vec(data: Vec<ElT>, shape: &[usize]) -> Result<Self, TensorError> {
        let expected_len: usize = shape.iter().product();
        if data.len() != expected_len {
            return Err(TensorError::ShapeMismatch {
                expected: expected_len,
                actual: data.len(),
            });
        }
        Ok(Self {
            storage: Dense::from_vec(data),
            shape: shape.to_vec(),
            strides: compute_strides(shape),
        })
    }

    /// Get the shape of the tensor.
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Get the rank (number of dimensions).
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Get total number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Check if tensor is empty (has zero elements).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Get strides.
    #[inline]
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Get underlying data as slice.
    #[inline]
    pub fn data(&self) -> &[ElT] {
        self.storage.as_slice()
    }

    /// Get underlying data as mutable slice.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [ElT] {
        self.storage.as_mut_slice()
    }

    /// Consume the tensor and return its elements in column-major order.
    pub fn into_vec(self) -> Vec<ElT> {
        self.storage.into_vec()
    }

    /// The single element of a one-element tensor.
    pub fn item(&self) -> Option<ElT> {
        match self.data() {
            [x] => Some(*x),
            _ => None,
        }
    }

    /// Get element by linear index.
    #[inline]
    pub fn get_linear(&self, i: usize) -> Option<&ElT> {
        self.storage.as_slice().get(i)
    }

    /// Get element by cartesian indices.
    ///
    /// Returns `None` if indices are out of bounds or wrong number of indices.
    pub fn get(&self, indices: &[usize]) -> Option<&ElT> {
        if indices.len() != self.ndim() {
            return None;
        }
        if indices.iter().zip(self.shape.iter()).any(|(&i, &d)| i >= d) {
            return None;
        }
        self.get_linear(cartesian_to_linear(indices, &self.strides))
    }

    /// Set element by cartesian indices.
    ///
    /// # Errors
    ///
    /// Returns error if indices are out of bounds or wrong number of indices.
    pub fn set(&mut self, indices: &[usize], value: ElT) -> Result<(), TensorError> {
        if indices.len() != self.ndim() {
            return Err(TensorError::WrongNumberOfIndices {
                expected: self.ndim(),
                actual: indices.len(),
            });
        }
        for (&idx, &dim) in indices.iter().zip(self.shape.iter()) {
            if idx >= dim {
                return Err(TensorError::IndexOutOfBounds {
                    index: idx,
                    dim_size: dim,
                });
            }
        }
        let linear = cartesian_to_linear(indices, &self.strides);
        self.storage.as_mut_slice()[linear] = value;
        Ok(())
    }

    /// Fill all elements with a value.
    pub fn fill(&mut self, value: ElT) {
        for x in self.storage.as_mut_slice() {
            *x = value;
        }
    }

    /// Reshape the tensor to a new shape (zero-copy view).
    ///
    /// # Errors
    ///
    /// Returns an error if the total number of elements doesn't match.
    ///
    /// ```
    /// use ndgrad::Tensor;
    ///
    /// let t = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
    /// let t1d = t.reshape(&[6]).unwrap();
    /// assert_eq!(t1d.shape(), &[6]);
    /// assert!(t.shares_storage_with(&t1d));
    /// ```
    pub fn reshape(&self, new_shape: &[usize]) -> Result<Self, TensorError> {
        let new_len: usize = new_shape.iter().product();
        if self.len() != new_len {
            return Err(TensorError::ShapeMismatch {
                expected: self.len(),
                actual: new_len,
            });
        }
        Ok(Self {
            storage: self.storage.view(),
            shape: new_shape.to_vec(),
            strides: compute_strides(new_shape),
        })
    }

    /// A second handle onto the same elements.
    pub fn view(&self) -> Self {
        Self {
            storage: self.storage.view(),
            shape: self.shape.clone(),
            strides: self.strides.clone(),
        }
    }

    /// Check if this tensor shares storage with another tensor.
    pub fn shares_storage_with(&self, other: &Self) -> bool {
        self.storage.shares_storage_with(&other.storage)
    }

    /// Check if this tensor's storage is shared with other tensors.
    pub fn is_view(&self) -> bool {
        self.storage.is_shared()
    }
}
