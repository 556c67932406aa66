//! ndgrad - dense tensors with define-by-run reverse-mode autodiff
//!
//! This crate provides a small column-major tensor layer, Monte Carlo
//! helpers for multinomial experiments and (behind the default `autodiff`
//! feature) a tape-based gradient engine.
//!
//! # Architecture
//!
//! ```text
//! Level 1: Differentiation (autodiff module)
//!     → Tape, TrackedTensor, backward
//!
//! Level 2: Untracked arithmetic (operations, probability modules)
//!     → add, mul, dot, sum, norm, cumsum, Multinomial
//!
//! Level 3: Storage (tensor, storage, strides modules)
//!     → Tensor over reference-counted Dense buffers
//! ```
//!
//! # Example
//!
//! ```
//! use ndgrad::{DenseTensor, Tensor};
//!
//! // Create a 2x3 zero-initialized tensor
//! let mut t: DenseTensor<f64> = Tensor::zeros(&[2, 3]);
//!
//! // Set and get elements
//! t.set(&[0, 1], 5.0).unwrap();
//! assert_eq!(t.get(&[0, 1]), Some(&5.0));
//!
//! // Create from data (column-major order)
//! let data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
//! let t2: DenseTensor<f64> = Tensor::from_vec(data, &[2, 3]).unwrap();
//! assert_eq!(t2.get(&[1, 0]), Some(&2.0));
//! ```

#[cfg(feature = "autodiff")]
pub mod autodiff;
pub mod error;
pub mod operations;
pub mod probability;
pub mod random;
pub mod scalar;
pub mod storage;
pub mod strides;
pub mod tensor;

pub use error::TensorError;
pub use scalar::Scalar;
pub use storage::Dense;
pub use tensor::{DenseTensor, Tensor};
