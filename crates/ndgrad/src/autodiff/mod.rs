//! Reverse-mode automatic differentiation over dense `f64` tensors.
//!
//! Operations run eagerly on a [`Tape`], which records one [`TapeNode`] per
//! operation whose inputs require gradients. [`backward`] walks the nodes
//! reachable from a root value in reverse topological order and adds the
//! resulting gradients into each value's gradient slot.
//!
//! # Architecture
//!
//! ```text
//! TrackedTensor ──NodeRef (weak)──►  Tape ──owns──► Vec<Rc<TapeNode>>
//!      │                                               │
//!      ▼                                               ▼
//! Rc<RefCell<GradSlot>>  ◄──weak──  Operand / NodeOutput (SavedTensor)
//! ```
//!
//! # Example
//!
//! ```
//! use ndgrad::Tensor;
//! use ndgrad::autodiff::{Tape, TrackedTensor};
//!
//! let x = TrackedTensor::leaf(Tensor::arange(4));
//!
//! // y = 2 * <x, x>
//! let tape = Tape::new();
//! let y = tape.scale(&tape.dot(&x, &x).unwrap(), 2.0);
//! y.backward(None).unwrap();
//! assert_eq!(x.grad().unwrap().data(), &[0.0, 4.0, 8.0, 12.0]);
//!
//! // Gradients accumulate until reset.
//! x.zero_grad();
//! let tape = Tape::new();
//! tape.sum(&x).backward(None).unwrap();
//! assert_eq!(x.grad().unwrap().data(), &[1.0, 1.0, 1.0, 1.0]);
//! ```
//!
//! # Design Notes
//!
//! - One tape per forward evaluation; tracing is define-by-run, so ordinary
//!   Rust control flow decides which nodes exist
//! - Values hold weak references to the tape; dropping the tape invalidates
//!   backward passes through its nodes
//! - Everything is `Rc`-based and single-threaded
//! - Backward is all-or-nothing: errors leave every gradient slot unchanged

mod backward;
mod error;
mod gradients;
mod graph;
mod ops;
mod rules;
mod saved_tensor;
mod tensor;

pub use backward::backward;
pub use error::{GradError, GradSite};
pub use gradients::Gradients;
pub use graph::{
    GradMode, NodeId, NodeOutput, NodeRef, OpKind, Operand, Tape, TapeConfig, TapeId, TapeNode,
};
pub use saved_tensor::SavedTensor;
pub use tensor::{GradSlot, TrackedTensor, ValueId, value};
