//! Tensor operations.
//!
//! Plain, untracked arithmetic on [`DenseTensor`](crate::DenseTensor). The
//! autodiff layer builds its forward passes and derivative rules on top of
//! these functions.

mod elementwise;
mod norm;
mod reduce;

pub use elementwise::{add, apply, apply_binary, div, mul, scale, sub};
pub use norm::{norm, norm_sqr};
pub use reduce::{cumsum, dot, sum, sum_axis};
