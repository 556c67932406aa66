//! Tracked tensor operations with automatic differentiation.
//!
//! Every operation is a method on [`Tape`](super::Tape): it computes the
//! forward value with [`crate::operations`] and records a node when any input
//! requires gradients.

mod arithmetic;
mod reduction;
