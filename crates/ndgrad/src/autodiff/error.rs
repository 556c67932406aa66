//! Errors raised by the backward pass.

use super::graph::{NodeId, OpKind, TapeNode};
use super::tensor::ValueId;
use crate::error::TensorError;
use std::fmt;
use thiserror::Error;

/// Where in a backward pass an error was detected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GradSite {
    /// The default seed of ones, used when `backward` gets no seed.
    ImplicitSeed,
    /// A seed supplied by the caller.
    Seed,
    /// A tape node's derivative rule.
    Node { id: NodeId, op: OpKind },
    /// The gradient slot of a tracked value.
    Value { id: ValueId },
}

impl GradSite {
    pub(crate) fn node(node: &TapeNode) -> Self {
        Self::Node {
            id: node.id(),
            op: node.op(),
        }
    }
}

impl fmt::Display for GradSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ImplicitSeed => f.write_str("implicit seed (non-scalar roots need an explicit seed)"),
            Self::Seed => f.write_str("seed"),
            Self::Node { id, op } => write!(f, "node {} ({})", id, op),
            Self::Value { id } => write!(f, "gradient slot of {}", id),
        }
    }
}

/// Errors that can occur while differentiating.
///
/// Every variant is returned before any gradient slot is written, so a failed
/// backward pass leaves all gradients as they were.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GradError {
    /// A gradient's shape does not match the value it flows into.
    #[error("shape error at {site}: expected {expected:?}, got {actual:?}")]
    ShapeError {
        site: GradSite,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// The trace is malformed: a cycle, a dropped tape or a missing node.
    #[error("graph error at node {node}: {reason}")]
    GraphError { node: NodeId, reason: String },

    /// `backward` on a value that no tape node produced.
    #[error("backward() called on an untracked value of shape {shape:?}")]
    UntrackedRoot { shape: Vec<usize> },

    /// Singular derivative, e.g. the norm of a zero vector.
    #[error("division by zero in the {op} rule at node {node}")]
    DivisionByZero { node: NodeId, op: OpKind },

    /// Tensor arithmetic failure inside a derivative rule.
    #[error(transparent)]
    Tensor(#[from] TensorError),
}
