//! TrackedTensor - Tensor with gradient tracking for automatic differentiation.

use super::backward::backward;
use super::error::GradError;
use super::gradients::Gradients;
use super::graph::NodeRef;
use crate::error::TensorError;
use crate::operations::add;
use crate::tensor::DenseTensor;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter for value identities.
static NEXT_VALUE_ID: AtomicU64 = AtomicU64::new(0);

/// Identity of a tracked value.
///
/// Clones of a [`TrackedTensor`] keep the id; `detach` and every operation
/// produce a fresh one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(u64);

impl ValueId {
    fn next() -> Self {
        Self(NEXT_VALUE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw id.
    pub fn index(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// State of a value's accumulated gradient.
///
/// `Absent → Zeroed → Accumulated → Accumulated(+= ...)`. Backward passes only
/// ever add; [`TrackedTensor::zero_grad`] is the one way back to `Zeroed`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum GradSlot {
    /// No backward pass has reached the value yet.
    #[default]
    Absent,
    /// Explicitly reset; reads as zeros of the value's shape.
    Zeroed,
    /// Sum of every gradient delivered since the last reset.
    Accumulated(DenseTensor<f64>),
}

impl GradSlot {
    /// The slot after adding `grad` to it.
    pub(crate) fn accumulated_with(&self, grad: &DenseTensor<f64>) -> Result<Self, TensorError> {
        match self {
            Self::Absent | Self::Zeroed => Ok(Self::Accumulated(grad.clone())),
            Self::Accumulated(existing) => Ok(Self::Accumulated(add(existing, grad)?)),
        }
    }
}

pub(crate) type GradCell = RefCell<GradSlot>;

/// A tensor that tracks gradients for automatic differentiation.
///
/// This is the main user-facing type for AD operations. It wraps a
/// `DenseTensor<f64>`, owns a gradient slot, and optionally links back to
/// the tape node that produced it.
///
/// # Example
///
/// ```
/// use ndgrad::Tensor;
/// use ndgrad::autodiff::{Tape, TrackedTensor};
///
/// let x = TrackedTensor::leaf(Tensor::arange(4));
/// let tape = Tape::new();
/// let y = tape.dot(&x, &x).unwrap();
/// let y = tape.scale(&y, 2.0);
///
/// y.backward(None).unwrap();
/// assert_eq!(x.grad().unwrap().data(), &[0.0, 4.0, 8.0, 12.0]);
/// ```
#[derive(Debug, Clone)]
pub struct TrackedTensor {
    /// The underlying tensor data.
    tensor: DenseTensor<f64>,
    id: ValueId,
    /// Whether this tensor requires gradient.
    requires_grad: bool,
    /// Shared by clones of this value.
    grad: Rc<GradCell>,
    /// Producing node (None for leaves and detached values).
    node: Option<NodeRef>,
}

/// Create a tracked value.
///
/// Shorthand for [`TrackedTensor::with_requires_grad`].
pub fn value(data: DenseTensor<f64>, requires_grad: bool) -> TrackedTensor {
    TrackedTensor::with_requires_grad(data, requires_grad)
}

impl TrackedTensor {
    /// Create a tracked tensor that does not require gradient.
    pub fn new(tensor: DenseTensor<f64>) -> Self {
        Self {
            tensor,
            id: ValueId::next(),
            requires_grad: false,
            grad: Rc::new(RefCell::new(GradSlot::Absent)),
            node: None,
        }
    }

    /// Create a leaf tensor that requires gradient.
    pub fn leaf(tensor: DenseTensor<f64>) -> Self {
        Self {
            requires_grad: true,
            ..Self::new(tensor)
        }
    }

    /// Create with explicit requires_grad flag.
    pub fn with_requires_grad(tensor: DenseTensor<f64>, requires_grad: bool) -> Self {
        if requires_grad {
            Self::leaf(tensor)
        } else {
            Self::new(tensor)
        }
    }

    /// Turn gradient tracking on or off.
    ///
    /// Only operations recorded afterwards see the change.
    pub fn set_requires_grad(&mut self, requires_grad: bool) {
        self.requires_grad = requires_grad;
    }

    /// Get the underlying tensor.
    pub fn tensor(&self) -> &DenseTensor<f64> {
        &self.tensor
    }

    /// Identity shared by clones of this value.
    pub fn id(&self) -> ValueId {
        self.id
    }

    /// Get node reference if an operation recorded on a tape produced this value.
    pub fn node(&self) -> Option<&NodeRef> {
        self.node.as_ref()
    }

    /// True for values no tape node produced.
    pub fn is_leaf(&self) -> bool {
        self.node.is_none()
    }

    /// Check if this tensor requires gradient.
    pub fn requires_grad(&self) -> bool {
        self.requires_grad
    }

    /// Get shape.
    pub fn shape(&self) -> &[usize] {
        self.tensor.shape()
    }

    /// Get number of dimensions.
    pub fn ndim(&self) -> usize {
        self.tensor.ndim()
    }

    /// Get total number of elements.
    pub fn len(&self) -> usize {
        self.tensor.len()
    }

    /// Check if tensor is empty.
    pub fn is_empty(&self) -> bool {
        self.tensor.is_empty()
    }

    /// Get data slice.
    pub fn data(&self) -> &[f64] {
        self.tensor.data()
    }

    /// The single element of a one-element value.
    pub fn item(&self) -> Option<f64> {
        self.tensor.item()
    }

    /// Accumulated gradient, or `None` while the slot is `Absent`.
    ///
    /// A `Zeroed` slot reads as zeros of this value's shape.
    pub fn grad(&self) -> Option<DenseTensor<f64>> {
        match &*self.grad.borrow() {
            GradSlot::Absent => None,
            GradSlot::Zeroed => Some(DenseTensor::zeros(self.shape())),
            GradSlot::Accumulated(g) => Some(g.clone()),
        }
    }

    /// Current state of the gradient slot.
    pub fn grad_slot(&self) -> GradSlot {
        self.grad.borrow().clone()
    }

    /// Reset the gradient slot to `Zeroed`.
    ///
    /// Backward passes add into the slot, so call this between independent
    /// passes over the same leaves.
    pub fn zero_grad(&self) {
        *self.grad.borrow_mut() = GradSlot::Zeroed;
    }

    /// Detach from the computation graph.
    ///
    /// Returns a new value viewing the same elements, with gradient tracking
    /// disabled, no producing node and its own (absent) gradient slot.
    pub fn detach(&self) -> Self {
        Self::new(self.tensor.view())
    }

    /// Run the backward pass rooted at this value.
    ///
    /// See [`backward`](super::backward()) for seed rules and errors. Gradients
    /// are added into every reached slot; nothing is reset first.
    pub fn backward(&self, seed: Option<&TrackedTensor>) -> Result<Gradients, GradError> {
        backward(self, seed)
    }

    pub(crate) fn grad_cell(&self) -> &Rc<GradCell> {
        &self.grad
    }

    /// Point the back-reference at the node that produced this value.
    pub(crate) fn link(&mut self, node: NodeRef) {
        self.node = Some(node);
        self.requires_grad = true;
    }
}
