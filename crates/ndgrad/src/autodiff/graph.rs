//! Computation trace (tape) for reverse-mode automatic differentiation.
//!
//! A [`Tape`] is an arena of [`TapeNode`]s appended as operations run.
//! Values link back to their producing node through a [`NodeRef`], which
//! holds only a weak reference to the tape: the tape owns its nodes, values
//! never do.

use super::error::GradError;
use super::saved_tensor::SavedTensor;
use super::tensor::{GradCell, TrackedTensor, ValueId};
use crate::tensor::DenseTensor;
use smallvec::{SmallVec, smallvec};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

static NEXT_TAPE_ID: AtomicU64 = AtomicU64::new(0);

/// Identity of a tape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TapeId(u64);

/// Index of a node within its tape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Get the internal index.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Differentiable operation kinds.
///
/// A closed set: each kind pairs a forward computation in
/// [`Tape`](Tape)'s operation methods with a derivative rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OpKind {
    /// Element-wise `a + b`.
    Add,
    /// `factor * a`.
    Scale { factor: f64 },
    /// Element-wise `a * b`.
    Mul,
    /// Inner product of two vectors.
    Dot,
    /// Sum of all elements.
    Sum,
    /// Euclidean norm.
    Norm,
    /// Gradient barrier; contributes nothing.
    Detach,
}

impl OpKind {
    /// Short lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Scale { .. } => "scale",
            Self::Mul => "mul",
            Self::Dot => "dot",
            Self::Sum => "sum",
            Self::Norm => "norm",
            Self::Detach => "detach",
        }
    }

    /// Number of inputs a node of this kind takes.
    pub fn arity(&self) -> usize {
        match self {
            Self::Add | Self::Mul | Self::Dot => 2,
            Self::Scale { .. } | Self::Sum | Self::Norm | Self::Detach => 1,
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scale { factor } => write!(f, "scale({})", factor),
            other => f.write_str(other.name()),
        }
    }
}

/// Whether operations on a tape record nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GradMode {
    /// Record nodes for inputs that require gradients.
    #[default]
    Enabled,
    /// Compute forward values only.
    Disabled,
}

/// Configuration every operation on a tape runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TapeConfig {
    pub grad_mode: GradMode,
}

impl TapeConfig {
    /// Configuration for inference-only evaluation.
    pub fn no_grad() -> Self {
        Self {
            grad_mode: GradMode::Disabled,
        }
    }
}

/// Non-owning back-reference from a value to the node that produced it.
#[derive(Clone)]
pub struct NodeRef {
    tape: Weak<TapeInner>,
    tape_id: TapeId,
    id: NodeId,
}

impl NodeRef {
    /// Get the node ID.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Identity of the tape holding the node.
    pub fn tape_id(&self) -> TapeId {
        self.tape_id
    }

    /// Check whether the owning tape still exists.
    pub fn is_alive(&self) -> bool {
        self.tape.strong_count() > 0
    }

    pub(crate) fn key(&self) -> (TapeId, NodeId) {
        (self.tape_id, self.id)
    }

    /// Look the node up on its tape.
    pub(crate) fn resolve(&self) -> Result<Rc<TapeNode>, GradError> {
        let tape = self.tape.upgrade().ok_or_else(|| GradError::GraphError {
            node: self.id,
            reason: "the tape that recorded this node was dropped".to_string(),
        })?;
        let node = tape.nodes.borrow().get(self.id.0).cloned();
        node.ok_or_else(|| GradError::GraphError {
            node: self.id,
            reason: "node is not on its tape".to_string(),
        })
    }

    /// A reference to a node that may not have been recorded yet.
    #[cfg(test)]
    pub(crate) fn new_for_test(tape: &Tape, index: usize) -> Self {
        Self {
            tape: Rc::downgrade(&tape.inner),
            tape_id: tape.inner.id,
            id: NodeId(index),
        }
    }
}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("tape_id", &self.tape_id)
            .field("id", &self.id)
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// One recorded input of a tape node.
#[derive(Debug, Clone)]
pub struct Operand {
    value: ValueId,
    producer: Option<NodeRef>,
    /// Present iff the input required gradients when recorded.
    grad: Option<Weak<GradCell>>,
    saved: SavedTensor<f64>,
}

impl Operand {
    pub(crate) fn capture(input: &TrackedTensor) -> Self {
        Self {
            value: input.id(),
            producer: input.node().cloned(),
            grad: input
                .requires_grad()
                .then(|| Rc::downgrade(input.grad_cell())),
            saved: SavedTensor::new(input.tensor()),
        }
    }

    /// Identity of the input value.
    pub fn value_id(&self) -> ValueId {
        self.value
    }

    /// Node that produced the input, if any.
    pub fn producer(&self) -> Option<&NodeRef> {
        self.producer.as_ref()
    }

    /// Whether gradients flow into this input.
    pub fn requires_grad(&self) -> bool {
        self.grad.is_some()
    }

    /// Input data as seen by the forward pass.
    pub fn saved(&self) -> &DenseTensor<f64> {
        self.saved.get()
    }

    /// Shape of the input.
    pub fn shape(&self) -> &[usize] {
        self.saved.shape()
    }

    pub(crate) fn grad_cell(&self) -> Option<&Weak<GradCell>> {
        self.grad.as_ref()
    }

    #[cfg(test)]
    pub(crate) fn with_producer(mut self, producer: NodeRef) -> Self {
        self.producer = Some(producer);
        self
    }
}

/// The value a tape node produced.
#[derive(Debug, Clone)]
pub struct NodeOutput {
    value: ValueId,
    grad: Weak<GradCell>,
    saved: SavedTensor<f64>,
}

impl NodeOutput {
    pub(crate) fn capture(output: &TrackedTensor) -> Self {
        Self {
            value: output.id(),
            grad: Rc::downgrade(output.grad_cell()),
            saved: SavedTensor::new(output.tensor()),
        }
    }

    /// Identity of the output value.
    pub fn value_id(&self) -> ValueId {
        self.value
    }

    /// Output data.
    pub fn saved(&self) -> &DenseTensor<f64> {
        self.saved.get()
    }

    /// Shape of the output.
    pub fn shape(&self) -> &[usize] {
        self.saved.shape()
    }

    pub(crate) fn grad_cell(&self) -> &Weak<GradCell> {
        &self.grad
    }
}

/// A node in the computation graph: one operation instance.
#[derive(Debug)]
pub struct TapeNode {
    id: NodeId,
    op: OpKind,
    inputs: SmallVec<[Operand; 2]>,
    output: NodeOutput,
}

impl TapeNode {
    /// Get node ID.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Operation kind.
    pub fn op(&self) -> OpKind {
        self.op
    }

    /// Inputs in operation order.
    pub fn inputs(&self) -> &[Operand] {
        &self.inputs
    }

    /// Produced value.
    pub fn output(&self) -> &NodeOutput {
        &self.output
    }
}

struct TapeInner {
    id: TapeId,
    config: TapeConfig,
    nodes: RefCell<Vec<Rc<TapeNode>>>,
}

/// The record of operations performed during one forward evaluation.
///
/// Build a fresh tape per forward pass. Clones share the same trace. A tape
/// is single-threaded; concurrent forward passes each need their own.
///
/// Tracked values link back to the tape weakly, so the tape owns its nodes.
/// A function that creates a `Tape` internally and returns only its output
/// leaves that output with a dangling producer, and `backward` on it fails
/// with [`GradError::GraphError`]. Return the tape (or a clone) alongside
/// the value, or take `&Tape` as a parameter.
///
/// ```
/// use ndgrad::DenseTensor;
/// use ndgrad::autodiff::{Tape, TrackedTensor, value};
///
/// fn total(x: &TrackedTensor) -> (Tape, TrackedTensor) {
///     let tape = Tape::new();
///     let y = tape.sum(x);
///     (tape, y)
/// }
///
/// let x = value(DenseTensor::ones(&[3]), true);
/// let (_tape, y) = total(&x);
/// y.backward(None).unwrap();
/// assert_eq!(x.grad().unwrap().data(), &[1.0, 1.0, 1.0]);
/// ```
#[derive(Clone)]
pub struct Tape {
    inner: Rc<TapeInner>,
}

impl Tape {
    /// Create an empty tape with gradient recording enabled.
    pub fn new() -> Self {
        Self::with_config(TapeConfig::default())
    }

    /// Create an empty tape with explicit configuration.
    pub fn with_config(config: TapeConfig) -> Self {
        Self {
            inner: Rc::new(TapeInner {
                id: TapeId(NEXT_TAPE_ID.fetch_add(1, Ordering::Relaxed)),
                config,
                nodes: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Identity of this tape.
    pub fn id(&self) -> TapeId {
        self.inner.id
    }

    /// Configuration operations on this tape run under.
    pub fn config(&self) -> TapeConfig {
        self.inner.config
    }

    /// Whether operations record nodes.
    pub fn grad_enabled(&self) -> bool {
        self.inner.config.grad_mode == GradMode::Enabled
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.inner.nodes.borrow().len()
    }

    /// Check if tape is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.nodes.borrow().is_empty()
    }

    /// Get node by ID.
    pub fn node(&self, id: NodeId) -> Option<Rc<TapeNode>> {
        self.inner.nodes.borrow().get(id.0).cloned()
    }

    /// All nodes in recording order.
    pub fn nodes(&self) -> Vec<Rc<TapeNode>> {
        self.inner.nodes.borrow().clone()
    }

    /// Record that `output` was computed from `inputs` by `op`.
    ///
    /// Links the output's back-reference to the new node and marks it as
    /// requiring gradients. When no input requires gradients, or the tape's
    /// grad mode is disabled, nothing is recorded and `None` is returned.
    pub fn record(
        &self,
        op: OpKind,
        inputs: &[&TrackedTensor],
        output: &mut TrackedTensor,
    ) -> Option<NodeRef> {
        if !self.grad_enabled() || !inputs.iter().any(|t| t.requires_grad()) {
            return None;
        }
        let operands = inputs.iter().map(|t| Operand::capture(t)).collect();
        let node = self.push(op, operands, NodeOutput::capture(output));
        output.link(node.clone());
        Some(node)
    }

    /// Forward result of `op`, recorded when tracking applies.
    pub(crate) fn track(
        &self,
        op: OpKind,
        inputs: &[&TrackedTensor],
        result: DenseTensor<f64>,
    ) -> TrackedTensor {
        let mut output = TrackedTensor::new(result);
        self.record(op, inputs, &mut output);
        output
    }

    /// Detach `value`, leaving a boundary node in the trace.
    ///
    /// The returned value behaves exactly like [`TrackedTensor::detach`]; the
    /// boundary node only marks in the trace where gradient flow was cut.
    pub fn detach(&self, value: &TrackedTensor) -> TrackedTensor {
        let detached = value.detach();
        if self.grad_enabled() && value.requires_grad() {
            self.push(
                OpKind::Detach,
                smallvec![Operand::capture(value)],
                NodeOutput::capture(&detached),
            );
        }
        detached
    }

    pub(crate) fn push(
        &self,
        op: OpKind,
        inputs: SmallVec<[Operand; 2]>,
        output: NodeOutput,
    ) -> NodeRef {
        let mut nodes = self.inner.nodes.borrow_mut();
        let id = NodeId(nodes.len());
        trace!(tape = self.inner.id.0, node = %id, op = %op, "recorded tape node");
        nodes.push(Rc::new(TapeNode {
            id,
            op,
            inputs,
            output,
        }));
        NodeRef {
            tape: Rc::downgrade(&self.inner),
            tape_id: self.inner.id,
            id,
        }
    }
}

impl Default for Tape {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Tape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tape")
            .field("id", &self.inner.id)
            .field("config", &self.inner.config)
            .field("num_nodes", &self.len())
            .finish()
    }
}
