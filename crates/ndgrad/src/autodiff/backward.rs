//! Backward pass execution for reverse-mode automatic differentiation.

use super::error::{GradError, GradSite};
use super::gradients::Gradients;
use super::graph::{NodeId, NodeRef, TapeId, TapeNode};
use super::rules::local_gradients;
use super::tensor::{GradCell, GradSlot, TrackedTensor, ValueId};
use crate::tensor::DenseTensor;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::rc::{Rc, Weak};
use tracing::{debug, instrument};

/// Execute the backward pass rooted at `root`.
///
/// Walks every tape node reachable from `root` in reverse topological order,
/// applies each node's derivative rule and adds the resulting gradients into
/// the gradient slots of every reached value that requires gradients.
/// Slots are never reset here: run [`TrackedTensor::zero_grad`] between
/// independent passes.
///
/// # Arguments
/// * `root` - The value to differentiate
/// * `seed` - Upstream gradient for `root`; defaults to ones when `root` has
///   exactly one element
///
/// # Returns
/// The gradients this pass contributed, keyed by value.
///
/// # Errors
/// - `UntrackedRoot` if no tape node produced `root`
/// - `ShapeError` for a missing seed on a non-scalar root, a seed of the
///   wrong shape, or a rule whose output does not fit its input
/// - `GraphError` for a cycle, a dropped tape or a missing node
/// - `DivisionByZero` when differentiating the norm of a zero tensor
///
/// On error no gradient slot is modified.
///
/// # Example
///
/// ```
/// use ndgrad::Tensor;
/// use ndgrad::autodiff::{Tape, TrackedTensor, backward};
///
/// let tape = Tape::new();
/// let x = TrackedTensor::leaf(Tensor::from_vec(vec![1.0, 2.0, 3.0], &[3]).unwrap());
/// let y = tape.mul(&x, &x).unwrap();
///
/// // Non-scalar root: the seed is mandatory.
/// let seed = TrackedTensor::new(Tensor::ones(&[3]));
/// let grads = backward(&y, Some(&seed)).unwrap();
///
/// assert_eq!(x.grad().unwrap().data(), &[2.0, 4.0, 6.0]);
/// assert_eq!(grads.get(x.id()).unwrap().data(), &[2.0, 4.0, 6.0]);
/// ```
#[instrument(level = "debug", skip_all, fields(root = %root.id()))]
pub fn backward(root: &TrackedTensor, seed: Option<&TrackedTensor>) -> Result<Gradients, GradError> {
    let root_ref = root.node().ok_or_else(|| GradError::UntrackedRoot {
        shape: root.shape().to_vec(),
    })?;
    let seed = resolve_seed(root, seed)?;

    let trace = Trace::collect(root_ref)?;
    let order = toposort(&trace.graph, None).map_err(|cycle| {
        let node = &trace.graph[cycle.node_id()];
        GradError::GraphError {
            node: node.id(),
            reason: format!("cycle through a {} node", node.op()),
        }
    })?;
    debug!(nodes = order.len(), "collected trace");

    let mut gradients = Gradients::new();
    gradients.accumulate(root.id(), seed)?;

    for index in order {
        let node = &trace.graph[index];
        let Some(upstream) = gradients.get(node.output().value_id()).cloned() else {
            continue;
        };
        let contributions = local_gradients(node, &upstream)?;
        for (input, grad) in node.inputs().iter().zip(contributions) {
            let Some(grad) = grad else { continue };
            if grad.shape() != input.shape() {
                return Err(GradError::ShapeError {
                    site: GradSite::node(node),
                    expected: input.shape().to_vec(),
                    actual: grad.shape().to_vec(),
                });
            }
            gradients.accumulate(input.value_id(), grad)?;
        }
    }

    let mut slots = trace.slots;
    if root.requires_grad() {
        slots.insert(root.id(), Rc::downgrade(root.grad_cell()));
    }
    commit(&gradients, &slots)?;
    debug!(values = gradients.len(), "gradients committed");

    Ok(gradients)
}

fn resolve_seed(
    root: &TrackedTensor,
    seed: Option<&TrackedTensor>,
) -> Result<DenseTensor<f64>, GradError> {
    match seed {
        Some(seed) if seed.shape() != root.shape() => Err(GradError::ShapeError {
            site: GradSite::Seed,
            expected: root.shape().to_vec(),
            actual: seed.shape().to_vec(),
        }),
        Some(seed) => Ok(seed.tensor().clone()),
        None if root.len() == 1 => Ok(DenseTensor::ones(root.shape())),
        None => Err(GradError::ShapeError {
            site: GradSite::ImplicitSeed,
            expected: root.shape().to_vec(),
            actual: Vec::new(),
        }),
    }
}

/// Nodes reachable from a root, with edges from consumer to producer.
struct Trace {
    graph: DiGraph<Rc<TapeNode>, ()>,
    /// Gradient slots of every input that requires gradients.
    slots: HashMap<ValueId, Weak<GradCell>>,
}

impl Trace {
    /// Depth-first discovery from `root`, following producers of inputs that
    /// require gradients. Producers may live on other tapes.
    fn collect(root: &NodeRef) -> Result<Self, GradError> {
        let mut graph = DiGraph::new();
        let mut slots = HashMap::new();
        let mut seen: HashMap<(TapeId, NodeId), NodeIndex> = HashMap::new();

        let start = graph.add_node(root.resolve()?);
        seen.insert(root.key(), start);
        let mut stack = vec![start];

        while let Some(consumer) = stack.pop() {
            let node = Rc::clone(&graph[consumer]);
            for input in node.inputs() {
                let Some(cell) = input.grad_cell() else { continue };
                slots.entry(input.value_id()).or_insert_with(|| cell.clone());

                let Some(producer) = input.producer() else { continue };
                let index = match seen.entry(producer.key()) {
                    Entry::Occupied(entry) => *entry.get(),
                    Entry::Vacant(entry) => {
                        let index = graph.add_node(producer.resolve()?);
                        stack.push(index);
                        *entry.insert(index)
                    }
                };
                graph.update_edge(consumer, index, ());
            }
        }

        Ok(Self { graph, slots })
    }
}

/// Add every gradient into its value's slot, all or nothing.
///
/// Values that were dropped since the forward pass are skipped.
fn commit(
    gradients: &Gradients,
    slots: &HashMap<ValueId, Weak<GradCell>>,
) -> Result<(), GradError> {
    let mut staged: Vec<(Rc<GradCell>, GradSlot)> = Vec::with_capacity(gradients.len());
    for (&id, grad) in gradients.iter() {
        let Some(cell) = slots.get(&id).and_then(Weak::upgrade) else {
            continue;
        };
        let updated = {
            let slot = cell.borrow();
            if let GradSlot::Accumulated(existing) = &*slot {
                if existing.shape() != grad.shape() {
                    return Err(GradError::ShapeError {
                        site: GradSite::Value { id },
                        expected: existing.shape().to_vec(),
                        actual: grad.shape().to_vec(),
                    });
                }
            }
            slot.accumulated_with(grad)?
        };
        staged.push((cell, updated));
    }

    for (cell, updated) in staged {
        *cell.borrow_mut() = updated;
    }
    Ok(())
}
