//! Local derivative rules, one per [`OpKind`].

use super::error::{GradError, GradSite};
use super::graph::{OpKind, TapeNode};
use crate::operations::{mul, scale};
use crate::tensor::DenseTensor;
use smallvec::{SmallVec, smallvec};

/// Per-input contributions of one node, in input order.
///
/// `None` for inputs that do not require gradients. Empty for a detach
/// boundary.
pub(crate) type Contributions = SmallVec<[Option<DenseTensor<f64>>; 2]>;

/// Apply the derivative rule of `node` to its upstream gradient.
///
/// `upstream` has the shape of the node's output. Contribution shapes are
/// checked by the caller against their targets.
pub(crate) fn local_gradients(
    node: &TapeNode,
    upstream: &DenseTensor<f64>,
) -> Result<Contributions, GradError> {
    let op = node.op();
    let inputs = node.inputs();
    if inputs.len() != op.arity() {
        return Err(GradError::GraphError {
            node: node.id(),
            reason: format!(
                "{} expects {} inputs, node has {}",
                op,
                op.arity(),
                inputs.len()
            ),
        });
    }
    let wanted = |i: usize| inputs[i].requires_grad();

    let grads = match op {
        OpKind::Add => smallvec![
            wanted(0).then(|| upstream.clone()),
            wanted(1).then(|| upstream.clone()),
        ],
        OpKind::Scale { factor } => smallvec![wanted(0).then(|| scale(upstream, factor))],
        OpKind::Mul => {
            let (a, b) = (inputs[0].saved(), inputs[1].saved());
            let ga = if wanted(0) { Some(mul(b, upstream)?) } else { None };
            let gb = if wanted(1) { Some(mul(a, upstream)?) } else { None };
            smallvec![ga, gb]
        }
        OpKind::Dot => {
            let u = scalar_upstream(node, upstream)?;
            let (a, b) = (inputs[0].saved(), inputs[1].saved());
            smallvec![
                wanted(0).then(|| scale(b, u)),
                wanted(1).then(|| scale(a, u)),
            ]
        }
        OpKind::Sum => {
            let u = scalar_upstream(node, upstream)?;
            smallvec![wanted(0).then(|| DenseTensor::full(inputs[0].shape(), u))]
        }
        OpKind::Norm => {
            let u = scalar_upstream(node, upstream)?;
            let n = node.output().saved().item().unwrap_or(0.0);
            if n == 0.0 {
                return Err(GradError::DivisionByZero { node: node.id(), op });
            }
            smallvec![wanted(0).then(|| scale(inputs[0].saved(), u / n))]
        }
        OpKind::Detach => SmallVec::new(),
    };
    Ok(grads)
}

fn scalar_upstream(node: &TapeNode, upstream: &DenseTensor<f64>) -> Result<f64, GradError> {
    upstream.item().ok_or_else(|| GradError::ShapeError {
        site: GradSite::node(node),
        expected: node.output().shape().to_vec(),
        actual: upstream.shape().to_vec(),
    })
}
