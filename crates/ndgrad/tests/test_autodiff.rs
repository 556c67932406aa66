//! Integration tests for autodiff module.
//!
//! Tests backward-mode automatic differentiation against closed-form and
//! numerical gradients.

#![cfg(feature = "autodiff")]

use approx::assert_relative_eq;
use ndgrad::Tensor;
use ndgrad::autodiff::{
    GradError, GradSite, GradSlot, OpKind, Tape, TapeConfig, TrackedTensor, value,
};
use ndgrad::operations::{dot, mul, norm, scale, sum};

/// Compute numerical gradient using central difference.
///
/// grad_i ≈ (f(x + eps*e_i) - f(x - eps*e_i)) / (2*eps)
fn numerical_gradient<F>(f: F, x: &[f64], eps: f64) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let mut grad = vec![0.0; x.len()];
    let mut x_plus = x.to_vec();
    let mut x_minus = x.to_vec();

    for i in 0..x.len() {
        x_plus[i] = x[i] + eps;
        x_minus[i] = x[i] - eps;
        grad[i] = (f(&x_plus) - f(&x_minus)) / (2.0 * eps);
        x_plus[i] = x[i];
        x_minus[i] = x[i];
    }
    grad
}

fn vector(data: &[f64]) -> Tensor<f64> {
    Tensor::from_vec(data.to_vec(), &[data.len()]).unwrap()
}

fn arange_leaf() -> TrackedTensor {
    value(Tensor::arange(4), true)
}

/// Doubles `a` until its norm reaches 1000, then scales by 100 if the result
/// is not positive.
fn doubling(tape: &Tape, a: &TrackedTensor) -> TrackedTensor {
    let mut b = tape.scale(a, 2.0);
    while tape.norm(&b).item().unwrap() < 1000.0 {
        b = tape.scale(&b, 2.0);
    }
    if tape.sum(&b).item().unwrap() > 0.0 {
        b
    } else {
        tape.scale(&b, 100.0)
    }
}

#[test]
fn test_two_dot_gradient() {
    let x = arange_leaf();
    assert!(x.grad().is_none());

    let tape = Tape::new();
    let y = tape.scale(&tape.dot(&x, &x).unwrap(), 2.0);
    assert_eq!(y.item(), Some(28.0));

    y.backward(None).unwrap();
    let expected = scale(x.tensor(), 4.0);
    assert_eq!(x.grad().unwrap(), expected);
    assert_eq!(x.grad().unwrap().data(), &[0.0, 4.0, 8.0, 12.0]);
}

#[test]
fn test_sum_gradient_is_ones() {
    let x = arange_leaf();
    x.zero_grad();

    let tape = Tape::new();
    tape.sum(&x).backward(None).unwrap();
    assert_eq!(x.grad().unwrap().data(), &[1.0; 4]);
}

#[test]
fn test_square_then_sum() {
    let x = arange_leaf();
    let tape = Tape::new();
    let y = tape.mul(&x, &x).unwrap();
    tape.sum(&y).backward(None).unwrap();
    assert_eq!(x.grad().unwrap().data(), &[0.0, 2.0, 4.0, 6.0]);
}

#[test]
fn test_explicit_seed_matches_sum() {
    let x = arange_leaf();
    let tape = Tape::new();
    let y = tape.mul(&x, &x).unwrap();

    let ones = TrackedTensor::new(Tensor::ones(&[4]));
    y.backward(Some(&ones)).unwrap();
    assert_eq!(x.grad().unwrap().data(), &[0.0, 2.0, 4.0, 6.0]);
}

#[test]
fn test_detach_blocks_gradient() {
    let x = arange_leaf();
    let tape = Tape::new();
    let y = tape.mul(&x, &x).unwrap();
    let u = y.detach();
    let z = tape.mul(&u, &x).unwrap();

    x.zero_grad();
    tape.sum(&z).backward(None).unwrap();
    assert_eq!(x.grad().unwrap().data(), u.data());
    assert!(u.grad().is_none());

    // The same trace supports another pass through y.
    x.zero_grad();
    tape.sum(&y).backward(None).unwrap();
    assert_eq!(x.grad().unwrap(), scale(x.tensor(), 2.0));
}

#[test]
fn test_tape_detach_matches_value_detach() {
    let x = arange_leaf();
    let tape = Tape::new();
    let y = tape.mul(&x, &x).unwrap();
    let u = tape.detach(&y);
    let z = tape.mul(&u, &x).unwrap();

    assert_eq!(tape.nodes()[1].op(), OpKind::Detach);
    tape.sum(&z).backward(None).unwrap();
    assert_eq!(x.grad().unwrap().data(), &[0.0, 1.0, 4.0, 9.0]);
    assert!(y.grad().is_none());
}

#[test]
fn test_detach_is_idempotent() {
    let x = arange_leaf();
    let once = x.detach();
    let twice = once.detach();

    assert_eq!(once.data(), twice.data());
    assert!(!once.requires_grad() && !twice.requires_grad());
    assert!(once.node().is_none() && twice.node().is_none());
}

#[test]
fn test_gradients_accumulate_without_zeroing() {
    let x = arange_leaf();

    let tape = Tape::new();
    tape.sum(&x).backward(None).unwrap();
    let tape = Tape::new();
    tape.sum(&x).backward(None).unwrap();
    assert_eq!(x.grad().unwrap().data(), &[2.0; 4]);

    x.zero_grad();
    assert_eq!(x.grad_slot(), GradSlot::Zeroed);
    let tape = Tape::new();
    tape.sum(&x).backward(None).unwrap();
    assert_eq!(x.grad().unwrap().data(), &[1.0; 4]);
}

#[test]
fn test_repeated_backward_on_same_root() {
    let x = value(vector(&[1.0, 2.0]), true);
    let tape = Tape::new();
    let y = tape.dot(&x, &x).unwrap();

    y.backward(None).unwrap();
    y.backward(None).unwrap();
    assert_eq!(x.grad().unwrap().data(), &[4.0, 8.0]);
    assert_eq!(y.grad().unwrap().data(), &[2.0]);
}

#[test]
fn test_doubling_gradient_positive() {
    for start in [0.75, 1.0, 3.0, 0.001] {
        let a = value(Tensor::scalar(start), true);
        let tape = Tape::new();
        let d = doubling(&tape, &a);

        d.backward(None).unwrap();
        let grad = a.grad().unwrap().item().unwrap();
        assert_eq!(grad, d.item().unwrap() / start);
        assert_eq!(grad, 2f64.powi(grad.log2().round() as i32));
    }
}

#[test]
fn test_doubling_gradient_negative() {
    for start in [-0.3, -1.7, -250.0] {
        let a = value(Tensor::scalar(start), true);
        let tape = Tape::new();
        let d = doubling(&tape, &a);

        d.backward(None).unwrap();
        let grad = a.grad().unwrap().item().unwrap();
        assert_eq!(grad, d.item().unwrap() / start);
        assert!(grad >= 200.0);
    }
}

#[test]
fn test_numerical_gradient_mul_dot_norm_chain() {
    // f(x) = norm(x * w) + 3 * <x, w>
    let w = vector(&[0.5, -1.5, 2.0]);
    let x_data = vec![1.0, 2.0, -0.5];

    let f = |x: &[f64]| -> f64 {
        let x = vector(x);
        norm(&mul(&x, &w).unwrap()) + 3.0 * dot(&x, &w).unwrap()
    };
    let numerical = numerical_gradient(f, &x_data, 1e-6);

    let x = value(vector(&x_data), true);
    let w = value(w.clone(), false);
    let tape = Tape::new();
    let n = tape.norm(&tape.mul(&x, &w).unwrap());
    let d = tape.scale(&tape.dot(&x, &w).unwrap(), 3.0);
    let loss = tape.add(&n, &d).unwrap();

    let grads = loss.backward(None).unwrap();
    for (analytical, numerical) in x.grad().unwrap().data().iter().zip(numerical.iter()) {
        assert_relative_eq!(analytical, numerical, epsilon = 1e-6);
    }
    assert!(grads.get(w.id()).is_none());
    assert!(w.grad().is_none());
}

#[test]
fn test_numerical_gradient_matrix_sum() {
    // f(A, B) = sum(A * B * A)
    let a_data: Vec<f64> = (1..=6).map(|v| v as f64 * 0.3).collect();
    let b_data: Vec<f64> = (1..=6).map(|v| 1.0 - v as f64 * 0.2).collect();

    let loss_a = |a: &[f64]| -> f64 {
        let a = Tensor::from_vec(a.to_vec(), &[2, 3]).unwrap();
        let b = Tensor::from_vec(b_data.clone(), &[2, 3]).unwrap();
        sum(&mul(&mul(&a, &b).unwrap(), &a).unwrap())
    };
    let numerical = numerical_gradient(loss_a, &a_data, 1e-6);

    let a = TrackedTensor::leaf(Tensor::from_vec(a_data.clone(), &[2, 3]).unwrap());
    let b = TrackedTensor::leaf(Tensor::from_vec(b_data.clone(), &[2, 3]).unwrap());
    let tape = Tape::new();
    let ab = tape.mul(&a, &b).unwrap();
    tape.sum(&tape.mul(&ab, &a).unwrap()).backward(None).unwrap();

    let grad_a = a.grad().unwrap();
    assert_eq!(grad_a.shape(), &[2, 3]);
    for (analytical, numerical) in grad_a.data().iter().zip(numerical.iter()) {
        assert_relative_eq!(analytical, numerical, epsilon = 1e-6);
    }
    // d/dB = A * A
    assert_eq!(b.grad().unwrap(), mul(a.tensor(), a.tensor()).unwrap());
}

#[test]
fn test_no_grad_mode_records_nothing() {
    let x = arange_leaf();
    let tape = Tape::with_config(TapeConfig::no_grad());
    let y = tape.sum(&tape.mul(&x, &x).unwrap());

    assert_eq!(y.item(), Some(14.0));
    assert!(tape.is_empty());
    assert_eq!(
        y.backward(None).unwrap_err(),
        GradError::UntrackedRoot { shape: vec![] }
    );
}

#[test]
fn test_errors_leave_gradients_unchanged() {
    let x = value(vector(&[1.0, 2.0]), true);

    let tape = Tape::new();
    tape.sum(&x).backward(None).unwrap();
    let before = x.grad_slot();

    // Missing seed on a non-scalar root.
    let y = tape.scale(&x, 2.0);
    assert!(matches!(
        y.backward(None),
        Err(GradError::ShapeError { .. })
    ));

    // Seed of the wrong shape.
    let seed = TrackedTensor::new(Tensor::ones(&[2, 1]));
    assert!(matches!(
        y.backward(Some(&seed)),
        Err(GradError::ShapeError { .. })
    ));

    // Norm of a zero vector.
    let z = tape.norm(&tape.scale(&x, 0.0));
    assert!(matches!(
        z.backward(None),
        Err(GradError::DivisionByZero { op: OpKind::Norm, .. })
    ));

    assert_eq!(x.grad_slot(), before);
    assert_eq!(y.grad_slot(), GradSlot::Absent);
}

#[test]
fn test_untracked_root() {
    let c = value(vector(&[1.0, 2.0]), false);
    let tape = Tape::new();
    let y = tape.sum(&c);

    assert!(!y.requires_grad());
    assert_eq!(
        y.backward(None).unwrap_err(),
        GradError::UntrackedRoot { shape: vec![] }
    );
}

#[test]
fn test_dropped_tape_is_graph_error() {
    let x = arange_leaf();
    let y = {
        let tape = Tape::new();
        tape.sum(&x)
    };
    assert!(!y.node().unwrap().is_alive());
    assert!(matches!(
        y.backward(None),
        Err(GradError::GraphError { .. })
    ));
    assert!(x.grad().is_none());
}

#[test]
fn test_returned_tape_clone_keeps_graph_alive() {
    fn doubled_sum(x: &TrackedTensor) -> (Tape, TrackedTensor) {
        let tape = Tape::new();
        let y = tape.sum(&tape.scale(x, 2.0));
        (tape.clone(), y)
    }

    let x = arange_leaf();
    let (tape, y) = doubled_sum(&x);
    assert!(y.node().unwrap().is_alive());
    assert_eq!(tape.len(), 2);
    y.backward(None).unwrap();
    assert_eq!(x.grad().unwrap().data(), &[2.0, 2.0, 2.0, 2.0]);
}

#[test]
fn test_error_message_names_operation() {
    let x = value(vector(&[0.0, 0.0]), true);
    let tape = Tape::new();
    let err = tape.norm(&x).backward(None).unwrap_err();
    assert_eq!(err.to_string(), "division by zero in the norm rule at node #0");
}

#[test]
fn test_rule_output_shape_mismatch() {
    let x = value(vector(&[1.0, 2.0]), true);
    x.zero_grad();

    // A scale node whose recorded output does not have its input's shape.
    let tape = Tape::new();
    let mut y = TrackedTensor::new(Tensor::ones(&[3]));
    let node = tape
        .record(OpKind::Scale { factor: 2.0 }, &[&x], &mut y)
        .unwrap();

    let seed = TrackedTensor::new(Tensor::ones(&[3]));
    let err = y.backward(Some(&seed)).unwrap_err();
    assert_eq!(
        err,
        GradError::ShapeError {
            site: GradSite::Node {
                id: node.id(),
                op: OpKind::Scale { factor: 2.0 },
            },
            expected: vec![2],
            actual: vec![3],
        }
    );
    assert!(err.to_string().contains("scale(2)"));
    assert_eq!(x.grad_slot(), GradSlot::Zeroed);
    assert_eq!(y.grad_slot(), GradSlot::Absent);
}
