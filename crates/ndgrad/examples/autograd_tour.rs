//! Walkthrough of reverse-mode differentiation with an explicit tape.
//!
//! Run with `cargo run --example autograd_tour`.

use ndgrad::Tensor;
use ndgrad::autodiff::{Tape, TrackedTensor, value};
use ndgrad::operations::scale;
use rand::Rng;
use std::error::Error;

/// Doubles `a` until its norm reaches 1000; scales by 100 unless the result
/// is positive. Which nodes exist depends on the value of `a`.
fn f(tape: &Tape, a: &TrackedTensor) -> TrackedTensor {
    let mut b = tape.scale(a, 2.0);
    while tape.norm(&b).item().unwrap_or(0.0) < 1000.0 {
        b = tape.scale(&b, 2.0);
    }
    if tape.sum(&b).item().unwrap_or(0.0) > 0.0 {
        b
    } else {
        tape.scale(&b, 100.0)
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    println!("=== Autograd Tour ===");

    let x = value(Tensor::arange(4), true);
    println!("x          = {:?}", x.data());
    println!("x.grad     = {:?}", x.grad().map(|g| g.into_vec()));

    // y = 2 <x, x>
    let tape = Tape::new();
    let y = tape.scale(&tape.dot(&x, &x)?, 2.0);
    println!("y          = {:?}", y.item());
    y.backward(None)?;
    let grad = x.grad().ok_or("x has no gradient")?;
    println!("x.grad     = {:?}", grad.data());
    println!("grad == 4x : {}", grad == scale(x.tensor(), 4.0));

    // y = sum(x)
    x.zero_grad();
    let tape = Tape::new();
    tape.sum(&x).backward(None)?;
    println!();
    println!("sum(x)     -> x.grad = {:?}", x.grad().map(|g| g.into_vec()));

    // y = x * x, reduced before backward
    x.zero_grad();
    let tape = Tape::new();
    let y = tape.mul(&x, &x)?;
    tape.sum(&y).backward(None)?;
    println!("sum(x * x) -> x.grad = {:?}", x.grad().map(|g| g.into_vec()));

    // u is treated as a constant
    x.zero_grad();
    let tape = Tape::new();
    let y = tape.mul(&x, &x)?;
    let u = y.detach();
    let z = tape.mul(&u, &x)?;
    tape.sum(&z).backward(None)?;
    println!();
    println!("z = u * x with u = detach(x * x)");
    println!("x.grad == u     : {}", x.grad().as_ref() == Some(u.tensor()));

    x.zero_grad();
    tape.sum(&y).backward(None)?;
    println!(
        "x.grad == 2x    : {}",
        x.grad() == Some(scale(x.tensor(), 2.0))
    );

    // Control flow decides the trace.
    // Nonzero, so the doubling loop terminates.
    let mut rng = rand::rng();
    let magnitude: f64 = rng.random_range(0.05..2.0);
    let sign = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
    let a = value(Tensor::scalar(sign * magnitude), true);
    let tape = Tape::new();
    let d = f(&tape, &a);
    d.backward(None)?;
    let (a_val, d_val) = (a.item().unwrap_or(0.0), d.item().unwrap_or(0.0));
    let a_grad = a.grad().and_then(|g| g.item()).unwrap_or(0.0);
    println!();
    println!("a = {a_val:.6}, f(a) = {d_val:.3}, tape nodes = {}", tape.len());
    println!("a.grad = {a_grad}, f(a) / a = {}", d_val / a_val);

    Ok(())
}
