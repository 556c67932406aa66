//! Tests for multinomial sampling and running frequency estimates.
//!
//! Follows the fair-die experiment: single rolls, batches of ten rolls and
//! running estimates over 500 batches.

use approx::assert_relative_eq;
use ndgrad::Tensor;
use ndgrad::operations::{sum, sum_axis};
use ndgrad::probability::{Multinomial, relative_frequencies, running_estimates};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn fair_probs() -> Tensor<f64> {
    Tensor::full(&[6], 1.0 / 6.0)
}

#[test]
fn test_each_sample_sums_to_total_count() {
    let mut rng = StdRng::seed_from_u64(7);
    for total in [1, 10, 1000] {
        let die = Multinomial::new(total, &fair_probs()).unwrap();
        let counts = die.sample(&mut rng);
        assert_eq!(counts.shape(), &[6]);
        assert_eq!(sum(&counts), total as f64);
        assert!(counts.data().iter().all(|&c| c >= 0.0 && c.fract() == 0.0));
    }
}

#[test]
fn test_seeded_sampling_is_reproducible() {
    let die = Multinomial::new(10, &fair_probs()).unwrap();

    let first = die.sample_n(100, &mut StdRng::seed_from_u64(42));
    let second = die.sample_n(100, &mut StdRng::seed_from_u64(42));
    assert_eq!(first, second);
}

#[test]
fn test_large_sample_frequencies_near_uniform() {
    let die = Multinomial::new(60_000, &fair_probs()).unwrap();
    let counts = die.sample(&mut StdRng::seed_from_u64(11));
    let freqs = relative_frequencies(&counts);

    assert_relative_eq!(sum(&freqs), 1.0, epsilon = 1e-12);
    for &p in freqs.data() {
        assert!((p - 1.0 / 6.0).abs() < 0.01, "frequency {} too far from 1/6", p);
    }
}

#[test]
fn test_running_estimates_rows_sum_to_one() {
    let die = Multinomial::new(10, &fair_probs()).unwrap();
    let counts = die.sample_n(500, &mut StdRng::seed_from_u64(3));
    let estimates = running_estimates(&counts).unwrap();

    assert_eq!(estimates.shape(), &[500, 6]);
    let row_sums = sum_axis(&estimates, 1, false).unwrap();
    for &s in row_sums.data() {
        assert_relative_eq!(s, 1.0, epsilon = 1e-12);
    }
}

#[test]
fn test_running_estimates_converge_towards_one_sixth() {
    let die = Multinomial::new(10, &fair_probs()).unwrap();
    let counts = die.sample_n(500, &mut StdRng::seed_from_u64(5));
    let estimates = running_estimates(&counts).unwrap();

    // 5000 rolls in total: the standard error per face is about 0.005.
    for face in 0..6 {
        let last = *estimates.get(&[499, face]).unwrap();
        assert!((last - 1.0 / 6.0).abs() < 0.03, "face {} estimate {}", face, last);
    }
}

#[test]
fn test_loaded_die() {
    let weights = Tensor::from_vec(vec![0.0, 0.0, 0.0, 0.0, 0.0, 1.0], &[6]).unwrap();
    let die = Multinomial::new(10, &weights).unwrap();
    let counts = die.sample(&mut StdRng::seed_from_u64(0));
    assert_eq!(counts.data(), &[0.0, 0.0, 0.0, 0.0, 0.0, 10.0]);
}
