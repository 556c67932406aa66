//! Multinomial sampling and Monte Carlo frequency estimates.
//!
//! The die-rolling experiment: draw counts for each face, then watch the
//! running relative frequencies settle towards the true probabilities.
//!
//! ```
//! use ndgrad::Tensor;
//! use ndgrad::probability::{Multinomial, running_estimates};
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! let fair = Tensor::full(&[6], 1.0 / 6.0);
//! let die = Multinomial::new(10, &fair).unwrap();
//!
//! let mut rng = StdRng::seed_from_u64(0);
//! let counts = die.sample_n(500, &mut rng);
//! assert_eq!(counts.shape(), &[500, 6]);
//!
//! let estimates = running_estimates(&counts).unwrap();
//! assert_eq!(estimates.shape(), &[500, 6]);
//! ```

use rand::Rng;
use rand_distr::{Binomial, Distribution};
use tracing::trace;

use crate::error::TensorError;
use crate::operations::{apply, cumsum, scale, sum, sum_axis};
use crate::tensor::DenseTensor;

/// Multinomial distribution over `k` categories with a fixed number of trials.
///
/// Samples are count vectors of length `k` (as `f64`) summing to
/// `total_count`.
#[derive(Debug, Clone, PartialEq)]
pub struct Multinomial {
    total_count: u64,
    /// Normalised to sum to one.
    probs: Vec<f64>,
    /// Last category with non-zero probability; absorbs the remaining trials.
    last_positive: usize,
}

impl Multinomial {
    /// Create a multinomial distribution.
    ///
    /// `probs` may be unnormalised weights; they are scaled to sum to one.
    ///
    /// # Errors
    ///
    /// `RankMismatch` unless `probs` is a vector, `InvalidProbabilities` if it
    /// is empty, holds a negative or non-finite entry, or sums to zero.
    pub fn new(total_count: u64, probs: &DenseTensor<f64>) -> Result<Self, TensorError> {
        if probs.ndim() != 1 {
            return Err(TensorError::RankMismatch {
                expected: 1,
                actual: probs.ndim(),
            });
        }
        if probs.is_empty() {
            return Err(TensorError::InvalidProbabilities {
                reason: "no categories".to_string(),
            });
        }
        if let Some(bad) = probs.data().iter().find(|p| !p.is_finite() || **p < 0.0) {
            return Err(TensorError::InvalidProbabilities {
                reason: format!("entry {} is negative or not finite", bad),
            });
        }
        let peak = probs.data().iter().copied().fold(0.0, f64::max);
        if peak <= 0.0 {
            return Err(TensorError::InvalidProbabilities {
                reason: "weights sum to zero".to_string(),
            });
        }

        // Relative to the largest weight first, so the total stays finite.
        let relative = apply(probs, |p| p / peak);
        let mass = sum(&relative);
        let probs: Vec<f64> = relative.data().iter().map(|p| p / mass).collect();
        let last_positive = probs
            .iter()
            .rposition(|&p| p > 0.0)
            .expect("positive mass implies a positive entry");

        Ok(Self {
            total_count,
            probs,
            last_positive,
        })
    }

    /// Number of trials per sample.
    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    /// Normalised category probabilities.
    pub fn probs(&self) -> &[f64] {
        &self.probs
    }

    /// Number of categories.
    pub fn num_categories(&self) -> usize {
        self.probs.len()
    }

    /// Draw one count vector of shape `[k]`.
    ///
    /// Uses the conditional-binomial method: category `i` receives
    /// `Binomial(remaining, p_i / remaining_mass)` of the trials left over by
    /// the categories before it.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> DenseTensor<f64> {
        let counts = self.sample_counts(rng);
        DenseTensor::from_vec(counts, &[self.num_categories()])
            .expect("one count per category")
    }

    /// Draw `n` independent count vectors, stacked into shape `[n, k]`.
    pub fn sample_n<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> DenseTensor<f64> {
        let k = self.num_categories();
        let mut data = vec![0.0; n * k];
        for row in 0..n {
            for (category, count) in self.sample_counts(rng).into_iter().enumerate() {
                // Column-major: element (row, category).
                data[row + n * category] = count;
            }
        }
        trace!(
            draws = n,
            categories = k,
            trials = self.total_count,
            "sampled multinomial batch"
        );
        DenseTensor::from_vec(data, &[n, k]).expect("n rows of k counts")
    }

    fn sample_counts<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<f64> {
        let mut counts = vec![0.0; self.probs.len()];
        let mut remaining = self.total_count;
        let mut mass = 1.0;

        for (i, &p) in self.probs.iter().enumerate() {
            if remaining == 0 {
                break;
            }
            if i == self.last_positive {
                counts[i] = remaining as f64;
                break;
            }
            let q = (p / mass).clamp(0.0, 1.0);
            let drawn = Binomial::new(remaining, q)
                .expect("probability clamped to [0, 1]")
                .sample(rng);
            counts[i] = drawn as f64;
            remaining -= drawn;
            mass -= p;
        }
        counts
    }
}

/// Counts divided by their total, giving empirical probabilities.
///
/// A zero total yields NaN entries.
pub fn relative_frequencies(counts: &DenseTensor<f64>) -> DenseTensor<f64> {
    scale(counts, 1.0 / sum(counts))
}

/// Running probability estimates from a batch of count vectors.
///
/// Given counts of shape `[n, k]`, row `r` of the result holds the relative
/// frequency of each category over the first `r + 1` batches.
///
/// # Errors
///
/// `RankMismatch` unless `counts` is a matrix.
pub fn running_estimates(counts: &DenseTensor<f64>) -> Result<DenseTensor<f64>, TensorError> {
    if counts.ndim() != 2 {
        return Err(TensorError::RankMismatch {
            expected: 2,
            actual: counts.ndim(),
        });
    }
    let rows = counts.shape()[0];

    let mut estimates = cumsum(counts, 0)?;
    let totals = sum_axis(&estimates, 1, true)?;
    let totals = totals.data().to_vec();
    for (linear, x) in estimates.data_mut().iter_mut().enumerate() {
        *x /= totals[linear % rows];
    }
    Ok(estimates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn fair_die() -> DenseTensor<f64> {
        DenseTensor::full(&[6], 1.0 / 6.0)
    }

    #[test]
    fn test_new_normalises_weights() {
        let weights = DenseTensor::from_vec(vec![1.0, 3.0], &[2]).unwrap();
        let m = Multinomial::new(4, &weights).unwrap();
        assert_relative_eq!(m.probs()[0], 0.25, epsilon = 1e-12);
        assert_relative_eq!(m.probs()[1], 0.75, epsilon = 1e-12);
        assert_eq!(m.num_categories(), 2);
        assert_eq!(m.total_count(), 4);
    }

    #[test]
    fn test_new_rejects_bad_weights() {
        let negative = DenseTensor::from_vec(vec![0.5, -0.1], &[2]).unwrap();
        assert!(matches!(
            Multinomial::new(1, &negative),
            Err(TensorError::InvalidProbabilities { .. })
        ));

        let zero: DenseTensor<f64> = DenseTensor::zeros(&[3]);
        assert!(Multinomial::new(1, &zero).is_err());

        let nan = DenseTensor::from_vec(vec![f64::NAN, 1.0], &[2]).unwrap();
        assert!(Multinomial::new(1, &nan).is_err());

        let matrix: DenseTensor<f64> = DenseTensor::ones(&[2, 2]);
        assert_eq!(
            Multinomial::new(1, &matrix),
            Err(TensorError::RankMismatch {
                expected: 1,
                actual: 2
            })
        );
    }

    #[test]
    fn test_new_accepts_huge_weights() {
        let huge = DenseTensor::from_vec(vec![1e308, 1e308, 0.0], &[3]).unwrap();
        let m = Multinomial::new(8, &huge).unwrap();
        assert_eq!(m.probs(), &[0.5, 0.5, 0.0]);

        let counts = m.sample(&mut StdRng::seed_from_u64(9));
        assert_eq!(sum(&counts), 8.0);
        assert_eq!(counts.data()[2], 0.0);
    }

    #[test]
    fn test_new_accepts_tiny_weights() {
        let tiny = DenseTensor::from_vec(vec![5e-324, 1.5e-323], &[2]).unwrap();
        let m = Multinomial::new(1, &tiny).unwrap();
        assert_relative_eq!(m.probs()[0], 0.25, epsilon = 1e-12);
        assert_relative_eq!(m.probs()[1], 0.75, epsilon = 1e-12);
    }

    #[test]
    fn test_single_trial_is_one_hot() {
        let die = Multinomial::new(1, &fair_die()).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            let s = die.sample(&mut rng);
            assert_eq!(sum(&s), 1.0);
            assert_eq!(s.data().iter().filter(|&&c| c == 1.0).count(), 1);
        }
    }

    #[test]
    fn test_zero_probability_category_never_drawn() {
        let weights = DenseTensor::from_vec(vec![0.5, 0.0, 0.5, 0.0], &[4]).unwrap();
        let m = Multinomial::new(100, &weights).unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        let batch = m.sample_n(20, &mut rng);
        for row in 0..20 {
            assert_eq!(batch.get(&[row, 1]), Some(&0.0));
            assert_eq!(batch.get(&[row, 3]), Some(&0.0));
        }
    }

    #[test]
    fn test_sample_n_rows_sum_to_total() {
        let die = Multinomial::new(10, &fair_die()).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let batch = die.sample_n(50, &mut rng);
        let totals = sum_axis(&batch, 1, false).unwrap();
        assert!(totals.data().iter().all(|&t| t == 10.0));
    }

    #[test]
    fn test_sample_n_zero_draws() {
        let die = Multinomial::new(10, &fair_die()).unwrap();
        let batch = die.sample_n(0, &mut StdRng::seed_from_u64(4));
        assert_eq!(batch.shape(), &[0, 6]);
        assert!(running_estimates(&batch).unwrap().is_empty());
    }

    #[test]
    fn test_relative_frequencies() {
        let counts = DenseTensor::from_vec(vec![1.0, 3.0], &[2]).unwrap();
        assert_eq!(relative_frequencies(&counts).data(), &[0.25, 0.75]);
    }

    #[test]
    fn test_running_estimates_small() {
        // Two batches over two categories: [[1, 3], [2, 2]].
        let counts = DenseTensor::from_vec(vec![1.0, 2.0, 3.0, 2.0], &[2, 2]).unwrap();
        let est = running_estimates(&counts).unwrap();
        assert_eq!(est.get(&[0, 0]), Some(&0.25));
        assert_eq!(est.get(&[0, 1]), Some(&0.75));
        assert_eq!(est.get(&[1, 0]), Some(&0.375));
        assert_eq!(est.get(&[1, 1]), Some(&0.625));
    }

    #[test]
    fn test_running_estimates_requires_matrix() {
        assert!(running_estimates(&fair_die()).is_err());
    }
}
