//! Scalar trait for tensor element types.

use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// Trait for scalar types supported by ndgrad.
///
/// This trait wraps num-traits' `Float` with the additional bounds required
/// for tensor storage. Identities, `sqrt` and `abs` come from `Float`.
pub trait Scalar: Float + FromPrimitive + Debug + Default + 'static {}

impl Scalar for f64 {}

impl Scalar for f32 {}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::{One, ToPrimitive, Zero};

    fn identities<T: Scalar>() -> (T, T) {
        (T::zero(), T::one())
    }

    #[test]
    fn test_zero_one() {
        assert_eq!(identities::<f64>(), (0.0, 1.0));
        assert_eq!(identities::<f32>(), (0.0, 1.0));
        assert!(f64::zero().is_zero());
        assert!(f32::one().is_one());
    }

    #[test]
    fn test_float_ops_through_scalar() {
        fn hypot<T: Scalar>(a: T, b: T) -> T {
            (a * a + b * b).sqrt()
        }
        assert_eq!(hypot(3.0_f64, 4.0), 5.0);
        assert_eq!(hypot(-3.0_f32, 4.0).abs(), 5.0);
    }

    #[test]
    fn test_f64_roundtrip_through_f32() {
        let x = <f32 as FromPrimitive>::from_f64(0.5).unwrap();
        assert_eq!(x.to_f64(), Some(0.5));
    }
}
