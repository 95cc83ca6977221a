//! The uncertain value type.
//!
//! An [`UncertainValue`] is an immutable `(mean, variance)` pair with two
//! invariants enforced at every construction site:
//!
//! - the mean is finite;
//! - the variance is finite and `>= 0`.
//!
//! Standard deviation is never stored; [`UncertainValue::std_dev`]
//! recomputes `sqrt(variance)` on each call.
//!
//! # Equality
//!
//! Equality is exact and structural: two values are equal iff both fields
//! have identical bit patterns. It identifies a specific measurement
//! result, not numeric closeness, so `0.0` and `-0.0` means compare
//! unequal. There is no ordering and no overlap-based comparison.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{UncertainError, UncertainResult};
use crate::rounding::{half_ulp_variance, RoundingSource};
use crate::saturation::saturate_variance;

/// A mean with a first-order (Gaussian) uncertainty.
///
/// # Examples
/// ```
/// use u_uncertain::UncertainValue;
/// let a = UncertainValue::new(2.0, 0.04).unwrap();
/// let b = UncertainValue::new(3.0, 0.09).unwrap();
/// let sum = (a + b).unwrap();
/// assert_eq!(sum.mean(), 5.0);
/// assert_eq!(sum.variance(), 0.13);
/// ```
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawUncertainValue"))]
pub struct UncertainValue {
    mean: f64,
    variance: f64,
}

impl UncertainValue {
    /// Creates a value from a mean and a variance.
    ///
    /// # Errors
    /// [`UncertainError::Domain`] if `mean` is NaN/infinite, or `variance`
    /// is NaN/infinite/negative.
    ///
    /// # Examples
    /// ```
    /// use u_uncertain::UncertainValue;
    /// assert!(UncertainValue::new(1.0, 0.5).is_ok());
    /// assert!(UncertainValue::new(f64::NAN, 0.5).is_err());
    /// assert!(UncertainValue::new(1.0, -0.5).is_err());
    /// ```
    pub fn new(mean: f64, variance: f64) -> UncertainResult<Self> {
        if !mean.is_finite() {
            return Err(UncertainError::Domain(format!(
                "mean must be finite, got {mean}"
            )));
        }
        if !variance.is_finite() || variance < 0.0 {
            return Err(UncertainError::Domain(format!(
                "variance must be finite and >= 0, got {variance}"
            )));
        }
        Ok(Self { mean, variance })
    }

    /// Creates a value from a mean and a standard deviation.
    ///
    /// The stored variance is `std_dev * std_dev`.
    ///
    /// # Errors
    /// [`UncertainError::Domain`] if `mean` is not finite, `std_dev` is
    /// NaN/infinite/negative, or `std_dev²` overflows.
    pub fn from_mean_std_dev(mean: f64, std_dev: f64) -> UncertainResult<Self> {
        if !std_dev.is_finite() || std_dev < 0.0 {
            return Err(UncertainError::Domain(format!(
                "standard deviation must be finite and >= 0, got {std_dev}"
            )));
        }
        Self::new(mean, std_dev * std_dev)
    }

    /// Creates a value with zero variance.
    ///
    /// # Errors
    /// [`UncertainError::Domain`] if `mean` is not finite.
    pub fn exact(mean: f64) -> UncertainResult<Self> {
        Self::new(mean, 0.0)
    }

    /// Creates a value whose variance is the half-ULP representation error
    /// of `x` at its own width.
    ///
    /// `f32` sources use the binary32 layout; integers are promoted to
    /// `f64` first. See [`crate::rounding`].
    ///
    /// # Errors
    /// [`UncertainError::Domain`] if `x` is NaN or infinite.
    ///
    /// # Examples
    /// ```
    /// use u_uncertain::UncertainValue;
    /// let v = UncertainValue::from_float(1.0_f64).unwrap();
    /// assert_eq!(v.variance(), (0.5 * f64::EPSILON).powi(2));
    ///
    /// let s = UncertainValue::from_float(1.0_f32).unwrap();
    /// assert_eq!(s.variance(), (0.5 * f32::EPSILON as f64).powi(2));
    /// ```
    pub fn from_float<T: RoundingSource>(x: T) -> UncertainResult<Self> {
        let (mean, ulp) = x.mean_and_ulp()?;
        // (ulp/2)² overflows for |x| >= 2^566; the ceiling keeps it finite.
        Self::new(mean, saturate_variance(mean, half_ulp_variance(ulp)))
    }

    /// Central estimate.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Squared uncertainty (σ²).
    pub fn variance(&self) -> f64 {
        self.variance
    }

    /// Standard deviation, `sqrt(variance)`.
    pub fn std_dev(&self) -> f64 {
        self.variance.sqrt()
    }

    /// Relative standard deviation `σ / |mean|`, or `None` when the mean
    /// is zero.
    pub fn relative_std_dev(&self) -> Option<f64> {
        if self.mean == 0.0 {
            None
        } else {
            Some(self.std_dev() / self.mean.abs())
        }
    }

    /// Returns `true` if the variance is exactly zero.
    pub fn is_exact(&self) -> bool {
        self.variance == 0.0
    }
}

impl PartialEq for UncertainValue {
    fn eq(&self, other: &Self) -> bool {
        self.mean.to_bits() == other.mean.to_bits()
            && self.variance.to_bits() == other.variance.to_bits()
    }
}

// Fields are never NaN, and equality is on bits anyway.
impl Eq for UncertainValue {}

impl Hash for UncertainValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.mean.to_bits().hash(state);
        self.variance.to_bits().hash(state);
    }
}

impl fmt::Display for UncertainValue {
    /// Formats as `mean ± std_dev`; a precision applies to both numbers.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match f.precision() {
            Some(p) => write!(f, "{:.p$} ± {:.p$}", self.mean, self.std_dev()),
            None => write!(f, "{} ± {}", self.mean, self.std_dev()),
        }
    }
}

impl std::ops::Neg for UncertainValue {
    type Output = Self;

    /// Negates the mean; the variance is unchanged. Cannot fail.
    fn neg(self) -> Self {
        Self {
            mean: -self.mean,
            variance: self.variance,
        }
    }
}

impl TryFrom<f64> for UncertainValue {
    type Error = UncertainError;

    fn try_from(x: f64) -> UncertainResult<Self> {
        Self::from_float(x)
    }
}

impl TryFrom<f32> for UncertainValue {
    type Error = UncertainError;

    fn try_from(x: f32) -> UncertainResult<Self> {
        Self::from_float(x)
    }
}

impl TryFrom<i32> for UncertainValue {
    type Error = UncertainError;

    fn try_from(x: i32) -> UncertainResult<Self> {
        Self::from_float(x)
    }
}

impl TryFrom<i64> for UncertainValue {
    type Error = UncertainError;

    fn try_from(x: i64) -> UncertainResult<Self> {
        Self::from_float(x)
    }
}

/// Unvalidated wire shape; deserialisation goes through [`UncertainValue::new`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawUncertainValue {
    mean: f64,
    variance: f64,
}

#[cfg(feature = "serde")]
impl TryFrom<RawUncertainValue> for UncertainValue {
    type Error = UncertainError;

    fn try_from(raw: RawUncertainValue) -> UncertainResult<Self> {
        Self::new(raw.mean, raw.variance)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        #[test]
        fn valid_construction_succeeds(
            mean in -1e300_f64..1e300,
            variance in 0.0_f64..1e300,
        ) {
            let v = UncertainValue::new(mean, variance).unwrap();
            prop_assert_eq!(v.std_dev(), variance.sqrt());
        }

        #[test]
        fn std_dev_round_trip(
            mean in -1e12_f64..1e12,
            // s² must neither underflow nor overflow
            s in prop_oneof![Just(0.0_f64), 1e-150_f64..1e150],
        ) {
            let v = UncertainValue::from_mean_std_dev(mean, s).unwrap();
            prop_assert_eq!(v.variance(), s * s);
            prop_assert_eq!(v.std_dev(), s);
        }

        #[test]
        fn negative_variance_rejected(mean in -1e6_f64..1e6, variance in -1e300_f64..-1e-300) {
            prop_assert!(UncertainValue::new(mean, variance).is_err());
        }

        #[test]
        fn from_float_keeps_mean(x in prop::num::f64::ANY) {
            prop_assume!(x.is_finite());
            let v = UncertainValue::from_float(x).unwrap();
            prop_assert_eq!(v.mean().to_bits(), x.to_bits());
            prop_assert!(v.variance() >= 0.0 && v.variance().is_finite());
        }
    }
}
