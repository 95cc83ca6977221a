//! Representation-error model for floating-point sources.
//!
//! Rounding a real number to the nearest representable float introduces
//! a worst-case error of `±ulp/2`. Treating that half-ULP as one standard
//! deviation gives a reproducible variance with no free parameters:
//!
//! ```text
//! variance = (ulp(x) / 2)²
//! ```
//!
//! # ULP computation
//!
//! The ULP is derived from the IEEE-754 bit pattern at the source's own
//! width (see [`FloatLayout`]):
//!
//! - `x == 0` or subnormal `x` (exponent field 0): the minimum subnormal
//!   magnitude of that width.
//! - Otherwise: `2^(E − bias − mantissa_bits)` where `E` is the biased
//!   exponent field.
//!
//! A 32-bit source keeps the 32-bit rule; every other numeric source
//! (integers of any width) is promoted to `f64` first. The set of sources
//! is closed and resolved statically through [`RoundingSource`].

use crate::error::{UncertainError, UncertainResult};

/// Bit layout of an IEEE-754 binary format.
///
/// Patterns of narrower formats are handled zero-extended to `u64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloatLayout {
    /// Number of explicitly stored mantissa (fraction) bits.
    pub mantissa_bits: u32,
    /// Number of exponent bits.
    pub exponent_bits: u32,
    /// Exponent bias.
    pub bias: i32,
}

impl FloatLayout {
    /// IEEE-754 binary32.
    pub const F32: Self = Self {
        mantissa_bits: 23,
        exponent_bits: 8,
        bias: 127,
    };

    /// IEEE-754 binary64.
    pub const F64: Self = Self {
        mantissa_bits: 52,
        exponent_bits: 11,
        bias: 1023,
    };

    /// Extracts the biased exponent field from a bit pattern.
    pub fn exponent_field(&self, bits: u64) -> u64 {
        let mask = (1u64 << self.exponent_bits) - 1;
        (bits >> self.mantissa_bits) & mask
    }

    /// Base-2 exponent of the smallest positive subnormal of this width.
    ///
    /// `1 − bias − mantissa_bits`: −1074 for binary64, −149 for binary32.
    pub fn min_subnormal_exponent(&self) -> i32 {
        1 - self.bias - self.mantissa_bits as i32
    }

    /// Base-2 exponent of the ULP for a given bit pattern.
    ///
    /// Zero and subnormals (exponent field 0) share the minimum subnormal
    /// spacing.
    fn ulp_exponent(&self, bits: u64) -> i32 {
        match self.exponent_field(bits) {
            0 => self.min_subnormal_exponent(),
            field => field as i32 - self.bias - self.mantissa_bits as i32,
        }
    }
}

/// Exact `2^k` as an `f64`, for `k` in `[-1074, 1023]`.
///
/// Built from the bit pattern directly, so subnormal powers do not go
/// through a lossy reciprocal.
fn exp2_exact(k: i32) -> f64 {
    debug_assert!((-1074..=1023).contains(&k));
    if k >= -1022 {
        f64::from_bits(((k + 1023) as u64) << 52)
    } else {
        f64::from_bits(1u64 << (k + 1074))
    }
}

/// Unit in the last place of `x` at binary64 width.
///
/// # Returns
/// - `None` if `x` is NaN or infinite.
///
/// # Examples
/// ```
/// use u_uncertain::rounding::ulp_f64;
/// assert_eq!(ulp_f64(1.0), Some(f64::EPSILON));
/// assert_eq!(ulp_f64(0.0), Some(f64::from_bits(1)));
/// assert_eq!(ulp_f64(f64::NAN), None);
/// ```
pub fn ulp_f64(x: f64) -> Option<f64> {
    if !x.is_finite() {
        return None;
    }
    Some(exp2_exact(FloatLayout::F64.ulp_exponent(x.to_bits())))
}

/// Unit in the last place of `x` at binary32 width, widened to `f64`.
///
/// # Returns
/// - `None` if `x` is NaN or infinite.
///
/// # Examples
/// ```
/// use u_uncertain::rounding::ulp_f32;
/// assert_eq!(ulp_f32(1.0), Some(f32::EPSILON as f64));
/// assert_eq!(ulp_f32(0.0), Some(f32::from_bits(1) as f64));
/// ```
pub fn ulp_f32(x: f32) -> Option<f64> {
    if !x.is_finite() {
        return None;
    }
    Some(exp2_exact(
        FloatLayout::F32.ulp_exponent(u64::from(x.to_bits())),
    ))
}

/// Half-ULP variance `(ulp / 2)²` for a given ULP.
///
/// May overflow to `+∞` for ULPs above `2^513`; callers saturate.
pub fn half_ulp_variance(ulp: f64) -> f64 {
    let half = 0.5 * ulp;
    half * half
}

/// A numeric source that can be turned into an uncertain value by the
/// rounding model.
///
/// Implemented for `f64`, `f32` and every primitive integer type. Integers
/// are promoted to `f64` (rounding to nearest) and then use the binary64
/// rule; `f32` keeps the binary32 rule.
pub trait RoundingSource: Copy {
    /// Returns `(mean, ulp)` for this source.
    ///
    /// # Errors
    /// [`UncertainError::Domain`] if the value is NaN or infinite.
    fn mean_and_ulp(self) -> UncertainResult<(f64, f64)>;
}

impl RoundingSource for f64 {
    fn mean_and_ulp(self) -> UncertainResult<(f64, f64)> {
        match ulp_f64(self) {
            Some(ulp) => Ok((self, ulp)),
            None => Err(UncertainError::Domain(format!(
                "floating-point source must be finite, got {self}"
            ))),
        }
    }
}

impl RoundingSource for f32 {
    fn mean_and_ulp(self) -> UncertainResult<(f64, f64)> {
        match ulp_f32(self) {
            Some(ulp) => Ok((f64::from(self), ulp)),
            None => Err(UncertainError::Domain(format!(
                "floating-point source must be finite, got {self}"
            ))),
        }
    }
}

macro_rules! impl_rounding_source_via_f64 {
    ($($t:ty),* $(,)?) => {
        $(
            impl RoundingSource for $t {
                fn mean_and_ulp(self) -> UncertainResult<(f64, f64)> {
                    (self as f64).mean_and_ulp()
                }
            }
        )*
    };
}

impl_rounding_source_via_f64!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(1000))]

        #[test]
        fn ulp_f64_is_gap_to_next(x in prop::num::f64::NORMAL | prop::num::f64::SUBNORMAL) {
            prop_assume!(x.abs() < f64::MAX);
            let a = x.abs();
            let next = f64::from_bits(a.to_bits() + 1);
            prop_assert_eq!(ulp_f64(x), Some(next - a));
        }

        #[test]
        fn ulp_f32_is_gap_to_next(x in prop::num::f32::NORMAL | prop::num::f32::SUBNORMAL) {
            prop_assume!(x.abs() < f32::MAX);
            let a = x.abs();
            let next = f32::from_bits(a.to_bits() + 1);
            prop_assert_eq!(ulp_f32(x), Some(f64::from(next - a)));
        }

        #[test]
        fn ulp_is_power_of_two(x in prop::num::f64::ANY) {
            prop_assume!(x.is_finite());
            let ulp = ulp_f64(x).unwrap();
            prop_assert!(ulp > 0.0);
            // Exactly one bit set in the significand of a power of two.
            let frac = ulp.to_bits() & ((1u64 << 52) - 1);
            let field = FloatLayout::F64.exponent_field(ulp.to_bits());
            prop_assert!(
                (field == 0 && frac.count_ones() == 1) || (field != 0 && frac == 0)
            );
        }
    }
}
