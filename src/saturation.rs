//! Variance saturation for linear error propagation.
//!
//! First-order propagation can blow up near singularities, most notably
//! division by a mean close to zero. The policy here keeps every
//! propagated variance finite and bounded by a scale-aware ceiling:
//!
//! ```text
//! relative  = mean² · K          (K = MAX_RELATIVE_STD_DEV²)
//! ceiling   = max(relative, ABSOLUTE_VARIANCE_FLOOR)
//! saturated = ceiling   if variance is NaN, ±∞ or > ceiling
//!           = variance  otherwise
//! ```
//!
//! Beyond a relative standard deviation of `1e8` the small-error
//! assumption behind linearisation is no longer credible, so nothing is
//! lost by clamping there. The absolute floor keeps near-zero means from
//! collapsing the ceiling to ~0.
//!
//! The policy never reads or alters the mean beyond computing the
//! ceiling, and never repairs a negative variance: that is an invariant
//! violation caught by the validated constructor.

/// Largest relative standard deviation (σ / |mean|) that is still
/// treated as meaningful.
pub const MAX_RELATIVE_STD_DEV: f64 = 1e8;

/// `MAX_RELATIVE_STD_DEV²`, the factor applied to `mean²`.
pub const RELATIVE_CEILING_FACTOR: f64 = MAX_RELATIVE_STD_DEV * MAX_RELATIVE_STD_DEV;

/// Minimum ceiling, used when `mean² · K` is smaller.
pub const ABSOLUTE_VARIANCE_FLOOR: f64 = 1e300;

/// Returns the effective variance ceiling for a result with the given mean.
///
/// The ceiling is always finite: when `mean² · K` overflows (|mean| above
/// roughly `1.34e146`) it is clamped to `f64::MAX`.
///
/// # Examples
/// ```
/// use u_uncertain::saturation::{variance_ceiling, ABSOLUTE_VARIANCE_FLOOR};
/// assert_eq!(variance_ceiling(0.0), ABSOLUTE_VARIANCE_FLOOR);
/// assert_eq!(variance_ceiling(1e143), 1e143 * 1e143 * 1e16);
/// assert_eq!(variance_ceiling(1e200), f64::MAX);
/// ```
pub fn variance_ceiling(mean: f64) -> f64 {
    // f64::min drops NaN, so a non-finite mean also lands on f64::MAX.
    let relative = (mean * mean * RELATIVE_CEILING_FACTOR).min(f64::MAX);
    relative.max(ABSOLUTE_VARIANCE_FLOOR)
}

/// Clamps a raw propagated variance into the stability envelope.
///
/// Returns [`variance_ceiling`]`(mean)` if `variance` is NaN, infinite or
/// exceeds it; otherwise returns `variance` unchanged (negative values
/// included).
///
/// # Examples
/// ```
/// use u_uncertain::saturation::saturate_variance;
/// assert_eq!(saturate_variance(1.0, 0.25), 0.25);
/// assert_eq!(saturate_variance(1.0, f64::INFINITY), 1e300);
/// assert_eq!(saturate_variance(1.0, f64::NAN), 1e300);
/// ```
pub fn saturate_variance(mean: f64, variance: f64) -> f64 {
    let ceiling = variance_ceiling(mean);
    if variance.is_nan() || variance > ceiling {
        tracing::debug!(mean, raw_variance = variance, ceiling, "variance saturated");
        ceiling
    } else {
        variance
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(RELATIVE_CEILING_FACTOR, 1e16);
        assert_eq!(ABSOLUTE_VARIANCE_FLOOR, 1e300);
    }

    #[test]
    fn test_ceiling_near_zero_uses_floor() {
        assert_eq!(variance_ceiling(0.0), 1e300);
        assert_eq!(variance_ceiling(-0.0), 1e300);
        assert_eq!(variance_ceiling(1e-10), 1e300);
        // 1e142² · 1e16 sits on the floor; the larger of the two wins
        assert_eq!(
            variance_ceiling(1e142),
            (1e142 * 1e142 * RELATIVE_CEILING_FACTOR).max(1e300)
        );
    }

    #[test]
    fn test_ceiling_relative_dominates() {
        let c = variance_ceiling(1e143);
        assert!((c - 1e302).abs() / 1e302 < 1e-12);
        assert_eq!(variance_ceiling(-1e143), c);
    }

    #[test]
    fn test_ceiling_stays_finite() {
        assert_eq!(variance_ceiling(1e150), f64::MAX);
        assert_eq!(variance_ceiling(f64::MAX), f64::MAX);
        assert_eq!(variance_ceiling(f64::INFINITY), f64::MAX);
        assert_eq!(variance_ceiling(f64::NAN), f64::MAX);
    }

    #[test]
    fn test_saturate_passthrough() {
        assert_eq!(saturate_variance(5.0, 0.0), 0.0);
        assert_eq!(saturate_variance(5.0, 0.13), 0.13);
        assert_eq!(saturate_variance(0.0, 1e300), 1e300);
    }

    #[test]
    fn test_saturate_clamps_non_finite() {
        assert_eq!(saturate_variance(2.0, f64::INFINITY), 1e300);
        assert_eq!(saturate_variance(2.0, f64::NAN), 1e300);
        assert_eq!(saturate_variance(1e143, f64::INFINITY), variance_ceiling(1e143));
    }

    #[test]
    fn test_saturate_clamps_above_ceiling() {
        assert_eq!(saturate_variance(1e143, 1e303), variance_ceiling(1e143));
        assert_eq!(saturate_variance(0.0, 1e301), 1e300);
    }

    #[test]
    fn test_saturate_leaves_negative_alone() {
        assert_eq!(saturate_variance(1.0, -1.0), -1.0);
    }
}
