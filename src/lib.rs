//! # u-uncertain
//!
//! Uncertain values with first-order (linearised) error propagation.
//!
//! An [`UncertainValue`] carries a mean and a variance. Arithmetic between
//! values propagates the variance with the first-order Taylor formulas, a
//! saturation policy keeps propagated variances finite, and aggregation
//! folds a set of samples into one value with combined statistical and
//! instrumental uncertainty.
//!
//! ## Modules
//!
//! - [`value`]: the validated `(mean, variance)` type
//! - [`rounding`]: variance from floating-point representation error (ULP)
//! - [`saturation`]: scale-aware variance ceiling
//! - [`arithmetic`]: `+ − × ÷` with variance propagation
//! - [`aggregate`]: batch and streaming sample aggregation
//! - [`error`]: error taxonomy
//!
//! ## Design Philosophy
//!
//! - **Validated construction**: every value goes through one checked
//!   constructor; nothing mutates after creation.
//! - **Fail fast on inputs, saturate outputs**: invalid inputs are errors,
//!   large-but-valid propagated variances are clamped.
//! - **Bit-exact determinism**: same inputs, same bits. No randomness, no
//!   global state, safe to share across threads.
//! - **Property-based testing**: propagation invariants verified via proptest
//!
//! ## Scope
//!
//! No higher moments, no second-order (nonlinearity) corrections, no
//! covariance tracking: operands are always treated as independent.
//!
//! # Examples
//! ```
//! use u_uncertain::{UncertainResult, UncertainValue};
//!
//! fn density() -> UncertainResult<UncertainValue> {
//!     let mass = UncertainValue::from_mean_std_dev(5.0, 0.1)?;
//!     let volume = UncertainValue::from_mean_std_dev(2.0, 0.05)?;
//!     mass / volume
//! }
//!
//! let rho = density().unwrap();
//! assert_eq!(rho.mean(), 2.5);
//! ```

pub mod aggregate;
pub mod arithmetic;
pub mod error;
pub mod rounding;
pub mod saturation;
pub mod value;

pub use aggregate::SampleAccumulator;
pub use error::{UncertainError, UncertainResult};
pub use rounding::RoundingSource;
pub use value::UncertainValue;

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_shareable_across_threads() {
        assert_send_sync::<UncertainValue>();
        assert_send_sync::<SampleAccumulator>();
        assert_send_sync::<UncertainError>();
    }

    #[test]
    fn test_concurrent_results_are_bit_identical() {
        let a = UncertainValue::new(2.0, 0.04).unwrap();
        let b = UncertainValue::new(3.0, 0.09).unwrap();
        let expected = (a / b).unwrap();
        let results: Vec<UncertainValue> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8).map(|_| scope.spawn(|| (a / b).unwrap())).collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(results.iter().all(|r| *r == expected));
    }
}
