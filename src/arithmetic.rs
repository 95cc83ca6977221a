//! Arithmetic with first-order uncertainty propagation.
//!
//! Each operator's variance is the first-order Taylor term
//! `Σ (∂f/∂xᵢ)² · Var(xᵢ)` around the operand means, with the operands
//! treated as independent (no covariance tracking):
//!
//! | Operator | Mean | Variance |
//! |---|---|---|
//! | `a + b` | `ma + mb` | `va + vb` |
//! | `a − b` | `ma − mb` | `va + vb` |
//! | `a × b` | `ma · mb` | `mb²·va + ma²·vb` |
//! | `a ÷ b` | `ma / mb` | `va/mb² + ma²·vb/mb⁴` |
//!
//! Every raw variance passes through [`saturate_variance`] before the
//! result is validated, so variance overflow is never an error. A mean
//! that overflows to infinity is: it fails validation with
//! [`UncertainError::Domain`]. Division by a mean of exactly zero fails
//! with [`UncertainError::DivisionByZero`] before any variance is
//! computed.
//!
//! A zero-variance operand contributes exactly zero to the result, even
//! when its coefficient (`mb²`, `1/mb²`, ...) overflows.
//!
//! # Examples
//! ```
//! use u_uncertain::{UncertainError, UncertainValue};
//! let a = UncertainValue::new(2.0, 0.04).unwrap();
//! let b = UncertainValue::new(3.0, 0.09).unwrap();
//! let q = (a / b).unwrap();
//! assert_eq!(q.mean(), 0.6666666666666666);
//! assert_eq!(q.variance(), 0.008888888888888889);
//!
//! let zero = UncertainValue::new(0.0, 1.0).unwrap();
//! assert_eq!(a / zero, Err(UncertainError::DivisionByZero));
//! ```

use std::ops::{Add, Div, Mul, Sub};

use crate::error::{UncertainError, UncertainResult};
use crate::saturation::saturate_variance;
use crate::value::UncertainValue;

/// Saturates the raw variance, then validates.
fn propagate(mean: f64, raw_variance: f64) -> UncertainResult<UncertainValue> {
    UncertainValue::new(mean, saturate_variance(mean, raw_variance))
}

/// `coefficient · variance`, with a zero variance short-circuiting to 0.
fn weighted(coefficient: f64, variance: f64) -> f64 {
    if variance == 0.0 {
        0.0
    } else {
        coefficient * variance
    }
}

impl UncertainValue {
    /// `self + rhs`.
    ///
    /// # Errors
    /// [`UncertainError::Domain`] if the mean overflows.
    pub fn checked_add(self, rhs: Self) -> UncertainResult<Self> {
        propagate(self.mean() + rhs.mean(), self.variance() + rhs.variance())
    }

    /// `self − rhs`. Variances add, as for addition.
    ///
    /// # Errors
    /// [`UncertainError::Domain`] if the mean overflows.
    pub fn checked_sub(self, rhs: Self) -> UncertainResult<Self> {
        propagate(self.mean() - rhs.mean(), self.variance() + rhs.variance())
    }

    /// `self × rhs`.
    ///
    /// # Errors
    /// [`UncertainError::Domain`] if the mean overflows.
    pub fn checked_mul(self, rhs: Self) -> UncertainResult<Self> {
        let (ma, mb) = (self.mean(), rhs.mean());
        let variance = weighted(mb * mb, self.variance()) + weighted(ma * ma, rhs.variance());
        propagate(ma * mb, variance)
    }

    /// `self ÷ rhs`.
    ///
    /// # Errors
    /// - [`UncertainError::DivisionByZero`] if `rhs.mean()` is exactly zero,
    ///   whatever its variance.
    /// - [`UncertainError::Domain`] if the quotient's mean overflows.
    pub fn checked_div(self, rhs: Self) -> UncertainResult<Self> {
        let (ma, mb) = (self.mean(), rhs.mean());
        if mb == 0.0 {
            return Err(UncertainError::DivisionByZero);
        }
        let mb2 = mb * mb;
        // Both guards skip the whole term: mb² and mb⁴ may underflow to 0.
        let lhs_term = if self.variance() == 0.0 {
            0.0
        } else {
            self.variance() / mb2
        };
        let rhs_term = if rhs.variance() == 0.0 {
            0.0
        } else {
            ma * ma * rhs.variance() / (mb2 * mb2)
        };
        propagate(ma / mb, lhs_term + rhs_term)
    }
}

impl Add for UncertainValue {
    type Output = UncertainResult<UncertainValue>;

    fn add(self, rhs: Self) -> Self::Output {
        self.checked_add(rhs)
    }
}

impl Sub for UncertainValue {
    type Output = UncertainResult<UncertainValue>;

    fn sub(self, rhs: Self) -> Self::Output {
        self.checked_sub(rhs)
    }
}

impl Mul for UncertainValue {
    type Output = UncertainResult<UncertainValue>;

    fn mul(self, rhs: Self) -> Self::Output {
        self.checked_mul(rhs)
    }
}

impl Div for UncertainValue {
    type Output = UncertainResult<UncertainValue>;

    fn div(self, rhs: Self) -> Self::Output {
        self.checked_div(rhs)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
