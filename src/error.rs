//! Error taxonomy for uncertain-value construction and arithmetic.
//!
//! Every error is raised synchronously at the point of construction,
//! conversion or division. Variance overflow produced by arithmetic is
//! not an error: it is absorbed by [`crate::saturation`].

use thiserror::Error;

/// Errors raised by [`crate::UncertainValue`] factories and operators.
#[derive(Debug, Error, Clone, PartialEq, Eq, Hash)]
pub enum UncertainError {
    /// A mean, variance or raw value is NaN, infinite, or (for variance)
    /// negative.
    #[error("domain error: {0}")]
    Domain(String),

    /// The divisor's mean is exactly zero.
    #[error("division by zero: divisor mean is exactly 0")]
    DivisionByZero,

    /// An empty sample collection was supplied to aggregation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result type for uncertain-value operations.
pub type UncertainResult<T> = Result<T, UncertainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let e = UncertainError::Domain("mean is NaN".into());
        assert_eq!(e.to_string(), "domain error: mean is NaN");
        assert_eq!(
            UncertainError::DivisionByZero.to_string(),
            "division by zero: divisor mean is exactly 0"
        );
        let e = UncertainError::InvalidArgument("no samples".into());
        assert_eq!(e.to_string(), "invalid argument: no samples");
    }

    #[test]
    fn test_usable_as_hash_key() {
        use std::collections::HashSet;
        let set: HashSet<UncertainError> = [
            UncertainError::DivisionByZero,
            UncertainError::DivisionByZero,
            UncertainError::Domain("mean is NaN".into()),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.len(), 2);
    }
}
