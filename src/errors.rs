//! Error type for the construction of angular momentum states.

use thiserror::Error;

/// Errors raised when building an [`AngularMomentum`](crate::AngularMomentum)
/// or a [`CoupledState`](crate::CoupledState) from structurally impossible
/// quantum numbers.
///
/// Physically forbidden but well-formed queries (`m1 + m2 != M`, `|m| > l`,
/// ...) are not errors: they are answered with a zero coefficient.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CouplingError {
    /// The angular momentum quantum number `l` was negative.
    #[error("invalid quantum number: l={l} must be non-negative")]
    InvalidQuantumNumber {
        l: i32,
    },
    /// The total angular momentum does not satisfy the triangle rule
    /// `|l1 - l2| <= L <= l1 + l2`.
    #[error("invalid coupling: L={total_l} not allowed for l1={l1}, l2={l2}")]
    InvalidCoupling {
        total_l: i32,
        l1: i32,
        l2: i32,
    },
}

/// Convenience alias for results of fallible constructors in this crate
pub type Result<T> = std::result::Result<T, CouplingError>;
