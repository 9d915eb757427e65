use std::ops::RangeInclusive;

use crate::errors::{CouplingError, Result};

/// Angular momentum of a single particle, characterized by the (integer)
/// quantum number `l`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AngularMomentum {
    l: i32,
}

impl AngularMomentum {
    /// Create a new `AngularMomentum` with quantum number `l`. Negative `l`
    /// are rejected with [`CouplingError::InvalidQuantumNumber`].
    pub fn new(l: i32) -> Result<AngularMomentum> {
        if l < 0 {
            return Err(CouplingError::InvalidQuantumNumber { l });
        }
        return Ok(AngularMomentum { l });
    }

    /// Get the quantum number `l`
    pub fn l(&self) -> i32 {
        return self.l;
    }

    /// Get the allowed magnetic quantum numbers, `-l..=l`
    pub fn m_values(&self) -> RangeInclusive<i32> {
        return -self.l..=self.l;
    }

    /// Number of allowed magnetic quantum numbers, `2l + 1`
    pub fn multiplicity(&self) -> usize {
        return 2 * self.l as usize + 1;
    }

    /// Check if `m` is an allowed magnetic quantum number for this particle
    pub fn contains(&self, m: i32) -> bool {
        return self.m_values().contains(&m);
    }

    /// Norm of the angular momentum vector, `sqrt(l (l + 1))` in units of ħ
    pub fn magnitude(&self) -> f64 {
        let l = self.l as f64;
        return f64::sqrt(l * (l + 1.0));
    }
}

impl std::fmt::Display for AngularMomentum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(f, "l={}", self.l);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_ulps_eq;

    #[test]
    fn m_values() {
        let p = AngularMomentum::new(2).unwrap();
        assert_eq!(p.l(), 2);
        assert_eq!(p.m_values().collect::<Vec<_>>(), [-2, -1, 0, 1, 2]);
        assert_eq!(p.multiplicity(), 5);
        assert!(p.contains(-2));
        assert!(!p.contains(3));

        let s = AngularMomentum::new(0).unwrap();
        assert_eq!(s.m_values().collect::<Vec<_>>(), [0]);
        assert_eq!(s.multiplicity(), 1);
    }

    #[test]
    fn negative_l() {
        assert_eq!(AngularMomentum::new(-1), Err(CouplingError::InvalidQuantumNumber { l: -1 }));
    }

    #[test]
    fn magnitude() {
        assert_ulps_eq!(AngularMomentum::new(0).unwrap().magnitude(), 0.0);
        assert_ulps_eq!(AngularMomentum::new(1).unwrap().magnitude(), f64::sqrt(2.0));
        assert_ulps_eq!(AngularMomentum::new(3).unwrap().magnitude(), f64::sqrt(12.0));
    }

    #[test]
    fn largest_quantum_number() {
        let p = AngularMomentum::new(i32::MAX).unwrap();
        assert_eq!(p.multiplicity(), 2 * i32::MAX as usize + 1);
        assert_eq!(p.m_values(), -i32::MAX..=i32::MAX);
        assert!(p.contains(-i32::MAX));
        assert!(!p.contains(i32::MIN));
    }

    #[test]
    fn display() {
        assert_eq!(AngularMomentum::new(4).unwrap().to_string(), "l=4");
    }
}
