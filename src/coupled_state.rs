use std::ops::RangeInclusive;

use rayon::prelude::*;

use crate::angular_momentum::AngularMomentum;
use crate::clebsch_gordan::{clebsch_gordan_coefficient, triangle_condition};
use crate::errors::{CouplingError, Result};

/// Coefficients with an absolute value below this threshold are considered to
/// be zero when expanding a [`CoupledState`] in the uncoupled basis.
pub const EXPANSION_THRESHOLD: f64 = 1e-10;

/// A single term `<l1 m1 ; l2 m2 | L M> |l1 m1> |l2 m2>` of the expansion of a
/// coupled state in the uncoupled product basis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpansionTerm {
    pub m1: i32,
    pub m2: i32,
    pub coefficient: f64,
}

impl ExpansionTerm {
    /// Probability to measure `m1` and `m2` for the coupled state
    pub fn probability(&self) -> f64 {
        return self.coefficient * self.coefficient;
    }
}

impl From<ExpansionTerm> for (i32, i32, f64) {
    fn from(term: ExpansionTerm) -> (i32, i32, f64) {
        return (term.m1, term.m2, term.coefficient);
    }
}

/// Coupled angular momentum state `|L M>` of two particles with angular
/// momentum `l1` and `l2`.
///
/// Only the triangle rule `|l1 - l2| <= L <= l1 + l2` is checked when creating
/// the state. A state with `|M| > L` can be constructed, and has no non-zero
/// expansion coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoupledState {
    l1: i32,
    l2: i32,
    total_l: i32,
    total_m: i32,
}

impl CoupledState {
    /// Couple `particle1` and `particle2` to the total angular momentum
    /// `total_l` with projection `total_m`.
    pub fn new(particle1: AngularMomentum, particle2: AngularMomentum, total_l: i32, total_m: i32) -> Result<CoupledState> {
        let l1 = particle1.l();
        let l2 = particle2.l();

        if !triangle_condition(l1, l2, total_l) {
            tracing::debug!(l1, l2, total_l, "rejected coupling outside of the triangle rule");
            return Err(CouplingError::InvalidCoupling { total_l, l1, l2 });
        }

        tracing::debug!(l1, l2, total_l, total_m, "created coupled state");
        return Ok(CoupledState { l1, l2, total_l, total_m });
    }

    /// Get all the total angular momentum `L` that `particle1` and `particle2`
    /// can couple to
    pub fn allowed_total_l(particle1: AngularMomentum, particle2: AngularMomentum) -> RangeInclusive<i32> {
        let (l1, l2) = (particle1.l(), particle2.l());
        return (l1 - l2).abs()..=l1.saturating_add(l2);
    }

    pub fn l1(&self) -> i32 {
        return self.l1;
    }

    pub fn l2(&self) -> i32 {
        return self.l2;
    }

    pub fn total_l(&self) -> i32 {
        return self.total_l;
    }

    pub fn total_m(&self) -> i32 {
        return self.total_m;
    }

    /// Expand this state in the uncoupled basis `|l1 m1> |l2 m2>`.
    ///
    /// Only terms with a coefficient larger than [`EXPANSION_THRESHOLD`] are
    /// included, sorted by increasing `m1`, and then increasing `m2`.
    pub fn expansion_coefficients(&self) -> Vec<ExpansionTerm> {
        let (l1, l2, total_l, total_m) = (self.l1, self.l2, self.total_l, self.total_m);

        // each m1 row is computed in parallel, collect keeps the sequential order
        let terms = (-l1..=l1).into_par_iter()
            .flat_map_iter(|m1| {
                (-l2..=l2).filter_map(move |m2| {
                    let coefficient = clebsch_gordan_coefficient(l1, m1, l2, m2, total_l, total_m);
                    if coefficient.abs() > EXPANSION_THRESHOLD {
                        Some(ExpansionTerm { m1, m2, coefficient })
                    } else {
                        None
                    }
                })
            })
            .collect::<Vec<_>>();

        tracing::trace!(state = %self, terms = terms.len(), "expanded coupled state");
        return terms;
    }

    /// Probability to measure `m1_measured` for the first particle and
    /// `m2_measured` for the second one in this state. Values outside of the
    /// allowed range for `m` have a probability of 0.
    pub fn measurement_probability(&self, m1_measured: i32, m2_measured: i32) -> f64 {
        let coefficient = clebsch_gordan_coefficient(
            self.l1, m1_measured, self.l2, m2_measured, self.total_l, self.total_m
        );
        return coefficient * coefficient;
    }
}

impl std::fmt::Display for CoupledState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(f, "CoupledState(l1={}, l2={}, L={}, M={})", self.l1, self.l2, self.total_l, self.total_m);
    }
}
