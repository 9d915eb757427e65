#![allow(clippy::needless_return, clippy::redundant_field_names, clippy::too_many_arguments)]

//! Coupling of two angular momenta `l1` and `l2` to a total angular momentum
//! `|L M>`, using Clebsch-Gordan coefficients.
//!
//! ```
//! use angular_coupling::{AngularMomentum, CoupledState};
//!
//! let p = AngularMomentum::new(1)?;
//! let singlet = CoupledState::new(p, p, 0, 0)?;
//! for term in singlet.expansion_coefficients() {
//!     println!("{} {} {:.4}", term.m1, term.m2, term.coefficient);
//! }
//! assert!((singlet.measurement_probability(0, 0) - 1.0 / 3.0).abs() < 1e-12);
//! # Ok::<(), angular_coupling::CouplingError>(())
//! ```

mod primes;
mod rational;

pub mod errors;
pub use self::errors::{CouplingError, Result};

mod angular_momentum;
pub use self::angular_momentum::AngularMomentum;

mod clebsch_gordan;
pub use self::clebsch_gordan::{
    clebsch_gordan_coefficient,
    wigner_3j,
    clear_clebsch_gordan_cache,
    CLEBSCH_GORDAN_CACHE_SIZE,
};

mod coupled_state;
pub use self::coupled_state::{CoupledState, ExpansionTerm, EXPANSION_THRESHOLD};
