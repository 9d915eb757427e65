use std::borrow::Borrow;

use crate::primes::{first_primes, PrimeFactorization, ScaledFloat};

/// A rational number represented as two integer prime factorizations, one for
/// numerator and one for denominator. The sign of the fraction is stored in the
/// numerator.
#[derive(Debug, Clone, PartialEq)]
pub struct Rational {
    pub numerator: PrimeFactorization,
    pub denominator: PrimeFactorization,
}

impl Rational {
    /// Create a new `Rational` with the given `numerator` and `denominator`
    pub fn new(mut numerator: PrimeFactorization, mut denominator: PrimeFactorization) -> Rational {
        numerator.sign *= denominator.sign;
        denominator.sign = 1;
        return Rational {
            numerator,
            denominator,
        };
    }

    /// Divide both numerator and denominator by their greatest common divider
    /// in order to simplify the rational
    pub fn simplify(&mut self) {
        for (num_factor, den_factor) in self.numerator.factors.iter_mut().zip(self.denominator.factors.iter_mut()) {
            let gcd = std::cmp::min(*num_factor, *den_factor);
            *num_factor -= gcd;
            *den_factor -= gcd;
        }

        self.numerator.simplify_factors();
        self.denominator.simplify_factors();
    }

    // evaluate prime by prime on the net power, so that large numerators and
    // denominators cancel before reaching floating point
    fn scaled(&self) -> ScaledFloat {
        let size = std::cmp::max(self.numerator.factors.len(), self.denominator.factors.len());
        let power = |factors: &[u32], i: usize| factors.get(i).copied().unwrap_or(0) as i32;

        let mut value = ScaledFloat::new(self.numerator.sign as f64);
        for (i, &p) in first_primes(size).iter().enumerate() {
            let net = power(&self.numerator.factors, i) - power(&self.denominator.factors, i);
            value.mul_power(p as f64, net);
        }
        return value;
    }

    /// Get `sqrt(|R|)`, keeping the result in a `ScaledFloat` so that it can
    /// be combined with other large or small values before conversion to `f64`
    pub(crate) fn scaled_root(&self) -> ScaledFloat {
        return self.scaled().sqrt();
    }
}

impl<T> std::ops::MulAssign<T> for Rational where T: Borrow<Rational> {
    fn mul_assign(&mut self, rhs: T) {
        let rhs = rhs.borrow();
        debug_assert_eq!(self.denominator.sign, 1);
        debug_assert_eq!(rhs.denominator.sign, 1);

        self.numerator *= &rhs.numerator;
        self.denominator *= &rhs.denominator;
    }
}
