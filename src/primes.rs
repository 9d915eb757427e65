use num_bigint::{BigInt, BigUint};
use num_traits::{One, Signed};
use parking_lot::Mutex;

lazy_static::lazy_static!(
    // all primes found so far, in ascending order
    static ref PRIMES: Mutex<Vec<u32>> = Mutex::new(vec![2, 3, 5, 7, 11, 13]);
    // FACTORIALS[n] contains the factorization of n!
    static ref FACTORIALS: Mutex<Vec<PrimeFactorization>> = Mutex::new(vec![PrimeFactorization::one()]);
);

// rescale floating point values every time they leave [2^-RESCALE_BITS, 2^RESCALE_BITS]
const RESCALE_BITS: i32 = 256;

// multiply by at most base^POWER_STEP at once when evaluating prime powers
const POWER_STEP: u32 = 16;

fn push_next_prime(primes: &mut Vec<u32>) {
    let mut candidate = primes.last().copied().unwrap_or(1) + 2;
    loop {
        let is_prime = primes.iter()
            .take_while(|&&p| p * p <= candidate)
            .all(|&p| candidate % p != 0);

        if is_prime {
            primes.push(candidate);
            return;
        }
        candidate += 2;
    }
}

/// Get the first `count` prime numbers
pub fn first_primes(count: usize) -> Vec<u32> {
    let mut primes = PRIMES.lock();
    while primes.len() < count {
        push_next_prime(&mut primes);
    }
    return primes[..count].to_vec();
}

/// Get all the prime numbers smaller or equal to `n`
pub fn primes_up_to(n: u32) -> Vec<u32> {
    let mut primes = PRIMES.lock();
    while primes.last().map_or(true, |&p| p < n) {
        push_next_prime(&mut primes);
    }
    return primes.iter().copied().take_while(|&p| p <= n).collect();
}

/// A floating point value stored as `mantissa * 2^exponent`. This is used to
/// evaluate products of large factorials which would overflow a bare `f64`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledFloat {
    mantissa: f64,
    exponent: i32,
}

impl ScaledFloat {
    pub fn new(value: f64) -> ScaledFloat {
        let mut scaled = ScaledFloat { mantissa: value, exponent: 0 };
        scaled.rescale();
        return scaled;
    }

    /// Multiply this value by `base^power`, where `power` can be negative
    pub fn mul_power(&mut self, base: f64, power: i32) {
        let step = if power >= 0 { base } else { 1.0 / base };
        let mut remaining = power.unsigned_abs();
        while remaining > 0 {
            let chunk = remaining.min(POWER_STEP);
            self.mantissa *= step.powi(chunk as i32);
            self.rescale();
            remaining -= chunk;
        }
    }

    /// Get the square root of this value. The sign is ignored.
    pub fn sqrt(&self) -> ScaledFloat {
        let mut mantissa = self.mantissa.abs();
        if self.exponent % 2 != 0 {
            mantissa *= 2.0;
        }
        let exponent = self.exponent - self.exponent.rem_euclid(2);

        let mut root = ScaledFloat {
            mantissa: mantissa.sqrt(),
            exponent: exponent / 2,
        };
        root.rescale();
        return root;
    }

    /// Convert an arbitrary precision integer, keeping its 64 most significant
    /// bits
    pub fn from_bigint(value: &BigInt) -> ScaledFloat {
        let magnitude = value.magnitude();
        let shift = magnitude.bits().saturating_sub(64);
        let top = (magnitude >> shift).iter_u64_digits().next().unwrap_or(0);

        let sign = if value.is_negative() { -1.0 } else { 1.0 };
        let mut scaled = ScaledFloat {
            mantissa: sign * top as f64,
            exponent: shift as i32,
        };
        scaled.rescale();
        return scaled;
    }

    pub fn to_f64(&self) -> f64 {
        let scale = 2f64.powi(RESCALE_BITS);
        let mut value = self.mantissa;
        let mut exponent = self.exponent;
        while exponent > RESCALE_BITS {
            value *= scale;
            exponent -= RESCALE_BITS;
        }
        while exponent < -RESCALE_BITS {
            value /= scale;
            exponent += RESCALE_BITS;
        }
        return value * 2f64.powi(exponent);
    }

    fn rescale(&mut self) {
        if self.mantissa == 0.0 || !self.mantissa.is_finite() {
            return;
        }

        let scale = 2f64.powi(RESCALE_BITS);
        while self.mantissa.abs() > scale {
            self.mantissa /= scale;
            self.exponent += RESCALE_BITS;
        }
        while self.mantissa.abs() < 1.0 / scale {
            self.mantissa *= scale;
            self.exponent -= RESCALE_BITS;
        }
    }
}

/// An integer represented by its sign and the exponents of its prime factors:
/// `factors[i]` is the power of the i-th prime number (starting with 2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimeFactorization {
    pub sign: i8,
    pub factors: Vec<u32>,
}

impl PrimeFactorization {
    /// Get the factorization of 1
    pub fn one() -> PrimeFactorization {
        return PrimeFactorization {
            sign: 1,
            factors: Vec::new(),
        };
    }

    /// Factorize the strictly positive integer `n`
    pub fn from_integer(n: u32) -> PrimeFactorization {
        assert!(n > 0, "can not factorize 0");

        let mut factors = Vec::new();
        let mut remainder = n;
        for p in primes_up_to(n) {
            if remainder == 1 {
                break;
            }

            let mut power = 0;
            while remainder % p == 0 {
                remainder /= p;
                power += 1;
            }
            factors.push(power);
        }

        let mut result = PrimeFactorization { sign: 1, factors };
        result.simplify_factors();
        return result;
    }

    /// Remove trailing zero exponents, so that equal numbers have equal
    /// representations
    pub fn simplify_factors(&mut self) {
        while self.factors.last() == Some(&0) {
            self.factors.pop();
        }
    }

    /// Update `self` to the least common multiple of `self` and `other`
    pub fn lcm_assign(&mut self, other: &PrimeFactorization) {
        if self.factors.len() < other.factors.len() {
            self.factors.resize(other.factors.len(), 0);
        }

        for (mine, theirs) in self.factors.iter_mut().zip(&other.factors) {
            *mine = std::cmp::max(*mine, *theirs);
        }
    }

    /// Divide `self` by `divisor`, which must divide `self` exactly
    pub fn exact_div(&self, divisor: &PrimeFactorization) -> PrimeFactorization {
        debug_assert!(divisor.factors.iter().skip(self.factors.len()).all(|&f| f == 0));

        let mut factors = self.factors.clone();
        for (factor, &divisor_factor) in factors.iter_mut().zip(&divisor.factors) {
            debug_assert!(*factor >= divisor_factor, "divisor does not divide this number");
            *factor -= divisor_factor;
        }

        let mut result = PrimeFactorization {
            sign: self.sign * divisor.sign,
            factors,
        };
        result.simplify_factors();
        return result;
    }

    /// Get the exact value of this integer
    pub fn to_bigint(&self) -> BigInt {
        let mut magnitude = BigUint::one();
        for (&p, &power) in first_primes(self.factors.len()).iter().zip(&self.factors) {
            magnitude *= BigUint::from(p).pow(power);
        }

        let value = BigInt::from(magnitude);
        if self.sign < 0 {
            return -value;
        }
        return value;
    }
}

impl std::ops::Mul for ScaledFloat {
    type Output = ScaledFloat;
    fn mul(self, rhs: Self) -> Self::Output {
        let mut result = ScaledFloat {
            mantissa: self.mantissa * rhs.mantissa,
            exponent: self.exponent + rhs.exponent,
        };
        result.rescale();
        return result;
    }
}

impl<'a> std::ops::MulAssign<&'a PrimeFactorization> for PrimeFactorization {
    fn mul_assign(&mut self, rhs: &'a PrimeFactorization) {
        if self.factors.len() < rhs.factors.len() {
            self.factors.resize(rhs.factors.len(), 0);
        }

        for (mine, theirs) in self.factors.iter_mut().zip(&rhs.factors) {
            *mine += theirs;
        }
        self.sign *= rhs.sign;
    }
}

impl std::ops::MulAssign<PrimeFactorization> for PrimeFactorization {
    fn mul_assign(&mut self, rhs: PrimeFactorization) {
        *self *= &rhs;
    }
}

impl std::ops::Mul for PrimeFactorization {
    type Output = PrimeFactorization;
    fn mul(mut self, rhs: Self) -> Self::Output {
        self *= &rhs;
        return self;
    }
}

/// Get the prime factorization of `n!`, using Legendre's formula for the power
/// of each prime `p <= n`. Results are cached for subsequent calls.
pub fn factorial(n: u32) -> PrimeFactorization {
    let mut cache = FACTORIALS.lock();
    if let Some(cached) = cache.get(n as usize) {
        return cached.clone();
    }

    for m in (cache.len() as u32)..=n {
        let factors = primes_up_to(m).into_iter()
            .map(|p| {
                let mut power = 0;
                let mut divisor = p as u64;
                while divisor <= m as u64 {
                    power += m / divisor as u32;
                    divisor *= p as u64;
                }
                power
            })
            .collect();

        cache.push(PrimeFactorization { sign: 1, factors });
    }

    return cache[n as usize].clone();
}
