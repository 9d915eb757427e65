use std::num::NonZeroUsize;

use parking_lot::Mutex;

use lru::LruCache;
use num_bigint::BigInt;
use num_traits::Zero;

use crate::primes::{factorial, PrimeFactorization, ScaledFloat};
use crate::rational::Rational;

/// Maximal number of Clebsch-Gordan coefficients kept in the LRU cache.
/// Coefficients related by symmetry share the same cache entry.
pub const CLEBSCH_GORDAN_CACHE_SIZE: usize = 200_000;

type ClebschGordanCacheKey = (i32, i32, i32, i32, i32, i32);
lazy_static::lazy_static!(
    static ref CACHED_CLEBSCH_GORDAN: Mutex<LruCache<ClebschGordanCacheKey, f64>> = Mutex::new(
        LruCache::new(NonZeroUsize::new(CLEBSCH_GORDAN_CACHE_SIZE).expect("cache size is zero"))
    );
);

/// Remove all cached Clebsch-Gordan coefficients
pub fn clear_clebsch_gordan_cache() {
    CACHED_CLEBSCH_GORDAN.lock().clear();
}

/// Compute the Clebsch-Gordan coefficient `<l1 m1 ; l2 m2 | L M>` with the
/// closed-form Racah formula.
///
/// Physically forbidden combinations give exactly `0.0`: `m1 + m2 != M`, `L`
/// outside of `|l1 - l2|..=l1 + l2`, or any `|m| > l`. Negative `l1`, `l2` or
/// `L` can never satisfy `|m| <= l` and also give `0.0`.
///
/// The largest factorial involved is `(l1 + l2 + L + 1)!`; quantum numbers
/// for which this argument does not fit in an `i32` are out of range and
/// also give `0.0`.
pub fn clebsch_gordan_coefficient(l1: i32, m1: i32, l2: i32, m2: i32, total_l: i32, total_m: i32) -> f64 {
    if !check_lm(l1, m1) || !check_lm(l2, m2) || !check_lm(total_l, total_m) {
        return 0.0;
    }

    if !triangle_condition(l1, l2, total_l) || m1 as i64 + m2 as i64 != total_m as i64 {
        return 0.0;
    }

    if l1 as i64 + l2 as i64 + total_l as i64 + 1 > i32::MAX as i64 {
        tracing::debug!(l1, l2, total_l, "quantum numbers out of range for Clebsch-Gordan coefficient");
        return 0.0;
    }

    let (l1, m1, l2, m2, sign) = reorder_clebsch_gordan(l1, m1, l2, m2, total_l, total_m, 1.0);
    let total_m = m1 + m2;
    let key = (l1, m1, l2, m2, total_l, total_m);

    {
        let mut cache = CACHED_CLEBSCH_GORDAN.lock();
        if let Some(&cached_value) = cache.get(&key) {
            tracing::trace!(l1, m1, l2, m2, total_l, total_m, "Clebsch-Gordan cache hit");
            return sign * cached_value;
        }
    }

    let result = racah_formula(l1, m1, l2, m2, total_l, total_m);

    {
        let mut cache = CACHED_CLEBSCH_GORDAN.lock();
        cache.put(key, result);
    }

    return sign * result;
}

/// Compute the Wigner 3j symbol for the given `l1`, `l2`, `l3`, `m1`, `m2`,
/// `m3`, using its relation to Clebsch-Gordan coefficients:
///
/// ```text
/// wigner_3j(l1, l2, l3, m1, m2, m3) = (-1)^(l1 - l2 - m3) / sqrt(2*l3 + 1) <l1 m1 ; l2 m2 | l3 -m3>
/// ```
pub fn wigner_3j(l1: i32, l2: i32, l3: i32, m1: i32, m2: i32, m3: i32) -> f64 {
    let minus_m3 = match m3.checked_neg() {
        Some(minus_m3) => minus_m3,
        None => return 0.0,
    };

    let cg = clebsch_gordan_coefficient(l1, m1, l2, m2, l3, minus_m3);
    if cg == 0.0 {
        return 0.0;
    }

    let w3j = cg / f64::sqrt((2 * l3 + 1) as f64);
    if (l1 - l2 - m3).rem_euclid(2) != 0 {
        return -w3j;
    } else {
        return w3j;
    }
}

/// Check the triangle rule `|l1 - l2| <= l3 <= l1 + l2`
pub(crate) fn triangle_condition(l1: i32, l2: i32, l3: i32) -> bool {
    let (l1, l2, l3) = (l1 as i64, l2 as i64, l3 as i64);
    return (l3 >= (l1 - l2).abs()) && (l3 <= l1 + l2);
}

fn check_lm(l: i32, m: i32) -> bool {
    return l >= 0 && m.unsigned_abs() <= l as u32;
}

// (-1)^(l1 + l2 - L), the phase picked by both symmetry operations below
fn exchange_phase(l1: i32, l2: i32, total_l: i32) -> f64 {
    if (l1 + l2 - total_l) % 2 == 0 {
        return 1.0;
    } else {
        return -1.0;
    }
}

// reorder l1/m1 and l2/m2 such that l1 >= l2 and M > 0 or M == 0 && m1 >= 0,
// using <l1 m1 ; l2 m2 | L M> = (-1)^(l1 + l2 - L) <l2 m2 ; l1 m1 | L M>
//                             = (-1)^(l1 + l2 - L) <l1 -m1 ; l2 -m2 | L -M>
fn reorder_clebsch_gordan(l1: i32, m1: i32, l2: i32, m2: i32, total_l: i32, total_m: i32, sign: f64) -> (i32, i32, i32, i32, f64) {
    let phase = exchange_phase(l1, l2, total_l);
    if l1 < l2 {
        return reorder_clebsch_gordan(l2, m2, l1, m1, total_l, total_m, phase * sign);
    } else if total_m < 0 || (total_m == 0 && m1 < 0) {
        return reorder_clebsch_gordan(l1, -m1, l2, -m2, total_l, -total_m, phase * sign);
    } else {
        return (l1, m1, l2, m2, sign);
    }
}

fn factorial_of(n: i32) -> PrimeFactorization {
    debug_assert!(n >= 0, "negative factorial argument {}", n);
    return factorial(n as u32);
}

// (l1 + l2 - L)! (L + l1 - l2)! (L - l1 + l2)! / (l1 + l2 + L + 1)!
fn triangle_coefficient(l1: i32, l2: i32, total_l: i32) -> Rational {
    let n1 = factorial_of(l1 + l2 - total_l);
    let n2 = factorial_of(total_l + l1 - l2);
    let n3 = factorial_of(total_l - l1 + l2);
    let numerator = n1 * n2 * n3;
    let denominator = factorial_of(l1 + l2 + total_l + 1);

    let mut result = Rational::new(numerator, denominator);
    result.simplify();
    return result;
}

/// Evaluate the alternating sum of the Racah formula,
///
/// ```text
/// Σ_k (-1)^k / (k! (l1 + l2 - L - k)! (l1 - m1 - k)! (l2 + m2 - k)! (L - l2 + m1 + k)! (L - l1 - m2 + k)!)
/// ```
///
/// as an exact fraction. The numerator is returned as an integer and the
/// denominator as the least common multiple of all the terms denominators.
fn compute_racah_series(
    k_min: i32,
    k_max: i32,
    l1: i32,
    m1: i32,
    l2: i32,
    m2: i32,
    total_l: i32,
) -> (BigInt, PrimeFactorization) {
    let denominators = (k_min..=k_max).map(|k| {
        let mut denominator = factorial_of(k);
        denominator *= factorial_of(l1 + l2 - total_l - k);
        denominator *= factorial_of(l1 - m1 - k);
        denominator *= factorial_of(l2 + m2 - k);
        denominator *= factorial_of(total_l - l2 + m1 + k);
        denominator *= factorial_of(total_l - l1 - m2 + k);
        denominator
    }).collect::<Vec<_>>();

    let mut common_denominator = PrimeFactorization::one();
    for denominator in &denominators {
        common_denominator.lcm_assign(denominator);
    }
    common_denominator.simplify_factors();

    let mut numerator = BigInt::zero();
    for (k, denominator) in (k_min..=k_max).zip(&denominators) {
        let term = common_denominator.exact_div(denominator).to_bigint();
        if k % 2 == 0 {
            numerator += term;
        } else {
            numerator -= term;
        }
    }

    return (numerator, common_denominator);
}

fn racah_formula(l1: i32, m1: i32, l2: i32, m2: i32, total_l: i32, total_m: i32) -> f64 {
    // all factorial arguments in the series must stay non-negative
    let k_min = 0_i32.max(l2 - total_l - m1).max(l1 + m2 - total_l);
    let k_max = (l1 + l2 - total_l).min(l1 - m1).min(l2 + m2);
    if k_min > k_max {
        return 0.0;
    }

    let (series_numerator, series_denominator) = compute_racah_series(k_min, k_max, l1, m1, l2, m2, total_l);
    if series_numerator.is_zero() {
        return 0.0;
    }

    let s1 = triangle_coefficient(l1, l2, total_l);

    let mut s2 = PrimeFactorization::from_integer((2 * total_l + 1) as u32);
    s2 *= factorial_of(l1 + m1);
    s2 *= factorial_of(l1 - m1);
    s2 *= factorial_of(l2 + m2);
    s2 *= factorial_of(l2 - m2);
    s2 *= factorial_of(total_l + total_m);
    s2 *= factorial_of(total_l - total_m);

    let mut s = Rational::new(s1.numerator * s2, s1.denominator);

    let series_denominator = Rational::new(PrimeFactorization::one(), series_denominator);

    // insert series denominator in the root, this improves precision compared
    // to immediately converting the full series to f64
    s *= &series_denominator;
    s *= &series_denominator;
    s.simplify();

    let result = ScaledFloat::from_bigint(&series_numerator) * s.scaled_root();
    return result.to_f64();
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_clebsch_gordan() {
        // checked against sympy
        assert_abs_diff_eq!(clebsch_gordan_coefficient(1, 1, 1, 1, 2, 2), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(clebsch_gordan_coefficient(2, 2, 1, -1, 3, 1), f64::sqrt(1.0 / 15.0), epsilon = 1e-12);
        assert_abs_diff_eq!(clebsch_gordan_coefficient(1, 1, 1, -1, 0, 0), 1.0 / f64::sqrt(3.0), epsilon = 1e-12);
        assert_abs_diff_eq!(clebsch_gordan_coefficient(1, 0, 1, 0, 0, 0), -1.0 / f64::sqrt(3.0), epsilon = 1e-12);
        assert_abs_diff_eq!(clebsch_gordan_coefficient(1, 0, 1, 0, 2, 0), f64::sqrt(2.0 / 3.0), epsilon = 1e-12);
        assert_abs_diff_eq!(clebsch_gordan_coefficient(1, 1, 1, -1, 1, 0), f64::sqrt(0.5), epsilon = 1e-12);
        assert_abs_diff_eq!(clebsch_gordan_coefficient(1, -1, 1, 1, 1, 0), -f64::sqrt(0.5), epsilon = 1e-12);
        assert_abs_diff_eq!(clebsch_gordan_coefficient(2, 0, 2, 0, 2, 0), -f64::sqrt(2.0 / 7.0), epsilon = 1e-12);
        assert_abs_diff_eq!(clebsch_gordan_coefficient(2, 1, 2, -1, 2, 0), f64::sqrt(1.0 / 14.0), epsilon = 1e-12);
        assert_abs_diff_eq!(clebsch_gordan_coefficient(2, 2, 2, -2, 0, 0), f64::sqrt(1.0 / 5.0), epsilon = 1e-12);
        assert_abs_diff_eq!(clebsch_gordan_coefficient(3, 1, 2, -1, 3, 0), f64::sqrt(1.0 / 30.0), epsilon = 1e-12);
        assert_abs_diff_eq!(clebsch_gordan_coefficient(3, 2, 2, -1, 4, 1), f64::sqrt(7.0 / 20.0), epsilon = 1e-12);
        assert_abs_diff_eq!(clebsch_gordan_coefficient(3, 0, 3, 0, 2, 0), f64::sqrt(4.0 / 21.0), epsilon = 1e-12);

        // the series cancels exactly
        assert_eq!(clebsch_gordan_coefficient(1, 0, 1, 0, 1, 0), 0.0);
    }

    #[test]
    fn selection_rules() {
        // m1 + m2 != M
        for l1 in 0..4_i32 {
            for l2 in 0..4 {
                for total_l in (l1 - l2).abs()..=(l1 + l2) {
                    for m1 in -l1..=l1 {
                        for m2 in -l2..=l2 {
                            for total_m in -total_l..=total_l {
                                if m1 + m2 != total_m {
                                    assert_eq!(clebsch_gordan_coefficient(l1, m1, l2, m2, total_l, total_m), 0.0);
                                }
                            }
                        }
                    }
                }
            }
        }

        // triangle rule
        assert_eq!(clebsch_gordan_coefficient(1, 0, 1, 0, 3, 0), 0.0);
        assert_eq!(clebsch_gordan_coefficient(3, 0, 1, 0, 1, 0), 0.0);

        // |m| > l
        assert_eq!(clebsch_gordan_coefficient(1, 2, 1, -2, 2, 0), 0.0);
        assert_eq!(clebsch_gordan_coefficient(2, 2, 2, 1, 2, 3), 0.0);

        // negative quantum numbers
        assert_eq!(clebsch_gordan_coefficient(-1, 0, 1, 0, 1, 0), 0.0);
        assert_eq!(clebsch_gordan_coefficient(1, 0, 1, 0, -1, 0), 0.0);
    }

    #[test]
    fn extreme_quantum_numbers() {
        // (l1 + l2 + L + 1)! is out of range
        assert_eq!(clebsch_gordan_coefficient(i32::MAX, 0, i32::MAX, 0, 0, 0), 0.0);
        assert_eq!(clebsch_gordan_coefficient(i32::MAX, 0, 0, 0, i32::MAX, 0), 0.0);
        // m1 + m2 does not fit in an i32
        assert_eq!(clebsch_gordan_coefficient(i32::MAX, i32::MAX, i32::MAX, i32::MAX, i32::MAX, i32::MAX), 0.0);
        // l1 + l2 does not fit in an i32, and L is outside the triangle
        assert_eq!(clebsch_gordan_coefficient(i32::MAX, 0, i32::MAX, 0, -1, 0), 0.0);
        assert_eq!(clebsch_gordan_coefficient(1, 0, 1, 0, 0, i32::MIN), 0.0);

        assert!(triangle_condition(i32::MAX, i32::MAX, i32::MAX));
        assert!(!triangle_condition(i32::MAX, 0, 0));

        // -m3 does not fit in an i32
        assert_eq!(wigner_3j(1, 1, 0, 0, 0, i32::MIN), 0.0);
    }

    #[test]
    fn symmetries() {
        for l1 in 0..5_i32 {
            for l2 in 0..5 {
                for total_l in (l1 - l2).abs()..=(l1 + l2) {
                    let phase = if (l1 + l2 - total_l) % 2 == 0 { 1.0 } else { -1.0 };
                    for m1 in -l1..=l1 {
                        for m2 in -l2..=l2 {
                            let total_m = m1 + m2;
                            let cg = clebsch_gordan_coefficient(l1, m1, l2, m2, total_l, total_m);

                            let exchanged = clebsch_gordan_coefficient(l2, m2, l1, m1, total_l, total_m);
                            assert_abs_diff_eq!(cg, phase * exchanged, epsilon = 1e-12);

                            let reflected = clebsch_gordan_coefficient(l1, -m1, l2, -m2, total_l, -total_m);
                            assert_abs_diff_eq!(cg, phase * reflected, epsilon = 1e-12);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn orthonormality() {
        for l1 in 0..4_i32 {
            for l2 in 0..4 {
                let range = (l1 - l2).abs()..=(l1 + l2);
                for total_l in range.clone() {
                    for other_l in range.clone() {
                        for total_m in -total_l.min(other_l)..=total_l.min(other_l) {
                            let mut overlap = 0.0;
                            for m1 in -l1..=l1 {
                                let m2 = total_m - m1;
                                overlap += clebsch_gordan_coefficient(l1, m1, l2, m2, total_l, total_m)
                                    * clebsch_gordan_coefficient(l1, m1, l2, m2, other_l, total_m);
                            }

                            let expected = if total_l == other_l { 1.0 } else { 0.0 };
                            assert_abs_diff_eq!(overlap, expected, epsilon = 1e-12);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn large_quantum_numbers() {
        let mut norm = 0.0;
        for m1 in -40..=40 {
            norm += clebsch_gordan_coefficient(40, m1, 30, -m1, 50, 0).powi(2);
        }
        assert_abs_diff_eq!(norm, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_wigner_3j() {
        // checked against sympy
        assert_abs_diff_eq!(wigner_3j(2, 6, 4, 0, 0, 0), f64::sqrt(715.0) / 143.0, epsilon = 1e-12);
        assert_abs_diff_eq!(wigner_3j(5, 3, 2, -3, 3, 0), f64::sqrt(330.0) / 165.0, epsilon = 1e-12);
        assert_abs_diff_eq!(wigner_3j(5, 3, 2, -2, 3, -1), -f64::sqrt(330.0) / 330.0, epsilon = 1e-12);
        assert_abs_diff_eq!(wigner_3j(1, 3, 2, 0, 0, 0), -f64::sqrt(105.0) / 35.0, epsilon = 1e-12);
        assert_abs_diff_eq!(wigner_3j(0, 1, 1, 0, 0, 0), -0.5773502691896257, epsilon = 1e-12);
        assert_eq!(wigner_3j(2, 6, 4, 0, 0, 1), 0.0);

        assert_relative_eq!(wigner_3j(100, 100, 100, 100, -100, 0), 2.689688852311291e-13, max_relative = 1e-10);
        // https://github.com/Luthaf/wigners/issues/7
        assert_relative_eq!(wigner_3j(100, 300, 285, 2, -2, 0), 0.001979165708981953, max_relative = 1e-10);
    }

    #[test]
    fn cache_is_transparent() {
        let before = clebsch_gordan_coefficient(4, -2, 3, 1, 5, -1);
        clear_clebsch_gordan_cache();
        let after = clebsch_gordan_coefficient(4, -2, 3, 1, 5, -1);
        assert_eq!(before, after);

        // the reordered coefficient reuses the same cache entry
        let phase = if (4 + 3 - 5) % 2 == 0 { 1.0 } else { -1.0 };
        assert_eq!(clebsch_gordan_coefficient(3, -1, 4, 2, 5, 1), phase * before);
    }
}
