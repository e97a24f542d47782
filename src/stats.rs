//! Sample statistics and the Student t distribution.
//!
//! The t-test p-value is computed through the regularized incomplete beta
//! function:
//! ```text
//! P(|T| > t) = I_x(df / 2, 1 / 2),  x = df / (df + t²)
//! ```

use thiserror::Error;

/// Lanczos approximation coefficients (g = 7, n = 9).
const LANCZOS_G: f64 = 7.0;
const LANCZOS_COEFFS: [f64; 9] = [
    0.999_999_999_999_809_93,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_13,
    -176.615_029_162_140_59,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_571_6e-6,
    1.505_632_735_149_311_6e-7,
];

/// Iteration cap and tolerance for the continued fraction.
const CF_MAX_ITERATIONS: usize = 300;
const CF_EPSILON: f64 = 1e-15;
const CF_TINY: f64 = 1e-300;

/// Errors from statistical routines.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    #[error("need at least {required} values, got {available}")]
    InsufficientData { available: usize, required: usize },

    #[error("degrees of freedom must be positive: {0}")]
    BadDegreesOfFreedom(f64),
}

/// Result of a one-sample t-test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TTest {
    pub mean: f64,
    pub std_dev: f64,
    pub t_statistic: f64,
    pub degrees_of_freedom: f64,
    pub p_value: f64,
}

/// Arithmetic mean. Returns None for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Unbiased sample variance (n - 1 denominator). Needs two values.
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some(ss / (values.len() - 1) as f64)
}

/// Two-sided one-sample Student t-test of `values` against `population_mean`.
///
/// With zero sample variance the statistic is undefined; the p-value is then
/// 1.0 if the sample mean equals the hypothesized mean and 0.0 otherwise.
pub fn one_sample_t_test(values: &[f64], population_mean: f64) -> Result<TTest, StatsError> {
    let n = values.len();
    let (Some(m), Some(var)) = (mean(values), sample_variance(values)) else {
        return Err(StatsError::InsufficientData {
            available: n,
            required: 2,
        });
    };

    let std_dev = var.sqrt();
    let df = (n - 1) as f64;
    let diff = m - population_mean;

    let (t_statistic, p_value) = if std_dev == 0.0 {
        if diff == 0.0 {
            (0.0, 1.0)
        } else {
            (diff.signum() * f64::INFINITY, 0.0)
        }
    } else {
        let t = diff / (std_dev / (n as f64).sqrt());
        (t, students_t_two_sided_p(t, df)?)
    };

    Ok(TTest {
        mean: m,
        std_dev,
        t_statistic,
        degrees_of_freedom: df,
        p_value,
    })
}

/// Two-sided tail probability P(|T| > |t|) for Student's t with `df` degrees of freedom.
pub fn students_t_two_sided_p(t: f64, df: f64) -> Result<f64, StatsError> {
    if df <= 0.0 || !df.is_finite() {
        return Err(StatsError::BadDegreesOfFreedom(df));
    }
    if t.is_infinite() {
        return Ok(0.0);
    }
    let x = df / (df + t * t);
    Ok(regularized_incomplete_beta(df / 2.0, 0.5, x).clamp(0.0, 1.0))
}

/// Natural log of the gamma function for `x > 0` (Lanczos approximation).
pub fn ln_gamma(x: f64) -> f64 {
    if x < 0.5 {
        // Reflection formula
        let pi = std::f64::consts::PI;
        return (pi / (pi * x).sin()).ln() - ln_gamma(1.0 - x);
    }

    let x = x - 1.0;
    let mut a = LANCZOS_COEFFS[0];
    let t = x + LANCZOS_G + 0.5;
    for (i, &c) in LANCZOS_COEFFS.iter().enumerate().skip(1) {
        a += c / (x + i as f64);
    }

    0.5 * (2.0 * std::f64::consts::PI).ln() + (x + 0.5) * t.ln() - t + a.ln()
}

/// Regularized incomplete beta function I_x(a, b).
pub fn regularized_incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    let ln_front = ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln();
    let front = ln_front.exp();

    // The continued fraction converges fastest below the mean of the distribution
    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_continued_fraction(a, b, x) / a
    } else {
        1.0 - front * beta_continued_fraction(b, a, 1.0 - x) / b
    }
}

/// Lentz evaluation of the incomplete beta continued fraction.
fn beta_continued_fraction(a: f64, b: f64, x: f64) -> f64 {
    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;

    let mut c = 1.0;
    let mut d = 1.0 - qab * x / qap;
    if d.abs() < CF_TINY {
        d = CF_TINY;
    }
    d = 1.0 / d;
    let mut h = d;

    for m in 1..=CF_MAX_ITERATIONS {
        let m = m as f64;
        let m2 = 2.0 * m;

        // Even step
        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 + aa * d;
        if d.abs() < CF_TINY {
            d = CF_TINY;
        }
        c = 1.0 + aa / c;
        if c.abs() < CF_TINY {
            c = CF_TINY;
        }
        d = 1.0 / d;
        h *= d * c;

        // Odd step
        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 + aa * d;
        if d.abs() < CF_TINY {
            d = CF_TINY;
        }
        c = 1.0 + aa / c;
        if c.abs() < CF_TINY {
            c = CF_TINY;
        }
        d = 1.0 / d;
        let delta = d * c;
        h *= delta;

        if (delta - 1.0).abs() < CF_EPSILON {
            break;
        }
    }

    h
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tolerance: f64) -> bool {
        (a - b).abs() < tolerance
    }

    #[test]
    fn test_mean_and_variance() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&values), Some(5.0));
        // Sum of squares 32, n - 1 = 7
        assert!(approx_eq(sample_variance(&values).unwrap(), 32.0 / 7.0, 1e-12));
        assert_eq!(mean(&[]), None);
        assert_eq!(sample_variance(&[1.0]), None);
    }

    #[test]
    fn test_ln_gamma_known_values() {
        // Γ(1) = Γ(2) = 1, Γ(5) = 24, Γ(0.5) = √π
        assert!(approx_eq(ln_gamma(1.0), 0.0, 1e-12));
        assert!(approx_eq(ln_gamma(2.0), 0.0, 1e-12));
        assert!(approx_eq(ln_gamma(5.0), 24.0_f64.ln(), 1e-10));
        assert!(approx_eq(
            ln_gamma(0.5),
            std::f64::consts::PI.sqrt().ln(),
            1e-10
        ));
    }

    #[test]
    fn test_incomplete_beta_bounds_and_symmetry() {
        assert_eq!(regularized_incomplete_beta(2.0, 3.0, 0.0), 0.0);
        assert_eq!(regularized_incomplete_beta(2.0, 3.0, 1.0), 1.0);
        // I_x(a, b) = 1 - I_{1-x}(b, a)
        let lhs = regularized_incomplete_beta(2.5, 1.5, 0.3);
        let rhs = 1.0 - regularized_incomplete_beta(1.5, 2.5, 0.7);
        assert!(approx_eq(lhs, rhs, 1e-12));
        // I_x(1, 1) = x
        assert!(approx_eq(regularized_incomplete_beta(1.0, 1.0, 0.42), 0.42, 1e-12));
    }

    #[test]
    fn test_students_t_p_values() {
        // t = 0 is the center of the distribution
        assert!(approx_eq(students_t_two_sided_p(0.0, 6.0).unwrap(), 1.0, 1e-12));
        // Cauchy (df = 1): P(|T| > 1) = 0.5
        assert!(approx_eq(students_t_two_sided_p(1.0, 1.0).unwrap(), 0.5, 1e-10));
        // Critical value for df = 6 at the 5% level is 2.446912
        assert!(approx_eq(students_t_two_sided_p(2.446912, 6.0).unwrap(), 0.05, 1e-5));
        // Symmetric in t
        let pos = students_t_two_sided_p(1.7, 4.0).unwrap();
        let neg = students_t_two_sided_p(-1.7, 4.0).unwrap();
        assert!(approx_eq(pos, neg, 1e-15));
    }

    #[test]
    fn test_students_t_bad_df() {
        assert_eq!(
            students_t_two_sided_p(1.0, 0.0),
            Err(StatsError::BadDegreesOfFreedom(0.0))
        );
    }

    #[test]
    fn test_one_sample_t_test() {
        // mean 2100, sd 100 (values ±100 around the mean), n = 7 → hand-checked
        let values = [2000.0, 2200.0, 2000.0, 2200.0, 2000.0, 2200.0, 2100.0];
        let result = one_sample_t_test(&values, 2000.0).unwrap();

        assert!(approx_eq(result.mean, 2100.0, 1e-9));
        assert_eq!(result.degrees_of_freedom, 6.0);
        let expected_t = 100.0 / (result.std_dev / 7.0_f64.sqrt());
        assert!(approx_eq(result.t_statistic, expected_t, 1e-9));
        assert!(result.p_value > 0.0 && result.p_value < 0.05);
    }

    #[test]
    fn test_one_sample_t_test_zero_variance() {
        let on_target = one_sample_t_test(&[2000.0; 7], 2000.0).unwrap();
        assert_eq!(on_target.p_value, 1.0);
        assert_eq!(on_target.t_statistic, 0.0);

        let off_target = one_sample_t_test(&[3000.0; 7], 2000.0).unwrap();
        assert_eq!(off_target.p_value, 0.0);
        assert!(off_target.t_statistic.is_infinite());
    }

    #[test]
    fn test_one_sample_t_test_needs_two_values() {
        assert_eq!(
            one_sample_t_test(&[2000.0], 2000.0),
            Err(StatsError::InsufficientData {
                available: 1,
                required: 2
            })
        );
    }
}
