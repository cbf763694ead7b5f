//! Student's t-distribution and Welch's unequal-variance t-test.
//!
//! The CDF is evaluated through the regularized incomplete beta function,
//! computed with the modified Lentz continued fraction:
//!
//! ```text
//! P(|T| > t) = I_x(df/2, 1/2),   x = df / (df + t^2)
//! ```

use serde::Serialize;

use crate::analyzers::types::MetricStats;

/// Iteration cap for the continued fraction.
const MAX_ITERATIONS: usize = 1000;
/// Convergence tolerance on successive convergents.
const EPSILON: f64 = 1e-15;
/// Smallest magnitude allowed for Lentz denominators.
const FPMIN: f64 = 1e-300;

/// Lanczos coefficients (g = 7, n = 9).
#[allow(clippy::excessive_precision)]
const LANCZOS: [f64; 9] = [
    0.99999999999980993,
    676.5203681218851,
    -1259.1392167224028,
    771.32342877765313,
    -176.61502916214059,
    12.507343278686905,
    -0.13857109526572012,
    9.9843695780195716e-6,
    1.5056327351493116e-7,
];

/// Outcome of a Welch's t-test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WelchTest {
    /// `(mean_b - mean_a) / standard_error`
    pub t: f64,
    /// Welch–Satterthwaite degrees of freedom
    pub degrees_of_freedom: f64,
    /// Two-tailed p-value
    pub p_value: f64,
}

impl WelchTest {
    fn degenerate() -> Self {
        WelchTest {
            t: f64::NAN,
            degrees_of_freedom: f64::NAN,
            p_value: f64::NAN,
        }
    }
}

/// Welch's two-sample t-test from per-group summary statistics.
///
/// A group with fewer than two samples, or a zero standard error, makes the
/// statistic undefined; the result then carries `NaN` in every field.
pub fn welch_t_test(a: &MetricStats, b: &MetricStats) -> WelchTest {
    if a.count < 2 || b.count < 2 {
        return WelchTest::degenerate();
    }

    let n_a = a.count as f64;
    let n_b = b.count as f64;
    let se_a = a.variance / n_a;
    let se_b = b.variance / n_b;
    let standard_error = (se_a + se_b).sqrt();

    if !standard_error.is_finite() || standard_error == 0.0 {
        return WelchTest::degenerate();
    }

    let t = (b.mean - a.mean) / standard_error;
    let degrees_of_freedom =
        (se_a + se_b).powi(2) / (se_a.powi(2) / (n_a - 1.0) + se_b.powi(2) / (n_b - 1.0));

    WelchTest {
        t,
        degrees_of_freedom,
        p_value: two_tailed_p_value(t, degrees_of_freedom),
    }
}

/// Two-tailed p-value `P(|T| >= |t|)` for `df` degrees of freedom.
pub fn two_tailed_p_value(t: f64, df: f64) -> f64 {
    if t.is_nan() || df.is_nan() || df <= 0.0 {
        return f64::NAN;
    }
    let x = df / (df + t * t);
    regularized_incomplete_beta(x, df / 2.0, 0.5).clamp(0.0, 1.0)
}

/// Cumulative distribution function of Student's t-distribution.
///
/// Returns `NaN` for a `NaN` argument or a non-positive `df`.
pub fn student_cdf(t: f64, df: f64) -> f64 {
    let tail = two_tailed_p_value(t, df) / 2.0;
    if tail.is_nan() {
        return f64::NAN;
    }
    if t >= 0.0 { 1.0 - tail } else { tail }
}

/// Regularized incomplete beta function `I_x(a, b)`.
pub fn regularized_incomplete_beta(x: f64, a: f64, b: f64) -> f64 {
    if x.is_nan() || a <= 0.0 || b <= 0.0 {
        return f64::NAN;
    }
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    let ln_front = ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln();
    let front = ln_front.exp();

    // The continued fraction converges fastest below the distribution mean;
    // above it, use the symmetry I_x(a, b) = 1 - I_{1-x}(b, a).
    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_continued_fraction(x, a, b) / a
    } else {
        1.0 - front * beta_continued_fraction(1.0 - x, b, a) / b
    }
}

fn beta_continued_fraction(x: f64, a: f64, b: f64) -> f64 {
    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;

    let mut c = 1.0;
    let mut d = clamp_tiny(1.0 - qab * x / qap).recip();
    let mut h = d;

    for m in 1..=MAX_ITERATIONS {
        let m = m as f64;
        let m2 = 2.0 * m;

        // even step
        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = clamp_tiny(1.0 + aa * d).recip();
        c = clamp_tiny(1.0 + aa / c);
        h *= d * c;

        // odd step
        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = clamp_tiny(1.0 + aa * d).recip();
        c = clamp_tiny(1.0 + aa / c);
        let delta = d * c;
        h *= delta;

        if (delta - 1.0).abs() < EPSILON {
            break;
        }
    }

    h
}

fn clamp_tiny(v: f64) -> f64 {
    if v.abs() < FPMIN { FPMIN } else { v }
}

/// Natural log of the gamma function (Lanczos approximation).
pub fn ln_gamma(x: f64) -> f64 {
    if x < 0.5 {
        // reflection
        let pi = std::f64::consts::PI;
        return (pi / (pi * x).sin()).ln() - ln_gamma(1.0 - x);
    }

    let x = x - 1.0;
    let t = x + 7.5;
    let series = LANCZOS
        .iter()
        .enumerate()
        .skip(1)
        .fold(LANCZOS[0], |acc, (i, c)| acc + c / (x + i as f64));

    0.5 * (2.0 * std::f64::consts::PI).ln() + (x + 0.5) * t.ln() - t + series.ln()
}
