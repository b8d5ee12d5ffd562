//! Black-Scholes gamma and delta used by the exposure calculations.

use statrs::distribution::{ContinuousCDF, Normal};
use std::f64::consts::PI;

/// Standard normal PDF
pub fn norm_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}

/// Standard normal CDF
pub fn norm_cdf(x: f64) -> f64 {
    match Normal::new(0.0, 1.0) {
        Ok(normal) => normal.cdf(x),
        Err(_) => 0.5,
    }
}

/// Black-Scholes d1 (no dividend yield)
pub fn d1(spot: f64, strike: f64, time: f64, rate: f64, vol: f64) -> f64 {
    ((spot / strike).ln() + (rate + 0.5 * vol * vol) * time) / (vol * time.sqrt())
}

fn has_model_inputs(spot: f64, strike: f64, time: f64, vol: f64) -> bool {
    time > 0.0 && vol > 0.0 && spot > 0.0 && strike > 0.0
}

/// Gamma, identical for calls and puts. Degenerate inputs give 0.
pub fn gamma(spot: f64, strike: f64, time: f64, rate: f64, vol: f64) -> f64 {
    if !has_model_inputs(spot, strike, time, vol) {
        return 0.0;
    }

    let d1 = d1(spot, strike, time, rate, vol);
    let g = norm_pdf(d1) / (spot * vol * time.sqrt());

    if g.is_finite() { g } else { 0.0 }
}

pub fn call_delta(spot: f64, strike: f64, time: f64, rate: f64, vol: f64) -> f64 {
    if !has_model_inputs(spot, strike, time, vol) {
        return if spot > strike { 1.0 } else { 0.0 };
    }
    norm_cdf(d1(spot, strike, time, rate, vol))
}

pub fn put_delta(spot: f64, strike: f64, time: f64, rate: f64, vol: f64) -> f64 {
    if !has_model_inputs(spot, strike, time, vol) {
        return if spot < strike { -1.0 } else { 0.0 };
    }
    -norm_cdf(-d1(spot, strike, time, rate, vol))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_norm_distribution() {
        assert!((norm_cdf(0.0) - 0.5).abs() < EPS);
        assert!((norm_cdf(1.96) - 0.975_002_104_851_780_1).abs() < 1e-7);
        assert!((norm_pdf(0.0) - 0.398_942_280_401_432_7).abs() < EPS);
        assert!((norm_cdf(-1.0) + norm_cdf(1.0) - 1.0).abs() < EPS);
    }

    #[test]
    fn test_gamma_atm_value() {
        // S = K = 100, T = 1, r = 0, vol = 0.2 -> d1 = 0.1
        let g = gamma(100.0, 100.0, 1.0, 0.0, 0.2);
        let expected = norm_pdf(0.1) / (100.0 * 0.2);
        assert!((g - expected).abs() < EPS);
    }

    #[test]
    fn test_gamma_degenerate_inputs() {
        assert_eq!(gamma(100.0, 100.0, 0.0, 0.07, 0.2), 0.0);
        assert_eq!(gamma(100.0, 100.0, 0.5, 0.07, 0.0), 0.0);
        assert_eq!(gamma(100.0, 0.0, 0.5, 0.07, 0.2), 0.0);
        assert_eq!(gamma(-5.0, 100.0, 0.5, 0.07, 0.2), 0.0);
    }

    #[test]
    fn test_put_call_delta_parity() {
        let (s, k, t, r, v) = (23_450.0, 23_500.0, 7.0 / 365.0, 0.07, 0.14);
        let c = call_delta(s, k, t, r, v);
        let p = put_delta(s, k, t, r, v);
        assert!((c - p - 1.0).abs() < 1e-9);
        assert!(c > 0.0 && c < 1.0);
    }

    #[test]
    fn test_delta_without_time_is_intrinsic() {
        assert_eq!(call_delta(110.0, 100.0, 0.0, 0.07, 0.2), 1.0);
        assert_eq!(call_delta(90.0, 100.0, 0.0, 0.07, 0.2), 0.0);
        assert_eq!(put_delta(90.0, 100.0, 0.0, 0.07, 0.2), -1.0);
        assert_eq!(put_delta(110.0, 100.0, 0.0, 0.07, 0.2), 0.0);
    }
}
