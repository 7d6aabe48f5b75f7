//! Internal Rate of Return (IRR) calculation
//!
//! Solves for the periodic rate `r` with `Σ cf[t] / (1 + r)^t = 0`, t = 1..N,
//! using Newton-Raphson with a bisection fallback over a bounded range.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lower bound of the periodic rate search range (-99% per period)
pub const IRR_RATE_MIN: f64 = -0.99;
/// Upper bound of the periodic rate search range (1000% per period)
pub const IRR_RATE_MAX: f64 = 10.0;
/// Convergence tolerance on the rate step and on NPV
pub const IRR_TOLERANCE: f64 = 1e-10;
/// Iteration budget for each of Newton-Raphson and bisection
pub const IRR_MAX_ITERATIONS: u32 = 1000;

/// Cash flows below this magnitude count as zero for the sign-change test
const SIGN_EPSILON: f64 = 1e-10;

/// Why an IRR could not be produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IrrError {
    /// Series is all non-negative or all non-positive
    #[error("IRR undefined: cash flows never change sign")]
    NoSignChange,

    /// Root-finder exhausted its budget or the range holds no root
    #[error("IRR did not converge after {iterations} iterations")]
    NoConvergence { iterations: u32 },
}

/// Calculate the IRR of a series of cash flows.
///
/// # Arguments
/// * `cashflows` - Cash flows for periods 1..N (positive = inflow, negative = outflow)
/// * `periods_per_year` - Number of periods per year (12 for monthly)
///
/// # Returns
/// Annualized IRR as a decimal (e.g., 0.05 for 5%), or the reason none was found
pub fn calculate_irr(cashflows: &[f64], periods_per_year: u32) -> Result<f64, IrrError> {
    let periodic = periodic_irr(cashflows)?;
    Ok(annualize(periodic, periods_per_year))
}

/// Periodic (unannualized) IRR
pub fn periodic_irr(cashflows: &[f64]) -> Result<f64, IrrError> {
    let has_positive = cashflows.iter().any(|&cf| cf > SIGN_EPSILON);
    let has_negative = cashflows.iter().any(|&cf| cf < -SIGN_EPSILON);
    if !has_positive || !has_negative {
        return Err(IrrError::NoSignChange);
    }

    // Newton-Raphson from 5% annual / 12
    let mut rate = 0.05 / 12.0;
    let scale = cashflows.iter().map(|cf| cf.abs()).sum::<f64>();

    for _ in 0..IRR_MAX_ITERATIONS {
        let (npv, dnpv) = npv_and_derivative(cashflows, rate);

        if dnpv.abs() < 1e-20 || !dnpv.is_finite() {
            // Derivative too small, try bisection instead
            break;
        }

        let new_rate = (rate - npv / dnpv).clamp(IRR_RATE_MIN, IRR_RATE_MAX);

        if (new_rate - rate).abs() < IRR_TOLERANCE {
            // A step pinned against a bound is not a root
            if npv_at_rate(cashflows, new_rate).abs() <= IRR_TOLERANCE * scale.max(1.0) {
                return Ok(new_rate);
            }
            break;
        }

        rate = new_rate;
    }

    calculate_irr_bisection(cashflows)
}

/// Convert a periodic rate to an annual effective rate
pub fn annualize(periodic_rate: f64, periods_per_year: u32) -> f64 {
    (1.0 + periodic_rate).powi(periods_per_year as i32) - 1.0
}

/// NPV at a periodic rate, first cash flow discounted one period
pub fn npv_at_rate(cashflows: &[f64], rate: f64) -> f64 {
    let factor = 1.0 + rate;
    cashflows
        .iter()
        .enumerate()
        .map(|(t, &cf)| cf / factor.powi(t as i32 + 1))
        .sum()
}

/// Calculate NPV and its derivative with respect to rate
fn npv_and_derivative(cashflows: &[f64], rate: f64) -> (f64, f64) {
    let factor = 1.0 + rate;
    let mut npv = 0.0;
    let mut dnpv = 0.0;

    for (idx, &cf) in cashflows.iter().enumerate() {
        let t = idx as i32 + 1;
        npv += cf / factor.powi(t);
        dnpv -= (t as f64) * cf / factor.powi(t + 1);
    }

    (npv, dnpv)
}

/// Fallback IRR calculation using bisection over the full search range
fn calculate_irr_bisection(cashflows: &[f64]) -> Result<f64, IrrError> {
    let mut low = IRR_RATE_MIN;
    let mut high = IRR_RATE_MAX;

    let mut npv_low = npv_at_rate(cashflows, low);
    let npv_high = npv_at_rate(cashflows, high);

    // No bracketed root in this interval
    if npv_low * npv_high > 0.0 {
        return Err(IrrError::NoConvergence { iterations: 0 });
    }

    for iteration in 1..=IRR_MAX_ITERATIONS {
        let mid = (low + high) / 2.0;
        let npv_mid = npv_at_rate(cashflows, mid);

        if npv_mid.abs() < IRR_TOLERANCE || (high - low) / 2.0 < IRR_TOLERANCE {
            log::trace!("IRR bisection converged after {} iterations", iteration);
            return Ok(mid);
        }

        if npv_mid * npv_low < 0.0 {
            high = mid;
        } else {
            low = mid;
            npv_low = npv_mid;
        }
    }

    Err(IrrError::NoConvergence {
        iterations: IRR_MAX_ITERATIONS,
    })
}
