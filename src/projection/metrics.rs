//! Investment metrics derived from a projection

use serde::{Deserialize, Serialize};
use super::cashflows::ProjectionResult;
use super::irr::{calculate_irr, IrrError};
use crate::record::PERIODS_PER_YEAR;

/// Scalar investment metrics for one projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Net present value at the monthly equivalent of the annual discount rate
    pub npv: f64,

    /// Annualized IRR, or why it is undefined
    pub irr: Result<f64, IrrError>,

    /// First period with positive cumulative cash flow
    pub payback_period: Option<u32>,

    /// Lowest cumulative cash flow, capped at zero (never positive)
    pub peak_funding_required: f64,
}

impl Metrics {
    /// IRR as an option, dropping the failure reason
    pub fn irr_value(&self) -> Option<f64> {
        self.irr.ok()
    }
}

/// Compute NPV, IRR, payback and peak funding from a projection.
///
/// An IRR failure is carried in the result; the other metrics are always produced.
pub fn compute_metrics(projection: &ProjectionResult, annual_discount_rate: f64) -> Metrics {
    let cashflows = projection.net_cash_flows();
    let irr = calculate_irr(&cashflows, PERIODS_PER_YEAR);

    if let Err(err) = &irr {
        log::debug!("IRR unavailable: {}", err);
    }

    Metrics {
        npv: npv(&cashflows, annual_discount_rate),
        irr,
        payback_period: projection.break_even_period,
        peak_funding_required: peak_funding(&projection.cumulative_cash_flow),
    }
}

/// NPV of monthly cash flows, period 1 discounted one month
pub fn npv(cashflows: &[f64], annual_discount_rate: f64) -> f64 {
    npv_at_monthly_rate(cashflows, annual_discount_rate / PERIODS_PER_YEAR as f64)
}

/// NPV at an explicit monthly rate
pub fn npv_at_monthly_rate(cashflows: &[f64], monthly_rate: f64) -> f64 {
    super::irr::npv_at_rate(cashflows, monthly_rate)
}

/// Most negative cumulative cash flow, or zero if it never dips below zero
pub fn peak_funding(cumulative: &[f64]) -> f64 {
    cumulative.iter().copied().fold(0.0, f64::min)
}
