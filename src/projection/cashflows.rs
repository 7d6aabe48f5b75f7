//! Cashflow output structures for projections

use crate::record::BusinessRecord;
use serde::{Deserialize, Serialize};

/// A single row of projection output for one period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodResult {
    // Timing
    pub period: u32,
    pub year: u32,
    pub month_in_year: u32,

    // Volume, in segment order
    pub volume_by_segment: Vec<f64>,
    pub total_volume: f64,

    // Benefit
    pub price: f64,
    pub revenue_or_benefit: f64,
    pub cost_savings_benefit: f64,
    pub efficiency_benefit: f64,

    // Costs
    pub cogs: f64,
    pub opex: f64,
    pub capex: f64,

    // Summary
    pub net_cash_flow: f64,
}

impl PeriodResult {
    /// Create an empty row for a period
    pub fn new(period: u32) -> Self {
        Self {
            period,
            year: BusinessRecord::year_of(period),
            month_in_year: BusinessRecord::month_in_year(period),
            volume_by_segment: Vec::new(),
            total_volume: 0.0,
            price: 0.0,
            revenue_or_benefit: 0.0,
            cost_savings_benefit: 0.0,
            efficiency_benefit: 0.0,
            cogs: 0.0,
            opex: 0.0,
            capex: 0.0,
            net_cash_flow: 0.0,
        }
    }

    pub fn gross_margin(&self) -> f64 {
        self.revenue_or_benefit - self.cogs
    }
}

/// Complete projection result
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectionResult {
    /// Per-period rows
    pub periods: Vec<PeriodResult>,

    /// Running total of net cash flow, aligned with `periods`
    pub cumulative_cash_flow: Vec<f64>,

    /// First period with positive cumulative cash flow
    pub break_even_period: Option<u32>,
}

impl ProjectionResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row, advancing the cumulative cash flow and break-even
    pub fn add_row(&mut self, row: PeriodResult) {
        let cumulative = self.final_cumulative() + row.net_cash_flow;
        if self.break_even_period.is_none() && cumulative > 0.0 {
            self.break_even_period = Some(row.period);
        }
        self.cumulative_cash_flow.push(cumulative);
        self.periods.push(row);
    }

    /// Net cash flow series, period 1 first
    pub fn net_cash_flows(&self) -> Vec<f64> {
        self.periods.iter().map(|r| r.net_cash_flow).collect()
    }

    pub fn final_cumulative(&self) -> f64 {
        self.cumulative_cash_flow.last().copied().unwrap_or(0.0)
    }

    /// Get summary statistics
    pub fn summary(&self) -> ProjectionSummary {
        ProjectionSummary {
            total_periods: self.periods.len() as u32,
            total_revenue_or_benefit: self.periods.iter().map(|r| r.revenue_or_benefit).sum(),
            total_cogs: self.periods.iter().map(|r| r.cogs).sum(),
            total_gross_margin: self.periods.iter().map(PeriodResult::gross_margin).sum(),
            total_opex: self.periods.iter().map(|r| r.opex).sum(),
            total_capex: self.periods.iter().map(|r| r.capex).sum(),
            total_net_cash_flow: self.periods.iter().map(|r| r.net_cash_flow).sum(),
            final_cumulative: self.final_cumulative(),
            break_even_period: self.break_even_period,
        }
    }

    /// Roll periods up into projection years. A trailing partial year is kept.
    pub fn annual_rollup(&self) -> Vec<AnnualRow> {
        let mut years: Vec<AnnualRow> = Vec::new();

        for (row, &cumulative) in self.periods.iter().zip(&self.cumulative_cash_flow) {
            if years.last().map(|y| y.year) != Some(row.year) {
                years.push(AnnualRow {
                    year: row.year,
                    ..Default::default()
                });
            }
            if let Some(agg) = years.last_mut() {
                agg.periods += 1;
                agg.total_volume += row.total_volume;
                agg.revenue_or_benefit += row.revenue_or_benefit;
                agg.cogs += row.cogs;
                agg.opex += row.opex;
                agg.capex += row.capex;
                agg.net_cash_flow += row.net_cash_flow;
                agg.closing_cumulative = cumulative;
            }
        }

        years
    }
}

/// Summary statistics for a projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionSummary {
    pub total_periods: u32,
    pub total_revenue_or_benefit: f64,
    pub total_cogs: f64,
    pub total_gross_margin: f64,
    pub total_opex: f64,
    pub total_capex: f64,
    pub total_net_cash_flow: f64,
    pub final_cumulative: f64,
    pub break_even_period: Option<u32>,
}

/// One projection year of aggregated cash flows
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnnualRow {
    pub year: u32,
    pub periods: u32,
    pub total_volume: f64,
    pub revenue_or_benefit: f64,
    pub cogs: f64,
    pub opex: f64,
    pub capex: f64,
    pub net_cash_flow: f64,
    pub closing_cumulative: f64,
}
