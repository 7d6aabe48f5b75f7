//! Period aggregator: benefit, costs and net cash flow for one period

use crate::record::{
    BusinessRecord, CostSavings, ImplementationTimeline, OpexItem, Pricing,
};
use super::cashflows::PeriodResult;
use super::volume::volume_at;

/// Calculate all cash flow components for a single period (1-indexed).
///
/// Never fails for a deserializable record; absent sections contribute zero.
pub fn aggregate_period(record: &BusinessRecord, period: u32) -> PeriodResult {
    let mut row = PeriodResult::new(period);

    // Volume is computed for every model so per-customer opex still applies
    row.volume_by_segment = record
        .customers
        .segments
        .iter()
        .map(|segment| volume_at(&segment.volume, period))
        .collect();
    row.total_volume = row.volume_by_segment.iter().sum();

    if record.business_model().is_revenue_driven() {
        calculate_revenue(record, period, &mut row);
    } else {
        calculate_benefit(record.cost_savings.as_ref(), period, &mut row);
    }

    row.opex = record
        .opex
        .iter()
        .map(|item| opex_amount(item, row.revenue_or_benefit, row.total_volume))
        .sum();

    row.capex = record
        .capex
        .iter()
        .flat_map(|item| item.timeline.iter())
        .filter(|entry| entry.period == period)
        .map(|entry| entry.amount)
        .sum();

    row.net_cash_flow = row.revenue_or_benefit - row.cogs - row.opex - row.capex;
    row
}

/// Volume × price, with COGS as a share of revenue
fn calculate_revenue(record: &BusinessRecord, period: u32, row: &mut PeriodResult) {
    row.price = effective_price(&record.pricing, period);
    row.revenue_or_benefit = row.total_volume * row.price;
    row.cogs = row.revenue_or_benefit * record.unit_economics.cogs_pct;
}

/// Phased cost reductions plus efficiency gains; no goods sold
fn calculate_benefit(savings: Option<&CostSavings>, period: u32, row: &mut PeriodResult) {
    let Some(savings) = savings else {
        return;
    };

    row.cost_savings_benefit = savings
        .baseline_costs
        .iter()
        .map(|cost| {
            ramp_in_fraction(cost.implementation_timeline.as_ref(), period)
                * cost.current_monthly_cost
                * cost.savings_potential_pct
        })
        .sum();

    row.efficiency_benefit = savings
        .efficiency_gains
        .iter()
        .map(|gain| {
            ramp_in_fraction(gain.implementation_timeline.as_ref(), period)
                * (gain.improved_value - gain.baseline_value)
                * gain.value_per_unit
        })
        .sum();

    row.revenue_or_benefit = row.cost_savings_benefit + row.efficiency_benefit;
    row.cogs = 0.0;
}

/// Unit price in effect for a period.
///
/// Priority: per-period override, then the year's absolute price, then the
/// year's multiplier on the average price, then the flat average price.
pub fn effective_price(pricing: &Pricing, period: u32) -> f64 {
    if let Some(ov) = pricing.period_overrides.iter().find(|o| o.period == period) {
        return ov.price;
    }

    let base = pricing.avg_unit_price.value;
    let year = BusinessRecord::year_index(period);

    match pricing.yearly_adjustments.iter().find(|a| a.year == year) {
        Some(adj) => match (adj.price, adj.multiplier) {
            (Some(price), _) => price,
            (None, Some(multiplier)) => base * multiplier,
            (None, None) => base,
        },
        None => base,
    }
}

/// Share of full benefit realised in `period` under a linear phase-in.
///
/// Zero before `start_month`, one from the full-implementation month on,
/// linear in between. No timeline means full benefit from period 1.
pub fn ramp_in_fraction(timeline: Option<&ImplementationTimeline>, period: u32) -> f64 {
    let Some(timeline) = timeline else {
        return 1.0;
    };

    // u64 so that extreme months cannot overflow
    let period = u64::from(period);
    let start = u64::from(timeline.start_month);
    let full = timeline
        .full_implementation_month
        .map(u64::from)
        .unwrap_or(start + u64::from(timeline.ramp_up_months));

    if period < start {
        0.0
    } else if period >= full {
        1.0
    } else {
        // full > period >= start, so the span is at least 2
        (period - start + 1) as f64 / (full - start + 1) as f64
    }
}

/// Fixed plus variable operating expense for one item
fn opex_amount(item: &OpexItem, revenue_or_benefit: f64, total_volume: f64) -> f64 {
    match &item.cost_structure {
        Some(cs) => {
            cs.fixed_component.unwrap_or(0.0)
                + cs.variable_revenue_rate.unwrap_or(0.0) * revenue_or_benefit
                + cs.variable_per_customer.unwrap_or(0.0) * total_volume
        }
        None => item.value.as_ref().map(|amount| amount.value).unwrap_or(0.0),
    }
}
