//! Projection generator: runs the period aggregator over the full horizon

use crate::record::BusinessRecord;
use super::cashflows::ProjectionResult;
use super::period::aggregate_period;

/// Run the projection for every period in `meta.periods`.
///
/// All periods are computed even after break-even; metrics need the full series.
pub fn project(record: &BusinessRecord) -> ProjectionResult {
    let periods = record.meta.periods;
    let mut result = ProjectionResult {
        periods: Vec::with_capacity(periods as usize),
        cumulative_cash_flow: Vec::with_capacity(periods as usize),
        break_even_period: None,
    };

    for period in 1..=periods {
        result.add_row(aggregate_period(record, period));
    }

    log::debug!(
        "projected '{}' over {} periods: final cumulative {:.2}, break-even {:?}",
        record.meta.title,
        periods,
        result.final_cumulative(),
        result.break_even_period
    );

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Amount, BusinessModel, CapexEntry, CapexItem, OpexItem, Segment, VolumeSpec};
    use approx::assert_relative_eq;

    fn single_segment_record() -> BusinessRecord {
        let mut record = BusinessRecord::new(BusinessModel::Recurring, 3);
        record.pricing.avg_unit_price = Amount::new(10.0);
        record.unit_economics.cogs_pct = 0.2;
        record.financial.interest_rate = 0.10;
        record.customers.segments.push(Segment {
            id: "core".into(),
            label: "Core".into(),
            volume: VolumeSpec::geometric(100.0, 0.05),
        });
        record
    }

    #[test]
    fn test_three_period_geometric_projection() {
        let result = project(&single_segment_record());

        let revenue: Vec<f64> = result.periods.iter().map(|r| r.revenue_or_benefit).collect();
        let cogs: Vec<f64> = result.periods.iter().map(|r| r.cogs).collect();
        let net = result.net_cash_flows();

        for (actual, expected) in revenue.iter().zip([1000.0, 1050.0, 1102.5]) {
            assert_relative_eq!(*actual, expected, max_relative = 1e-12);
        }
        for (actual, expected) in cogs.iter().zip([200.0, 210.0, 220.5]) {
            assert_relative_eq!(*actual, expected, max_relative = 1e-12);
        }
        for (actual, expected) in net.iter().zip([800.0, 840.0, 882.0]) {
            assert_relative_eq!(*actual, expected, max_relative = 1e-12);
        }
        for (actual, expected) in result.cumulative_cash_flow.iter().zip([800.0, 1640.0, 2522.0]) {
            assert_relative_eq!(*actual, expected, max_relative = 1e-12);
        }
        assert_eq!(result.break_even_period, Some(1));
    }

    #[test]
    fn test_cumulative_is_running_sum() {
        let mut record = single_segment_record();
        record.meta.periods = 48;
        record.opex.push(OpexItem::flat("Team", 1500.0));
        record.capex.push(CapexItem {
            name: "Platform".into(),
            timeline: vec![CapexEntry { period: 1, amount: 20_000.0 }],
        });

        let result = project(&record);
        assert_eq!(result.periods.len(), 48);
        assert_eq!(result.cumulative_cash_flow.len(), 48);

        let mut previous = 0.0;
        for (row, &cumulative) in result.periods.iter().zip(&result.cumulative_cash_flow) {
            assert_eq!(cumulative, previous + row.net_cash_flow);
            previous = cumulative;
        }

        let break_even = result.break_even_period.expect("growth should pay back the platform");
        let idx = break_even as usize - 1;
        assert!(result.cumulative_cash_flow[idx] > 0.0);
        assert!(result.cumulative_cash_flow[..idx].iter().all(|&c| c <= 0.0));
    }

    #[test]
    fn test_never_breaks_even() {
        let mut record = BusinessRecord::new(BusinessModel::Recurring, 12);
        record.opex.push(OpexItem::flat("Office", 100.0));

        let result = project(&record);
        assert_eq!(result.periods.len(), 12);
        assert_eq!(result.break_even_period, None);
        assert_eq!(result.final_cumulative(), -1200.0);
    }
}
