//! Scenario runner for sensitivity sweeps
//!
//! Holds a base record and re-runs projection + metrics once per driver
//! candidate value. Every evaluation works on its own overlaid copy of the
//! record, so candidates are evaluated in parallel with no shared state.

use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::drivers::{overlay_path, DriverPath, OverlayError};
use crate::projection::{compute_metrics, project, Metrics, ProjectionResult};
use crate::record::{load_record, BusinessRecord, Driver, RecordError};

/// Projection and metrics for one record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub projection: ProjectionResult,
    pub metrics: Metrics,
}

/// Run the projection and compute metrics at the given annual discount rate
pub fn evaluate(record: &BusinessRecord, annual_discount_rate: f64) -> Evaluation {
    let projection = project(record);
    let metrics = compute_metrics(&projection, annual_discount_rate);
    Evaluation { projection, metrics }
}

/// Which discount rate a sweep evaluates each candidate at
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DiscountRate {
    /// The same annual rate for every candidate
    Fixed(f64),
    /// Each overlaid record's own `financial.interest_rate`
    FromRecord,
}

impl DiscountRate {
    fn for_record(&self, record: &BusinessRecord) -> f64 {
        match self {
            DiscountRate::Fixed(rate) => *rate,
            DiscountRate::FromRecord => record.discount_rate(),
        }
    }
}

/// Metrics for one candidate value, or why the override failed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensitivityPoint {
    pub value: f64,
    pub outcome: Result<Metrics, OverlayError>,
}

/// All candidate results for one driver, in candidate order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverSweep {
    pub key: String,
    pub path: String,
    pub points: Vec<SensitivityPoint>,
}

impl DriverSweep {
    /// Successful (value, metrics) pairs
    pub fn successes(&self) -> impl Iterator<Item = (f64, &Metrics)> {
        self.points
            .iter()
            .filter_map(|p| p.outcome.as_ref().ok().map(|m| (p.value, m)))
    }

    pub fn failures(&self) -> usize {
        self.points.iter().filter(|p| p.outcome.is_err()).count()
    }
}

/// NPV range of one driver across its candidates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TornadoBar {
    pub key: String,
    pub low_npv: f64,
    pub high_npv: f64,
    pub swing: f64,
}

/// Result of a sensitivity sweep
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensitivityTable {
    /// Metrics of the un-overlaid record
    pub base: Metrics,
    /// One sweep per driver, in driver order
    pub sweeps: Vec<DriverSweep>,
}

impl SensitivityTable {
    /// Sweep for a driver key
    pub fn get(&self, key: &str) -> Option<&DriverSweep> {
        self.sweeps.iter().find(|s| s.key == key)
    }

    /// Results keyed by driver key
    pub fn by_key(&self) -> BTreeMap<&str, &[SensitivityPoint]> {
        self.sweeps
            .iter()
            .map(|s| (s.key.as_str(), s.points.as_slice()))
            .collect()
    }

    /// Drivers ranked by NPV swing, widest first.
    ///
    /// The base NPV is included in each range, so a driver whose candidates
    /// all failed shows a zero swing at the base value.
    pub fn tornado(&self) -> Vec<TornadoBar> {
        let mut bars: Vec<TornadoBar> = self
            .sweeps
            .iter()
            .map(|sweep| {
                let (low, high) = sweep
                    .successes()
                    .map(|(_, m)| m.npv)
                    .fold((self.base.npv, self.base.npv), |(lo, hi), npv| {
                        (lo.min(npv), hi.max(npv))
                    });
                TornadoBar {
                    key: sweep.key.clone(),
                    low_npv: low,
                    high_npv: high,
                    swing: high - low,
                }
            })
            .collect();

        bars.sort_by(|a, b| b.swing.total_cmp(&a.swing));
        bars
    }
}

/// Sweep every driver's candidates at a fixed annual discount rate
pub fn run_sensitivity(
    record: &BusinessRecord,
    drivers: &[Driver],
    annual_discount_rate: f64,
) -> SensitivityTable {
    sweep(record, drivers, DiscountRate::Fixed(annual_discount_rate))
}

/// Evaluate each (driver, candidate) pair independently and regroup by driver
pub fn sweep(record: &BusinessRecord, drivers: &[Driver], rate: DiscountRate) -> SensitivityTable {
    let base = compute_metrics(&project(record), rate.for_record(record));

    let paths: Vec<Result<DriverPath, OverlayError>> =
        drivers.iter().map(|d| DriverPath::parse(&d.path)).collect();

    let jobs: Vec<(usize, f64)> = drivers
        .iter()
        .enumerate()
        .flat_map(|(idx, d)| d.range.iter().map(move |&value| (idx, value)))
        .collect();

    log::debug!(
        "sensitivity sweep: {} drivers, {} candidate evaluations",
        drivers.len(),
        jobs.len()
    );

    let outcomes: Vec<Result<Metrics, OverlayError>> = jobs
        .par_iter()
        .map(|&(idx, value)| -> Result<Metrics, OverlayError> {
            let path = paths[idx].as_ref().map_err(Clone::clone)?;
            let candidate = overlay_path(record, path, value)?;
            Ok(compute_metrics(&project(&candidate), rate.for_record(&candidate)))
        })
        .collect();

    let mut sweeps: Vec<DriverSweep> = drivers
        .iter()
        .map(|d| DriverSweep {
            key: d.key.clone(),
            path: d.path.clone(),
            points: Vec::with_capacity(d.range.len()),
        })
        .collect();

    for ((idx, value), outcome) in jobs.into_iter().zip(outcomes) {
        match &outcome {
            Err(err) => log::warn!("driver '{}' = {}: {}", drivers[idx].key, value, err),
            Ok(Metrics { irr: Err(err), .. }) => {
                log::warn!("driver '{}' = {}: IRR unavailable: {}", drivers[idx].key, value, err)
            }
            Ok(_) => {}
        }
        sweeps[idx].points.push(SensitivityPoint { value, outcome });
    }

    SensitivityTable { base, sweeps }
}

/// Pre-loaded scenario runner for repeated evaluations of one record
///
/// # Example
/// ```ignore
/// let runner = ScenarioRunner::from_path("plan.json")?;
/// let base = runner.evaluate();
/// let table = runner.run_record_sensitivity();
/// ```
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    base_record: BusinessRecord,
}

impl ScenarioRunner {
    pub fn new(record: BusinessRecord) -> Self {
        Self { base_record: record }
    }

    /// Create runner by loading a record from a JSON file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, RecordError> {
        Ok(Self::new(load_record(path)?))
    }

    /// Evaluate the base record at its own discount rate
    pub fn evaluate(&self) -> Evaluation {
        evaluate(&self.base_record, self.base_record.discount_rate())
    }

    /// Evaluate the base record at an explicit annual discount rate
    pub fn evaluate_at(&self, annual_discount_rate: f64) -> Evaluation {
        evaluate(&self.base_record, annual_discount_rate)
    }

    /// Sweep the given drivers at a fixed discount rate
    pub fn run_sensitivity(&self, drivers: &[Driver], annual_discount_rate: f64) -> SensitivityTable {
        run_sensitivity(&self.base_record, drivers, annual_discount_rate)
    }

    /// Sweep the record's own drivers, each candidate at its own discount rate
    pub fn run_record_sensitivity(&self) -> SensitivityTable {
        sweep(&self.base_record, &self.base_record.drivers, DiscountRate::FromRecord)
    }

    pub fn record(&self) -> &BusinessRecord {
        &self.base_record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::IrrError;
    use crate::record::{Amount, BusinessModel, CapexEntry, CapexItem, OpexItem, Segment, VolumeSpec};
    use approx::assert_relative_eq;

    fn test_record() -> BusinessRecord {
        let mut record = BusinessRecord::new(BusinessModel::Recurring, 36);
        record.pricing.avg_unit_price = Amount::new(50.0);
        record.unit_economics.cogs_pct = 0.3;
        record.financial.interest_rate = 0.12;
        record.customers.segments.push(Segment {
            id: "core".into(),
            label: "Core".into(),
            volume: VolumeSpec::linear(20.0, 5.0),
        });
        record.opex.push(OpexItem::flat("Team", 3000.0));
        record.capex.push(CapexItem {
            name: "Launch".into(),
            timeline: vec![CapexEntry { period: 1, amount: 25_000.0 }],
        });
        record
    }

    fn driver(key: &str, path: &str, range: &[f64]) -> Driver {
        Driver {
            key: key.into(),
            path: path.into(),
            range: range.to_vec(),
            rationale: String::new(),
        }
    }

    #[test]
    fn test_sweep_matches_individual_runs() {
        let record = test_record();
        let drivers = vec![
            driver("price", "pricing.avg_unit_price.value", &[40.0, 50.0, 60.0]),
            driver("cogs", "unit_economics.cogs_pct", &[0.2, 0.4]),
        ];

        let table = run_sensitivity(&record, &drivers, 0.12);
        assert_eq!(table.sweeps.len(), 2);

        let price = table.get("price").unwrap();
        assert_eq!(price.points.len(), 3);
        assert_eq!(
            price.points.iter().map(|p| p.value).collect::<Vec<_>>(),
            vec![40.0, 50.0, 60.0]
        );

        let mut manual = record.clone();
        manual.pricing.avg_unit_price.value = 60.0;
        let expected = evaluate(&manual, 0.12).metrics;
        assert_eq!(price.points[2].outcome.as_ref().unwrap(), &expected);

        // Candidate equal to the current value reproduces the base metrics
        assert_eq!(price.points[1].outcome.as_ref().unwrap(), &table.base);

        let npvs: Vec<f64> = price.successes().map(|(_, m)| m.npv).collect();
        assert!(npvs[0] < npvs[1] && npvs[1] < npvs[2]);
    }

    #[test]
    fn test_failed_overlay_does_not_stop_sweep() {
        let record = test_record();
        let drivers = vec![
            driver("missing", "customers.segments[3].volume.base", &[1.0, 2.0]),
            driver("bad", "opex[", &[1.0]),
            driver("base", "customers.segments[0].volume.base", &[10.0, 30.0]),
        ];

        let table = run_sensitivity(&record, &drivers, 0.12);

        let missing = table.get("missing").unwrap();
        assert_eq!(missing.failures(), 2);
        assert!(matches!(
            missing.points[0].outcome,
            Err(OverlayError::PathNotFound { .. })
        ));
        assert!(matches!(
            table.get("bad").unwrap().points[0].outcome,
            Err(OverlayError::MalformedPath { .. })
        ));
        assert_eq!(table.get("base").unwrap().successes().count(), 2);
    }

    #[test]
    fn test_irr_failure_is_reported_per_point() {
        let record = test_record();
        // Zero price leaves only costs: no sign change
        let drivers = vec![driver("price", "pricing.avg_unit_price.value", &[0.0])];
        let table = run_sensitivity(&record, &drivers, 0.12);

        let metrics = table.get("price").unwrap().points[0].outcome.as_ref().unwrap();
        assert_eq!(metrics.irr, Err(IrrError::NoSignChange));
        assert!(metrics.npv < 0.0);
    }

    #[test]
    fn test_record_rate_follows_overlay() {
        let mut record = test_record();
        record.drivers = vec![driver("rate", "financial.interest_rate", &[0.0, 0.24])];

        let runner = ScenarioRunner::new(record.clone());
        let table = runner.run_record_sensitivity();
        let sweep = table.get("rate").unwrap();

        let undiscounted: f64 = project(&record).net_cash_flows().iter().sum();
        let at_zero = sweep.points[0].outcome.as_ref().unwrap();
        assert_relative_eq!(at_zero.npv, undiscounted, max_relative = 1e-12);

        let at_high = sweep.points[1].outcome.as_ref().unwrap();
        assert!(at_high.npv != at_zero.npv);
        assert_eq!(at_high.irr, at_zero.irr);
    }

    #[test]
    fn test_tornado_ranking() {
        let record = test_record();
        let drivers = vec![
            driver("cogs", "unit_economics.cogs_pct", &[0.29, 0.31]),
            driver("price", "pricing.avg_unit_price.value", &[25.0, 75.0]),
            driver("broken", "nowhere", &[1.0]),
        ];

        let table = run_sensitivity(&record, &drivers, 0.12);
        let bars = table.tornado();

        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].key, "price");
        assert_eq!(bars[1].key, "cogs");
        assert_eq!(bars[2].key, "broken");
        assert_eq!(bars[2].swing, 0.0);
        assert!(bars[0].low_npv <= table.base.npv && table.base.npv <= bars[0].high_npv);
    }

    #[test]
    fn test_runner_evaluate_uses_record_rate() {
        let runner = ScenarioRunner::new(test_record());
        assert_eq!(runner.evaluate(), runner.evaluate_at(0.12));
        assert_eq!(runner.evaluate().projection.periods.len(), 36);
    }
}
