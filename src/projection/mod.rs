//! Projection engine: per-period cash flows and investment metrics

mod cashflows;
mod engine;
pub mod irr;
mod metrics;
mod period;
mod volume;

pub use cashflows::{AnnualRow, PeriodResult, ProjectionResult, ProjectionSummary};
pub use engine::project;
pub use irr::{calculate_irr, IrrError};
pub use metrics::{compute_metrics, npv, npv_at_monthly_rate, peak_funding, Metrics};
pub use period::{aggregate_period, effective_price, ramp_in_fraction};
pub use volume::volume_at;
