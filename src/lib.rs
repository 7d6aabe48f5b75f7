//! Business case engine - monthly cash-flow projections and investment metrics
//!
//! This library provides:
//! - Business records (pricing, customer segments, costs, capital spend) loaded from JSON
//! - Per-segment volume patterns and per-period cash-flow aggregation
//! - NPV, IRR, payback and peak funding
//! - Driver overlays and parallel sensitivity sweeps

pub mod record;
pub mod projection;
pub mod drivers;
pub mod scenario;

// Re-export commonly used types
pub use record::{load_record, BusinessModel, BusinessRecord, Driver, RecordError};
pub use projection::{compute_metrics, project, IrrError, Metrics, ProjectionResult};
pub use drivers::{overlay, DriverPath, OverlayError};
pub use scenario::{run_sensitivity, Evaluation, ScenarioRunner, SensitivityTable};
