//! Business record data structures and JSON loading

mod data;
pub mod loader;

pub use data::{
    Amount, BaselineCost, BusinessModel, BusinessRecord, CapexEntry, CapexItem, CostSavings,
    CostStructure, Customers, Driver, EfficiencyGain, Financial, Frequency,
    ImplementationTimeline, Meta, OpexItem, PriceAdjustment, PriceOverride, Pricing, Segment,
    UnitEconomics, VolumeOverride, VolumePattern, VolumeSpec, YearFactor, YearlyAdjustment,
    PERIODS_PER_YEAR,
};
pub use loader::{load_record, load_record_from_reader, RecordError};
