//! Business record data structures
//!
//! Field names follow the JSON layout of a business case record, so that
//! driver paths like `customers.segments[0].volume.growth_rate` address the
//! same leaves in the serialized form and in these types.
//!
//! `Option` fields are serialized as `null` rather than skipped: the driver
//! overlay relies on every known field being present in the serialized tree.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Periods per year (all projections are monthly)
pub const PERIODS_PER_YEAR: u32 = 12;

/// Business model variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessModel {
    /// Subscription-style revenue (volume = active customers)
    #[default]
    Recurring,
    /// One-off unit sales (volume = units sold)
    UnitSales,
    /// Internal project paid back through cost reductions and efficiency gains
    CostSavings,
}

impl BusinessModel {
    /// Whether monthly benefit comes from volume × price
    pub fn is_revenue_driven(&self) -> bool {
        !matches!(self, BusinessModel::CostSavings)
    }
}

/// Period frequency. Only monthly projections are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    #[default]
    Monthly,
}

/// A monetary or numeric amount with its unit and free-text rationale
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Amount {
    pub value: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub rationale: String,
}

impl Amount {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Meta {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub business_model: BusinessModel,
    #[serde(default)]
    pub currency: String,
    /// Number of periods to project
    pub periods: u32,
    #[serde(default)]
    pub frequency: Frequency,
}

/// Per-year price adjustment. `price` replaces the average price for the
/// year; otherwise `multiplier` scales it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceAdjustment {
    /// Year index (0-based: year 0 = periods 1..=12)
    pub year: u32,
    #[serde(default)]
    pub multiplier: Option<f64>,
    #[serde(default)]
    pub price: Option<f64>,
}

/// Absolute price for a single period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceOverride {
    pub period: u32,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Pricing {
    pub avg_unit_price: Amount,
    #[serde(default)]
    pub yearly_adjustments: Vec<PriceAdjustment>,
    #[serde(default)]
    pub period_overrides: Vec<PriceOverride>,
}

/// Volume growth pattern, tagged by `type` in the record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VolumePattern {
    /// `base * (1 + growth_rate)^(period - 1)`
    GeometricGrowth { base: f64, growth_rate: f64 },
    /// `base + increment * (period - 1)`, floored at zero
    LinearGrowth { base: f64, increment: f64 },
    /// Monthly share of an annual total, grown once per completed year
    SeasonalGrowth {
        seasonality_index: Vec<f64>,
        annual_base_total: f64,
        yoy_growth: f64,
    },
    /// Explicit per-period volumes (period 1 first)
    Series { values: Vec<f64> },
    /// Unknown or missing `type`: contributes no volume. The raw fields are
    /// kept so the spec serializes back unchanged.
    #[serde(skip)]
    Unrecognized(Map<String, Value>),
}

impl VolumePattern {
    const KNOWN_TYPES: [&'static str; 4] =
        ["geometric_growth", "linear_growth", "seasonal_growth", "series"];

    fn is_known_type(fields: &Map<String, Value>) -> bool {
        fields
            .get("type")
            .and_then(Value::as_str)
            .is_some_and(|t| Self::KNOWN_TYPES.contains(&t))
    }
}

/// Multiplicative factor applied to every period of a year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearFactor {
    /// Year index (0-based, same as price adjustments)
    pub year: u32,
    pub factor: f64,
}

/// Absolute volume for a single period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeOverride {
    pub period: u32,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct YearlyAdjustment {
    #[serde(default)]
    pub factors: Vec<YearFactor>,
    #[serde(default)]
    pub overrides: Vec<VolumeOverride>,
}

/// Volume specification for one customer segment
///
/// Serialized as one flat object: the pattern's `type` and fields next to
/// `yearly_adjustment`. A missing or unknown `type` loads as
/// [`VolumePattern::Unrecognized`]; a known `type` with bad fields is an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct VolumeSpec {
    pub pattern: VolumePattern,
    pub yearly_adjustment: Option<YearlyAdjustment>,
}

impl Default for VolumeSpec {
    fn default() -> Self {
        Self::new(VolumePattern::Unrecognized(Map::new()))
    }
}

impl TryFrom<Map<String, Value>> for VolumeSpec {
    type Error = String;

    fn try_from(mut fields: Map<String, Value>) -> Result<Self, Self::Error> {
        let yearly_adjustment = match fields.remove("yearly_adjustment") {
            Some(value) => serde_json::from_value(value)
                .map_err(|err| format!("invalid yearly_adjustment: {}", err))?,
            None => None,
        };

        let pattern = if VolumePattern::is_known_type(&fields) {
            serde_json::from_value(Value::Object(fields)).map_err(|err| err.to_string())?
        } else {
            VolumePattern::Unrecognized(fields)
        };

        Ok(Self {
            pattern,
            yearly_adjustment,
        })
    }
}

impl From<VolumeSpec> for Map<String, Value> {
    fn from(spec: VolumeSpec) -> Self {
        let mut fields = match spec.pattern {
            VolumePattern::Unrecognized(raw) => raw,
            known => match serde_json::to_value(known) {
                Ok(Value::Object(map)) => map,
                _ => Map::new(),
            },
        };

        let adjustment = spec
            .yearly_adjustment
            .and_then(|adj| serde_json::to_value(adj).ok())
            .unwrap_or(Value::Null);
        fields.insert("yearly_adjustment".to_string(), adjustment);
        fields
    }
}

impl VolumeSpec {
    pub fn new(pattern: VolumePattern) -> Self {
        Self {
            pattern,
            yearly_adjustment: None,
        }
    }

    pub fn geometric(base: f64, growth_rate: f64) -> Self {
        Self::new(VolumePattern::GeometricGrowth { base, growth_rate })
    }

    pub fn linear(base: f64, increment: f64) -> Self {
        Self::new(VolumePattern::LinearGrowth { base, increment })
    }

    pub fn seasonal(seasonality_index: Vec<f64>, annual_base_total: f64, yoy_growth: f64) -> Self {
        Self::new(VolumePattern::SeasonalGrowth {
            seasonality_index,
            annual_base_total,
            yoy_growth,
        })
    }

    pub fn with_adjustment(mut self, adjustment: YearlyAdjustment) -> Self {
        self.yearly_adjustment = Some(adjustment);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: String,
    #[serde(default)]
    pub label: String,
    /// Missing volume contributes nothing
    #[serde(default)]
    pub volume: VolumeSpec,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Customers {
    #[serde(default)]
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UnitEconomics {
    /// Cost of goods sold as a fraction of revenue
    #[serde(default)]
    pub cogs_pct: f64,
    /// Customer acquisition cost (informational only)
    #[serde(default)]
    pub cac: Option<f64>,
}

/// Fixed and variable components of an operating expense
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CostStructure {
    #[serde(default)]
    pub fixed_component: Option<f64>,
    /// Fraction of the period's revenue (or benefit)
    #[serde(default)]
    pub variable_revenue_rate: Option<f64>,
    /// Amount per unit of total volume
    #[serde(default)]
    pub variable_per_customer: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OpexItem {
    pub name: String,
    /// Flat per-period amount, used when there is no cost structure
    #[serde(default)]
    pub value: Option<Amount>,
    #[serde(default)]
    pub cost_structure: Option<CostStructure>,
}

impl OpexItem {
    pub fn flat(name: impl Into<String>, amount: f64) -> Self {
        Self {
            name: name.into(),
            value: Some(Amount::new(amount)),
            cost_structure: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapexEntry {
    pub period: u32,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CapexItem {
    pub name: String,
    #[serde(default)]
    pub timeline: Vec<CapexEntry>,
}

/// Linear phase-in of a cost-savings benefit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImplementationTimeline {
    /// First period with any benefit
    pub start_month: u32,
    #[serde(default)]
    pub ramp_up_months: u32,
    /// First period at full benefit; defaults to `start_month + ramp_up_months`
    #[serde(default)]
    pub full_implementation_month: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineCost {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub label: String,
    pub current_monthly_cost: f64,
    pub savings_potential_pct: f64,
    #[serde(default)]
    pub implementation_timeline: Option<ImplementationTimeline>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyGain {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub label: String,
    pub baseline_value: f64,
    pub improved_value: f64,
    pub value_per_unit: f64,
    #[serde(default)]
    pub implementation_timeline: Option<ImplementationTimeline>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CostSavings {
    #[serde(default)]
    pub baseline_costs: Vec<BaselineCost>,
    #[serde(default)]
    pub efficiency_gains: Vec<EfficiencyGain>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Financial {
    /// Annual discount rate as a decimal
    #[serde(default)]
    pub interest_rate: f64,
}

/// A path-addressed assumption swept across candidate values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub key: String,
    pub path: String,
    #[serde(default)]
    pub range: Vec<f64>,
    #[serde(default)]
    pub rationale: String,
}

/// Root business case record
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BusinessRecord {
    pub meta: Meta,
    #[serde(default)]
    pub pricing: Pricing,
    #[serde(default)]
    pub customers: Customers,
    #[serde(default)]
    pub unit_economics: UnitEconomics,
    #[serde(default)]
    pub opex: Vec<OpexItem>,
    #[serde(default)]
    pub capex: Vec<CapexItem>,
    #[serde(default)]
    pub cost_savings: Option<CostSavings>,
    #[serde(default)]
    pub financial: Financial,
    #[serde(default)]
    pub drivers: Vec<Driver>,
}

impl BusinessRecord {
    /// Create an empty record of the given model and length
    pub fn new(business_model: BusinessModel, periods: u32) -> Self {
        Self {
            meta: Meta {
                business_model,
                periods,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn business_model(&self) -> BusinessModel {
        self.meta.business_model
    }

    /// Annual discount rate from `financial.interest_rate`
    pub fn discount_rate(&self) -> f64 {
        self.financial.interest_rate
    }

    /// Zero-based year index of a period, as used by yearly adjustments
    pub fn year_index(period: u32) -> u32 {
        period.saturating_sub(1) / PERIODS_PER_YEAR
    }

    /// Projection year (1-based) of a period
    pub fn year_of(period: u32) -> u32 {
        Self::year_index(period) + 1
    }

    /// Month within the projection year (1-12)
    pub fn month_in_year(period: u32) -> u32 {
        period.saturating_sub(1) % PERIODS_PER_YEAR + 1
    }

    /// First segment id that appears more than once, if any
    pub fn duplicate_segment_id(&self) -> Option<&str> {
        let segments = &self.customers.segments;
        segments.iter().enumerate().find_map(|(i, segment)| {
            segments[..i]
                .iter()
                .any(|earlier| earlier.id == segment.id)
                .then_some(segment.id.as_str())
        })
    }
}
