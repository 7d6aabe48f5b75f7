//! Volume pattern engine: segment volume for a single period

use crate::record::{BusinessRecord, VolumePattern, VolumeSpec, YearlyAdjustment, PERIODS_PER_YEAR};

/// Volume of one segment in `period` (1-indexed), in units per period.
///
/// Never fails: an unrecognized pattern contributes zero volume.
pub fn volume_at(spec: &VolumeSpec, period: u32) -> f64 {
    let base = pattern_volume(&spec.pattern, period);

    match &spec.yearly_adjustment {
        Some(adjustment) => apply_adjustment(adjustment, period, base),
        None => base,
    }
}

/// Base pattern evaluated before any yearly adjustment
fn pattern_volume(pattern: &VolumePattern, period: u32) -> f64 {
    let elapsed = period.saturating_sub(1);

    match pattern {
        VolumePattern::GeometricGrowth { base, growth_rate } => {
            base * compound(*growth_rate, elapsed)
        }
        VolumePattern::LinearGrowth { base, increment } => {
            (base + increment * elapsed as f64).max(0.0)
        }
        VolumePattern::SeasonalGrowth {
            seasonality_index,
            annual_base_total,
            yoy_growth,
        } => {
            let completed_years = elapsed / PERIODS_PER_YEAR;
            let month_idx = (elapsed % PERIODS_PER_YEAR) as usize;
            let monthly_base = annual_base_total / PERIODS_PER_YEAR as f64;
            let seasonal = monthly_base * seasonality_index.get(month_idx).copied().unwrap_or(0.0);
            seasonal * compound(*yoy_growth, completed_years)
        }
        VolumePattern::Series { values } => {
            values.get(elapsed as usize).copied().unwrap_or(0.0)
        }
        VolumePattern::Unrecognized(_) => 0.0,
    }
}

/// `(1 + rate)^steps`, falling back to `powf` past the `powi` exponent range
fn compound(rate: f64, steps: u32) -> f64 {
    match i32::try_from(steps) {
        Ok(n) => (1.0 + rate).powi(n),
        Err(_) => (1.0 + rate).powf(f64::from(steps)),
    }
}

/// Year factor first, then a per-period override replaces the result outright
fn apply_adjustment(adjustment: &YearlyAdjustment, period: u32, base: f64) -> f64 {
    if let Some(ov) = adjustment.overrides.iter().find(|o| o.period == period) {
        return ov.value;
    }

    let year = BusinessRecord::year_index(period);
    adjustment
        .factors
        .iter()
        .filter(|f| f.year == year)
        .fold(base, |volume, f| volume * f.factor)
}
