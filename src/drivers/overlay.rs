//! Driver overlay: a copy of a record with one numeric leaf replaced
//!
//! The record is serialized to a `serde_json::Value` tree, the tree is walked
//! along the driver path, the leaf is substituted and the tree is deserialized
//! back. The input record is never touched.

use serde_json::{Number, Value};

use super::path::{DriverPath, PathSegment};
use super::OverlayError;
use crate::record::BusinessRecord;

/// Return a new record identical to `record` except for the leaf at `path`.
pub fn overlay(record: &BusinessRecord, path: &str, value: f64) -> Result<BusinessRecord, OverlayError> {
    let path = DriverPath::parse(path)?;
    overlay_path(record, &path, value)
}

/// [`overlay`] with an already parsed path
pub fn overlay_path(
    record: &BusinessRecord,
    path: &DriverPath,
    value: f64,
) -> Result<BusinessRecord, OverlayError> {
    let mut tree = to_tree(record, path)?;

    let leaf = resolve_mut(&mut tree, path)?;
    *leaf = replacement(leaf, value, path)?;

    serde_json::from_value(tree).map_err(|err| OverlayError::Rebuild {
        path: path.to_string(),
        reason: err.to_string(),
    })
}

/// Current numeric value at `path`
pub fn read_value(record: &BusinessRecord, path: &str) -> Result<f64, OverlayError> {
    let path = DriverPath::parse(path)?;
    let mut tree = to_tree(record, &path)?;
    let leaf = resolve_mut(&mut tree, &path)?;

    leaf.as_f64().ok_or_else(|| OverlayError::TypeMismatch {
        path: path.to_string(),
        expected: "number",
        found: kind(leaf),
    })
}

fn to_tree(record: &BusinessRecord, path: &DriverPath) -> Result<Value, OverlayError> {
    serde_json::to_value(record).map_err(|err| OverlayError::Rebuild {
        path: path.to_string(),
        reason: err.to_string(),
    })
}

/// Walk the tree without creating any missing structure
fn resolve_mut<'a>(tree: &'a mut Value, path: &DriverPath) -> Result<&'a mut Value, OverlayError> {
    let mut node = tree;

    for (depth, segment) in path.segments().iter().enumerate() {
        let next = match segment {
            PathSegment::Field(name) => node.as_object_mut().and_then(|map| map.get_mut(name)),
            PathSegment::Index(i) => node.as_array_mut().and_then(|items| items.get_mut(*i)),
        };

        node = next.ok_or_else(|| OverlayError::PathNotFound {
            path: path.to_string(),
            missing: path.prefix(depth + 1),
        })?;
    }

    Ok(node)
}

/// New leaf value, keeping integer leaves integral
fn replacement(existing: &Value, value: f64, path: &DriverPath) -> Result<Value, OverlayError> {
    if !value.is_finite() {
        return Err(OverlayError::NonFinite {
            path: path.to_string(),
            value,
        });
    }

    let mismatch = |expected: &'static str| OverlayError::TypeMismatch {
        path: path.to_string(),
        expected,
        found: kind(existing),
    };

    match existing {
        Value::Number(n) if n.is_f64() => float(value).ok_or_else(|| mismatch("number")),
        Value::Number(_) => integer(value).ok_or_else(|| mismatch("integer")),
        // Unset optional field: the record's type decides whether it fits
        Value::Null => Ok(integer(value).or_else(|| float(value)).unwrap_or(Value::Null)),
        _ => Err(mismatch("number")),
    }
}

fn float(value: f64) -> Option<Value> {
    Number::from_f64(value).map(Value::Number)
}

fn integer(value: f64) -> Option<Value> {
    if value.fract() != 0.0 {
        return None;
    }
    if value >= 0.0 && value <= u64::MAX as f64 {
        Some(Value::Number(Number::from(value as u64)))
    } else if value < 0.0 && value >= i64::MIN as f64 {
        Some(Value::Number(Number::from(value as i64)))
    } else {
        None
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{
        Amount, BaselineCost, BusinessModel, CapexEntry, CapexItem, CostSavings,
        ImplementationTimeline, OpexItem, Segment, VolumePattern, VolumeSpec,
    };

    fn sample_record() -> BusinessRecord {
        let mut record = BusinessRecord::new(BusinessModel::Recurring, 36);
        record.meta.title = "Overlay sample".into();
        record.pricing.avg_unit_price = Amount::new(29.0);
        record.unit_economics.cogs_pct = 0.25;
        record.customers.segments = vec![
            Segment {
                id: "smb".into(),
                label: "SMB".into(),
                volume: VolumeSpec::geometric(200.0, 0.03),
            },
            Segment {
                id: "mid".into(),
                label: "Mid-market".into(),
                volume: VolumeSpec::linear(20.0, 1.5),
            },
        ];
        record.opex = vec![OpexItem::flat("Hosting", 500.0), OpexItem::flat("Sales", 4000.0)];
        record.capex = vec![CapexItem {
            name: "Build".into(),
            timeline: vec![CapexEntry { period: 1, amount: 60_000.0 }],
        }];
        record
    }

    #[test]
    fn test_overlay_replaces_single_leaf() {
        let record = sample_record();
        let updated = overlay(&record, "customers.segments[0].volume.growth_rate", 0.07).unwrap();

        assert_eq!(
            updated.customers.segments[0].volume.pattern,
            VolumePattern::GeometricGrowth { base: 200.0, growth_rate: 0.07 }
        );

        // Everything else is untouched, including the input
        let mut expected = record.clone();
        expected.customers.segments[0].volume = VolumeSpec::geometric(200.0, 0.07);
        assert_eq!(updated, expected);
        assert_eq!(record, sample_record());
    }

    #[test]
    fn test_overlay_nested_amount() {
        let record = sample_record();
        let updated = overlay(&record, "opex[1].value.value", 5500.0).unwrap();

        assert_eq!(updated.opex[1].value.as_ref().map(|a| a.value), Some(5500.0));
        assert_eq!(updated.opex[0], record.opex[0]);
    }

    #[test]
    fn test_overlay_with_current_value_is_identical() {
        let record = sample_record();
        for path in [
            "pricing.avg_unit_price.value",
            "customers.segments[1].volume.increment",
            "capex[0].timeline[0].amount",
            "meta.periods",
        ] {
            let current = read_value(&record, path).unwrap();
            let updated = overlay(&record, path, current).unwrap();
            assert_eq!(updated, record, "overlay of '{}' changed the record", path);
        }
    }

    #[test]
    fn test_integer_leaf() {
        let record = sample_record();
        let updated = overlay(&record, "meta.periods", 48.0).unwrap();
        assert_eq!(updated.meta.periods, 48);

        assert!(matches!(
            overlay(&record, "meta.periods", 47.5),
            Err(OverlayError::TypeMismatch { expected: "integer", .. })
        ));
    }

    #[test]
    fn test_unset_optional_field() {
        let mut record = sample_record();
        record.unit_economics.cac = None;
        let updated = overlay(&record, "unit_economics.cac", 120.0).unwrap();
        assert_eq!(updated.unit_economics.cac, Some(120.0));

        let mut savings = BusinessRecord::new(BusinessModel::CostSavings, 12);
        savings.cost_savings = Some(CostSavings {
            baseline_costs: vec![BaselineCost {
                id: "energy".into(),
                label: "Energy".into(),
                current_monthly_cost: 8000.0,
                savings_potential_pct: 0.15,
                implementation_timeline: Some(ImplementationTimeline {
                    start_month: 2,
                    ramp_up_months: 3,
                    full_implementation_month: None,
                }),
            }],
            efficiency_gains: Vec::new(),
        });

        let path = "cost_savings.baseline_costs[0].implementation_timeline.full_implementation_month";
        let updated = overlay(&savings, path, 6.0).unwrap();
        let timeline = updated.cost_savings.as_ref().unwrap().baseline_costs[0]
            .implementation_timeline
            .clone()
            .unwrap();
        assert_eq!(timeline.full_implementation_month, Some(6));
        assert_eq!(timeline.start_month, 2);
    }

    #[test]
    fn test_unknown_pattern_fields_survive_overlay() {
        let mut record = sample_record();
        record.customers.segments[1].volume =
            serde_json::from_str(r#"{"type": "s_curve", "midpoint": 12, "steepness": 0.4}"#).unwrap();

        let updated = overlay(&record, "pricing.avg_unit_price.value", 35.0).unwrap();
        assert_eq!(updated.customers.segments[1].volume, record.customers.segments[1].volume);

        let value = serde_json::to_value(&updated.customers.segments[1].volume).unwrap();
        assert_eq!(value["type"], "s_curve");
        assert_eq!(value["midpoint"], 12);

        // Fields of an unknown pattern are still addressable
        let moved = overlay(&record, "customers.segments[1].volume.midpoint", 18.0).unwrap();
        assert_eq!(read_value(&moved, "customers.segments[1].volume.midpoint").unwrap(), 18.0);
    }

    #[test]
    fn test_path_not_found() {
        let record = sample_record();

        match overlay(&record, "customers.segments[5].volume.growth_rate", 0.1) {
            Err(OverlayError::PathNotFound { missing, .. }) => {
                assert_eq!(missing, "customers.segments[5]")
            }
            other => panic!("expected PathNotFound, got {:?}", other),
        }

        assert!(matches!(
            overlay(&record, "pricing.discount_pct", 0.1),
            Err(OverlayError::PathNotFound { .. })
        ));
        // Index into an object
        assert!(matches!(
            overlay(&record, "pricing[0]", 0.1),
            Err(OverlayError::PathNotFound { .. })
        ));
    }

    #[test]
    fn test_non_numeric_leaf() {
        let record = sample_record();
        assert!(matches!(
            overlay(&record, "meta.title", 1.0),
            Err(OverlayError::TypeMismatch { found: "string", .. })
        ));
        assert!(matches!(
            overlay(&record, "customers.segments[0]", 1.0),
            Err(OverlayError::TypeMismatch { found: "object", .. })
        ));
    }

    #[test]
    fn test_non_finite_value() {
        let record = sample_record();
        assert!(matches!(
            overlay(&record, "pricing.avg_unit_price.value", f64::NAN),
            Err(OverlayError::NonFinite { .. })
        ));
    }
}
