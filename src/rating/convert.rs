use super::catalog::MetricDefinition;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("cannot convert {key} from `{from}` to `{to}`")]
pub struct ConversionError {
    pub key: String,
    pub from: String,
    pub to: String,
}

/// Amount expressed in the unit of record.
#[derive(Debug, Clone, PartialEq)]
pub struct Converted {
    pub amount: f64,
    pub unit: String,
}

/// Lower-cased unit with the micro-gram spellings folded together.
fn canonical_unit(unit: &str) -> String {
    let unit = unit.trim().to_lowercase();
    match unit.as_str() {
        "mcg" | "ug" | "μg" => "µg".to_string(),
        _ => unit,
    }
}

/// Converts `amount` from `from_unit` into the metric's benchmark unit.
///
/// Unit-less metrics pass amount and unit through untouched. An empty
/// `from_unit` means the source did not declare one and is read as the
/// benchmark unit. Any other unit without a registered factor is an error.
pub fn convert(
    amount: f64,
    from_unit: &str,
    metric: &MetricDefinition,
) -> Result<Converted, ConversionError> {
    if metric.is_unitless() {
        return Ok(Converted {
            amount,
            unit: from_unit.to_string(),
        });
    }

    let from = canonical_unit(from_unit);
    let factor = if from.is_empty() || from == metric.benchmark_unit {
        Some(1.0)
    } else {
        metric
            .conversions
            .iter()
            .find(|c| c.unit == from)
            .map(|c| c.factor)
    };

    match factor {
        Some(factor) => Ok(Converted {
            amount: amount * factor,
            unit: metric.benchmark_unit.to_string(),
        }),
        None => Err(ConversionError {
            key: metric.key.to_string(),
            from: from_unit.to_string(),
            to: metric.benchmark_unit.to_string(),
        }),
    }
}
