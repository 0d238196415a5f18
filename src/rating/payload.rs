use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One `nutriments` entry as the source reported it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawNutrient {
    pub key: String,
    pub amount: f64,
    pub unit: String,
}

/// The untyped `product` object of an Open Food Facts response or search hit.
///
/// Every field may be missing or have an unexpected JSON type; the accessors
/// below decide the fallback for each case so nothing downstream has to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawNutritionPayload(Map<String, Value>);

impl RawNutritionPayload {
    /// Wraps `value` if it is a JSON object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self(fields)),
            _ => None,
        }
    }

    /// First non-blank text among `keys`; numbers are rendered as text.
    /// Empty string when none is present.
    pub fn text(&self, keys: &[&str]) -> String {
        keys.iter()
            .filter_map(|k| self.0.get(*k))
            .find_map(|v| match v {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// `additives_tags` strings, e.g. `["en:e330", "en:e471"]`. Non-string
    /// items are skipped; a missing or malformed list yields nothing.
    pub fn additive_tags(&self) -> Vec<String> {
        match self.0.get("additives_tags") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Entries of `nutriments` whose key has no `_` suffix and whose value is
    /// a finite number (or a numeric string). The unit comes from the
    /// sibling `<key>_unit` field and is empty when absent.
    pub fn nutrients(&self) -> Vec<RawNutrient> {
        let Some(Value::Object(nutriments)) = self.0.get("nutriments") else {
            return Vec::new();
        };

        nutriments
            .iter()
            .filter(|(key, _)| !key.contains('_'))
            .filter_map(|(key, value)| {
                let amount = number_of(value)?;
                let unit = nutriments
                    .get(&format!("{key}_unit"))
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .trim()
                    .to_string();
                Some(RawNutrient {
                    key: key.clone(),
                    amount,
                    unit,
                })
            })
            .collect()
    }
}

fn number_of(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}
