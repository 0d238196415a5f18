use std::collections::BTreeSet;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use super::catalog::{self, ADDITIVES_KEY};
use super::classify::{classify, rate_label};
use super::convert::{convert, ConversionError};
use super::payload::{RawNutrient, RawNutritionPayload};

pub const NO_IMAGE: &str = "/no-image.webp";

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("product doesn't have any tracked nutrients")]
    EmptyNutrients,
    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

/// A tracked nutrient in its benchmark unit with its severity bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedNutrient {
    pub key: String,
    pub raw_amount: f64,
    pub raw_unit: String,
    pub amount: f64,
    pub unit: String,
    pub rate_index: usize,
    pub rate: &'static str,
    /// Bucket count of the metric, needed to weigh `rate_index`.
    pub buckets: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedProduct {
    pub name: String,
    pub image: String,
    pub brand_owner: String,
    pub brand_name: String,
    pub ingredients: String,
    pub serving_size: f64,
    pub serving_unit: String,
    pub package_weight: String,
    pub additives: Vec<String>,
    pub nutrients: Vec<NormalizedNutrient>,
}

/// Turns the loose source payload into a product with only tracked,
/// unit-normalized and classified nutrients.
pub fn normalize(raw: &RawNutritionPayload) -> Result<NormalizedProduct, NormalizeError> {
    let additives = additive_codes(&raw.additive_tags());

    let mut entries: Vec<RawNutrient> = raw
        .nutrients()
        .into_iter()
        .filter(|n| n.key != ADDITIVES_KEY)
        .collect();
    if !additives.is_empty() {
        entries.push(RawNutrient {
            key: ADDITIVES_KEY.to_string(),
            amount: additives.len() as f64,
            unit: additives.join(" "),
        });
    }

    let mut nutrients = Vec::with_capacity(entries.len());
    for entry in entries {
        let Some(metric) = catalog::lookup(&entry.key) else {
            debug!(key = %entry.key, "nutrient not tracked, dropped");
            continue;
        };

        let (amount, unit) = if entry.key == ADDITIVES_KEY {
            (entry.amount, entry.unit.clone())
        } else {
            let c = convert(entry.amount, &entry.unit, metric)?;
            (c.amount, c.unit)
        };

        let rate_index = classify(amount, metric);
        nutrients.push(NormalizedNutrient {
            key: entry.key,
            raw_amount: entry.amount,
            raw_unit: entry.unit,
            amount,
            unit,
            rate_index,
            rate: rate_label(rate_index, metric),
            buckets: metric.buckets(),
        });
    }

    if nutrients.is_empty() {
        return Err(NormalizeError::EmptyNutrients);
    }

    let (serving_size, serving_unit) = parse_serving_size(&raw.text(&["serving_size"]));
    let image = match raw.text(&["image_url", "image_front_url"]) {
        s if s.is_empty() => NO_IMAGE.to_string(),
        s => s,
    };

    Ok(NormalizedProduct {
        name: raw.text(&["product_name", "product_name_en"]),
        image,
        brand_owner: raw.text(&["brand_owner"]),
        brand_name: raw.text(&["brands"]),
        ingredients: raw.text(&["ingredients_text", "ingredients_text_en"]),
        serving_size,
        serving_unit,
        package_weight: raw.text(&["product_quantity"]),
        additives,
        nutrients,
    })
}

/// Distinct upper-cased additive codes, sorted. A leading language marker
/// such as `en:` is stripped.
pub fn additive_codes(tags: &[String]) -> Vec<String> {
    tags.iter()
        .map(|tag| tag.split_once(':').map_or(tag.as_str(), |(_, code)| code))
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_uppercase)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Parses `"1 oz (28 g)"`, `"123 lb"`, `"3.432mg"` into value and unit. A
/// parenthesized clause wins over the text around it. Unparsable text
/// gives `(0.0, "")`.
pub fn parse_serving_size(text: &str) -> (f64, String) {
    lazy_static! {
        static ref PAREN_RE: Regex = Regex::new(r"\((.*)\)").unwrap();
        static ref AMOUNT_RE: Regex = Regex::new(r"([0-9]+(?:\.[0-9]+)?)\s*([a-zA-Z]+)").unwrap();
    }

    let text = PAREN_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .map_or(text, |m| m.as_str());

    AMOUNT_RE
        .captures(text)
        .and_then(|c| {
            let value = c.get(1)?.as_str().parse::<f64>().ok()?;
            Some((value, c.get(2)?.as_str().to_string()))
        })
        .unwrap_or((0.0, String::new()))
}
