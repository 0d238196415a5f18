use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{ProductNutrient, ProductRow};
use super::services::{Origin, Resolution};
use crate::rating::{catalog, classify::rate_label, normalize::NO_IMAGE, RawNutritionPayload};

#[derive(Debug, Serialize)]
pub struct NutrientResponse {
    pub key: String,
    pub amount: f64,
    pub unit: String,
    pub rate_index: Option<i32>,
    pub rate: Option<&'static str>,
}

impl From<ProductNutrient> for NutrientResponse {
    fn from(n: ProductNutrient) -> Self {
        let rate = n.rate_index.and_then(|i| {
            let metric = catalog::lookup(&n.key)?;
            Some(rate_label(usize::try_from(i).ok()?, metric))
        });
        Self {
            key: n.key,
            amount: n.amount,
            unit: n.unit,
            rate_index: n.rate_index,
            rate,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    #[serde(flatten)]
    pub product: ProductRow,
    pub source: Origin,
    pub persisted: bool,
    pub nutrients: Vec<NutrientResponse>,
}

impl From<Resolution> for ProductResponse {
    fn from(r: Resolution) -> Self {
        let source = r.origin();
        let persisted = r.is_persisted();
        let product = r.into_product();
        Self {
            product: product.row,
            source,
            persisted,
            nutrients: product.nutrients.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProductListItem {
    pub id: Uuid,
    pub barcode: String,
    pub name: String,
    pub image: String,
    pub brand_name: String,
    pub rating: i32,
    pub updated_at: OffsetDateTime,
}

impl From<ProductRow> for ProductListItem {
    fn from(p: ProductRow) -> Self {
        Self {
            id: p.id,
            barcode: p.barcode,
            name: p.name,
            image: p.image,
            brand_name: p.brand_name,
            rating: p.rating,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    10
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// One keyword search result, unrated.
#[derive(Debug, Serialize)]
pub struct SearchHit {
    pub barcode: String,
    pub name: String,
    pub image: String,
    pub brand_name: String,
}

impl From<RawNutritionPayload> for SearchHit {
    fn from(p: RawNutritionPayload) -> Self {
        let image = match p.text(&["image_url", "image_front_url"]) {
            url if url.is_empty() => NO_IMAGE.to_string(),
            url => url,
        };
        Self {
            barcode: p.text(&["code", "_id"]),
            name: p.text(&["product_name", "product_name_en"]),
            image,
            brand_name: p.text(&["brands"]),
        }
    }
}
