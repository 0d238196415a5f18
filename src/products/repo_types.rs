use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::rating::NormalizedProduct;

#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
pub struct ProductRow {
    pub id: Uuid,
    pub barcode: String,
    pub name: String,
    pub image: String,
    pub brand_owner: String,
    pub brand_name: String,
    pub ingredients: String,
    pub serving_size: f64,
    pub serving_unit: String,
    pub package_weight: String,
    pub rating: i32,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub struct ProductNutrientRow {
    pub name_key: String,
    pub amount: f64,
    pub unit_name: String,
    pub rate_index: Option<i32>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProductNutrient {
    pub key: String,
    pub amount: f64,
    pub unit: String,
    pub rate_index: Option<i32>,
}

impl From<ProductNutrientRow> for ProductNutrient {
    fn from(r: ProductNutrientRow) -> Self {
        Self {
            key: r.name_key,
            amount: r.amount,
            unit: r.unit_name,
            rate_index: r.rate_index,
        }
    }
}

/// A rated product with its nutrients in source order.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Product {
    #[serde(flatten)]
    pub row: ProductRow,
    pub nutrients: Vec<ProductNutrient>,
}

/// Insert payload for a freshly rated product.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub barcode: String,
    pub name: String,
    pub image: String,
    pub brand_owner: String,
    pub brand_name: String,
    pub ingredients: String,
    pub serving_size: f64,
    pub serving_unit: String,
    pub package_weight: String,
    pub rating: i32,
    pub nutrients: Vec<ProductNutrient>,
}

impl NewProduct {
    pub fn from_normalized(barcode: &str, n: NormalizedProduct, rating: i32) -> Self {
        let nutrients = n
            .nutrients
            .into_iter()
            .map(|x| ProductNutrient {
                key: x.key,
                amount: x.amount,
                unit: x.unit,
                rate_index: Some(x.rate_index as i32),
            })
            .collect();
        Self {
            barcode: barcode.to_string(),
            name: n.name,
            image: n.image,
            brand_owner: n.brand_owner,
            brand_name: n.brand_name,
            ingredients: n.ingredients,
            serving_size: n.serving_size,
            serving_unit: n.serving_unit,
            package_weight: n.package_weight,
            rating,
            nutrients,
        }
    }

    /// Materializes the product under `id` without touching storage.
    pub fn into_product(self, id: Uuid, at: OffsetDateTime) -> Product {
        Product {
            row: ProductRow {
                id,
                barcode: self.barcode,
                name: self.name,
                image: self.image,
                brand_owner: self.brand_owner,
                brand_name: self.brand_name,
                ingredients: self.ingredients,
                serving_size: self.serving_size,
                serving_unit: self.serving_unit,
                package_weight: self.package_weight,
                rating: self.rating,
                created_at: at,
                updated_at: at,
            },
            nutrients: self.nutrients,
        }
    }

    /// Unsaved view with a synthesized identifier.
    pub fn into_transient(self) -> Product {
        self.into_product(Uuid::new_v4(), OffsetDateTime::now_utc())
    }
}
