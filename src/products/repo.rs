use async_trait::async_trait;
use sqlx::PgPool;

use super::repo_types::{NewProduct, Product, ProductNutrient, ProductNutrientRow, ProductRow};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("product {0} already exists")]
    UniqueViolation(String),
    #[error("product store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    fn from_sqlx(barcode: &str, e: sqlx::Error) -> Self {
        match e.as_database_error() {
            Some(db) if db.is_unique_violation() => Self::UniqueViolation(barcode.to_string()),
            _ => Self::Unavailable(e.to_string()),
        }
    }
}

/// Durable product storage. `barcode` is unique across all products.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn find_by_barcode(&self, barcode: &str) -> Result<Option<Product>, StoreError>;

    /// Inserts the product and its nutrients atomically.
    async fn create_product_with_nutrients(&self, new: &NewProduct)
        -> Result<Product, StoreError>;

    /// Most recently updated first.
    async fn list_products(&self, limit: i64, offset: i64) -> Result<Vec<ProductRow>, StoreError>;
}

const PRODUCT_COLUMNS: &str = "id, barcode, name, image, brand_owner, brand_name, ingredients, \
     serving_size, serving_unit, package_weight, rating, created_at, updated_at";

#[derive(Clone)]
pub struct PgProductStore {
    db: PgPool,
}

impl PgProductStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn find_by_barcode(&self, barcode: &str) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE barcode = $1"
        ))
        .bind(barcode)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| StoreError::from_sqlx(barcode, e))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let nutrients = sqlx::query_as::<_, ProductNutrientRow>(
            r#"
            SELECT name_key, amount, unit_name, rate_index
              FROM product_nutrients
             WHERE product_id = $1
             ORDER BY position ASC
            "#,
        )
        .bind(row.id)
        .fetch_all(&self.db)
        .await
        .map_err(|e| StoreError::from_sqlx(barcode, e))?;

        Ok(Some(Product {
            row,
            nutrients: nutrients.into_iter().map(ProductNutrient::from).collect(),
        }))
    }

    async fn create_product_with_nutrients(
        &self,
        new: &NewProduct,
    ) -> Result<Product, StoreError> {
        let err = |e| StoreError::from_sqlx(&new.barcode, e);

        let mut tx = self.db.begin().await.map_err(err)?;

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            INSERT INTO products (barcode, name, image, brand_owner, brand_name, ingredients,
                                  serving_size, serving_unit, package_weight, rating)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(&new.barcode)
        .bind(&new.name)
        .bind(&new.image)
        .bind(&new.brand_owner)
        .bind(&new.brand_name)
        .bind(&new.ingredients)
        .bind(new.serving_size)
        .bind(&new.serving_unit)
        .bind(&new.package_weight)
        .bind(new.rating)
        .fetch_one(&mut *tx)
        .await
        .map_err(err)?;

        for (position, n) in new.nutrients.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO product_nutrients (product_id, position, name_key, amount, unit_name, rate_index)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(row.id)
            .bind(position as i32)
            .bind(&n.key)
            .bind(n.amount)
            .bind(&n.unit)
            .bind(n.rate_index)
            .execute(&mut *tx)
            .await
            .map_err(err)?;
        }

        tx.commit().await.map_err(err)?;

        Ok(Product {
            row,
            nutrients: new.nutrients.clone(),
        })
    }

    async fn list_products(&self, limit: i64, offset: i64) -> Result<Vec<ProductRow>, StoreError> {
        sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY updated_at DESC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await
        .map_err(|e| StoreError::from_sqlx("", e))
    }
}
