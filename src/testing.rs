//! In-memory collaborators for tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use time::OffsetDateTime;
use tokio::sync::Barrier;
use uuid::Uuid;

use crate::openfoodfacts::{NutritionSource, SourceError};
use crate::rating::RawNutritionPayload;
use crate::products::repo::{ProductStore, StoreError};
use crate::products::repo_types::{NewProduct, Product, ProductRow};

/// Two tracked nutrients: fat 20 g (high) and sugars 5 g (low).
pub fn nutella() -> Value {
    json!({
        "product_name": "Nutella",
        "brands": "Ferrero",
        "serving_size": "1 tbsp (15 g)",
        "product_quantity": "400",
        "nutriments": {
            "fat": 20, "fat_unit": "g",
            "sugars": 5, "sugars_unit": "g",
            "nova-group": 4
        }
    })
}

/// Product store with a unique barcode index and switchable failures.
#[derive(Default)]
pub struct MemoryStore {
    products: Mutex<HashMap<String, Product>>,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
    pub creates: AtomicUsize,
    write_delay: Option<Duration>,
}

impl MemoryStore {
    /// Every insert sleeps for `delay` before touching the map.
    pub fn delayed_writes(mut self, delay: Duration) -> Self {
        self.write_delay = Some(delay);
        self
    }

    pub fn len(&self) -> usize {
        self.products.lock().unwrap().len()
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn find_by_barcode(&self, barcode: &str) -> Result<Option<Product>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".into()));
        }
        Ok(self.products.lock().unwrap().get(barcode).cloned())
    }

    async fn create_product_with_nutrients(
        &self,
        new: &NewProduct,
    ) -> Result<Product, StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".into()));
        }
        if let Some(delay) = self.write_delay {
            tokio::time::sleep(delay).await;
        }
        let mut products = self.products.lock().unwrap();
        if products.contains_key(&new.barcode) {
            return Err(StoreError::UniqueViolation(new.barcode.clone()));
        }
        let product = new
            .clone()
            .into_product(Uuid::new_v4(), OffsetDateTime::now_utc());
        products.insert(new.barcode.clone(), product.clone());
        self.creates.fetch_add(1, Ordering::SeqCst);
        Ok(product)
    }

    async fn list_products(&self, limit: i64, offset: i64) -> Result<Vec<ProductRow>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".into()));
        }
        let mut rows: Vec<ProductRow> = self
            .products
            .lock()
            .unwrap()
            .values()
            .map(|p| p.row.clone())
            .collect();
        rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(rows
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }
}

/// Canned nutrition source that counts calls.
#[derive(Default)]
pub struct FakeSource {
    payloads: HashMap<String, Value>,
    broken: HashSet<String>,
    gate: Option<Arc<Barrier>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl FakeSource {
    pub fn with(mut self, barcode: &str, payload: Value) -> Self {
        self.payloads.insert(barcode.to_string(), payload);
        self
    }

    pub fn broken(mut self, barcode: &str) -> Self {
        self.broken.insert(barcode.to_string());
        self
    }

    /// Holds every fetch until `n` of them are in flight.
    pub fn gated(mut self, n: usize) -> Self {
        self.gate = Some(Arc::new(Barrier::new(n)));
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NutritionSource for FakeSource {
    async fn fetch(&self, barcode: &str) -> Result<RawNutritionPayload, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.wait().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.broken.contains(barcode) {
            return Err(SourceError::Upstream("status code 503".into()));
        }
        self.payloads
            .get(barcode)
            .cloned()
            .and_then(RawNutritionPayload::from_value)
            .ok_or_else(|| SourceError::NotFound(barcode.to_string()))
    }

    /// Case-insensitive match on `product_name`; hits carry their barcode as `code`.
    async fn search(&self, query: &str) -> Result<Vec<RawNutritionPayload>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.broken.contains(query) {
            return Err(SourceError::Upstream("status code 503".into()));
        }
        let needle = query.to_lowercase();
        let mut hits: Vec<(String, RawNutritionPayload)> = self
            .payloads
            .iter()
            .filter_map(|(barcode, payload)| {
                let mut payload = payload.clone();
                payload
                    .as_object_mut()?
                    .entry("code")
                    .or_insert_with(|| Value::String(barcode.clone()));
                let hit = RawNutritionPayload::from_value(payload)?;
                hit.text(&["product_name"])
                    .to_lowercase()
                    .contains(&needle)
                    .then(|| (barcode.clone(), hit))
            })
            .collect();
        hits.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(hits.into_iter().map(|(_, hit)| hit).collect())
    }
}
