pub mod client;

use async_trait::async_trait;

pub use client::OpenFoodFactsClient;

use crate::rating::RawNutritionPayload;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("product {0} not found in Open Food Facts")]
    NotFound(String),
    #[error("open food facts request failed: {0}")]
    Upstream(String),
}

/// Read-only source of raw nutrition data keyed by barcode.
#[async_trait]
pub trait NutritionSource: Send + Sync {
    async fn fetch(&self, barcode: &str) -> Result<RawNutritionPayload, SourceError>;

    /// Keyword search; products come back in the source's relevance order.
    async fn search(&self, query: &str) -> Result<Vec<RawNutritionPayload>, SourceError>;
}
