use serde::Serialize;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use super::repo::StoreError;
use super::repo_types::{NewProduct, Product};
use crate::error::LookupError;
use crate::rating::{aggregate, normalize, validate, RawNutritionPayload};
use crate::state::AppState;

/// Where a resolved product came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Cached,
    Stored,
    Transient,
}

/// Outcome of a successful lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Already in the store; returned as-is.
    Cached(Product),
    /// Rated now and persisted, or persisted concurrently by another lookup.
    Stored(Product),
    /// Rated now but not persisted; `id` is synthesized and unknown to the store.
    Transient(Product),
}

impl Resolution {
    pub fn product(&self) -> &Product {
        match self {
            Self::Cached(p) | Self::Stored(p) | Self::Transient(p) => p,
        }
    }

    pub fn into_product(self) -> Product {
        match self {
            Self::Cached(p) | Self::Stored(p) | Self::Transient(p) => p,
        }
    }

    pub fn origin(&self) -> Origin {
        match self {
            Self::Cached(_) => Origin::Cached,
            Self::Stored(_) => Origin::Stored,
            Self::Transient(_) => Origin::Transient,
        }
    }

    pub fn is_persisted(&self) -> bool {
        !matches!(self, Self::Transient(_))
    }
}

/// Resolves `barcode` to a rated product: stored copy if any, otherwise
/// fetched, normalized, rated and stored on a best-effort basis.
#[instrument(skip(st))]
pub async fn resolve_product(st: &AppState, barcode: &str) -> Result<Resolution, LookupError> {
    validate(barcode)?;

    if let Some(product) = find_stored(st, barcode).await {
        debug!(%barcode, "cache hit");
        return Ok(Resolution::Cached(product));
    }

    let raw = match timeout(st.config.deadlines.fetch, st.source.fetch(barcode)).await {
        Ok(res) => res?,
        Err(_) => {
            warn!(%barcode, "nutrition source timed out");
            return Err(LookupError::Upstream("request timed out".into()));
        }
    };

    let normalized = normalize(&raw)?;
    for n in &normalized.nutrients {
        debug!(
            key = %n.key,
            raw_amount = n.raw_amount,
            raw_unit = %n.raw_unit,
            amount = n.amount,
            unit = %n.unit,
            rate = n.rate,
            "nutrient rated"
        );
    }
    let rating = aggregate(&normalized.nutrients).ok_or(LookupError::EmptyNutrients)?;
    info!(
        %barcode,
        rating,
        nutrients = normalized.nutrients.len(),
        additives = normalized.additives.len(),
        "product rated"
    );

    let resolution = persist(st, NewProduct::from_normalized(barcode, normalized, rating)).await;
    debug!(
        %barcode,
        origin = ?resolution.origin(),
        id = %resolution.product().row.id,
        "lookup resolved"
    );
    Ok(resolution)
}

/// Keyword search against the nutrition source, bounded by the fetch deadline.
/// Hits are neither rated nor stored.
#[instrument(skip(st))]
pub async fn search_products(
    st: &AppState,
    query: &str,
) -> Result<Vec<RawNutritionPayload>, LookupError> {
    match timeout(st.config.deadlines.fetch, st.source.search(query)).await {
        Ok(res) => Ok(res?),
        Err(_) => {
            warn!(%query, "product search timed out");
            Err(LookupError::Upstream("request timed out".into()))
        }
    }
}

/// Store read bounded by the store deadline. Failures read as a miss.
async fn find_stored(st: &AppState, barcode: &str) -> Option<Product> {
    match timeout(st.config.deadlines.store, st.store.find_by_barcode(barcode)).await {
        Ok(Ok(found)) => found,
        Ok(Err(e)) => {
            warn!(%barcode, error = %e, "product lookup in store failed");
            None
        }
        Err(_) => {
            warn!(%barcode, "product lookup in store timed out");
            None
        }
    }
}

async fn persist(st: &AppState, new: NewProduct) -> Resolution {
    let barcode = new.barcode.clone();
    let created = timeout(
        st.config.deadlines.store,
        st.store.create_product_with_nutrients(&new),
    )
    .await;

    match created {
        Ok(Ok(created)) => {
            info!(%barcode, id = %created.row.id, "product stored");
            // Re-read so store-generated fields come back canonical.
            let canonical = find_stored(st, &barcode).await.unwrap_or(created);
            Resolution::Stored(canonical)
        }
        Ok(Err(StoreError::UniqueViolation(_))) => {
            info!(%barcode, "product stored concurrently, re-reading");
            match find_stored(st, &barcode).await {
                Some(existing) => Resolution::Stored(existing),
                None => Resolution::Transient(new.into_transient()),
            }
        }
        Ok(Err(e)) => {
            warn!(%barcode, error = %e, "store unavailable, returning unsaved product");
            Resolution::Transient(new.into_transient())
        }
        Err(_) => {
            warn!(%barcode, "store write timed out, returning unsaved product");
            Resolution::Transient(new.into_transient())
        }
    }
}
