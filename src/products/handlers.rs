use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tokio::time::timeout;
use tracing::{instrument, warn};

use super::dto::{
    NutrientResponse, Pagination, ProductListItem, ProductResponse, SearchHit, SearchQuery,
};
use super::services::{resolve_product, search_products};
use crate::{error::LookupError, rating::validate, state::AppState};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/:barcode", get(get_product))
        .route("/products/:barcode/nutrients", get(get_product_nutrients))
        .route("/search", get(search))
}

#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    Path(barcode): Path<String>,
) -> Result<Json<ProductResponse>, LookupError> {
    let resolved = resolve_product(&state, &barcode).await?;
    Ok(Json(resolved.into()))
}

/// Stored products only, newest first. A failing store yields an empty page.
#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
    Query(p): Query<Pagination>,
) -> Json<Vec<ProductListItem>> {
    let limit = p.limit.clamp(1, 100);
    let offset = p.offset.max(0);
    let listed = timeout(
        state.config.deadlines.store,
        state.store.list_products(limit, offset),
    )
    .await;
    let rows = match listed {
        Ok(Ok(rows)) => rows,
        Ok(Err(e)) => {
            warn!(error = %e, "list_products failed");
            Vec::new()
        }
        Err(_) => {
            warn!("list_products timed out");
            Vec::new()
        }
    };
    Json(rows.into_iter().map(Into::into).collect())
}

/// Nutrients of a stored product, worst rated first.
#[instrument(skip(state))]
pub async fn get_product_nutrients(
    State(state): State<AppState>,
    Path(barcode): Path<String>,
) -> Result<Json<Vec<NutrientResponse>>, (StatusCode, String)> {
    validate(&barcode).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let found = timeout(state.config.deadlines.store, state.store.find_by_barcode(&barcode))
        .await
        .map_err(|_| (StatusCode::SERVICE_UNAVAILABLE, "product store timed out".to_string()))?
        .map_err(|e| {
            warn!(error = %e, %barcode, "find_by_barcode failed");
            (StatusCode::SERVICE_UNAVAILABLE, e.to_string())
        })?;

    let Some(product) = found else {
        return Err((StatusCode::NOT_FOUND, "Product not found".into()));
    };

    let mut nutrients = product.nutrients;
    nutrients.sort_by(|a, b| b.rate_index.cmp(&a.rate_index));
    Ok(Json(nutrients.into_iter().map(Into::into).collect()))
}

/// Keyword search against Open Food Facts. Nothing is rated or stored.
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Vec<SearchHit>>, (StatusCode, String)> {
    let query = params.q.trim();
    if query.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Query parameter is required".into()));
    }

    let hits = search_products(&state, query)
        .await
        .map_err(|e| (e.status(), e.to_string()))?;
    Ok(Json(hits.into_iter().map(Into::into).collect()))
}
