use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::openfoodfacts::SourceError;
use crate::rating::{ConversionError, FormatError, NormalizeError};

/// Why a barcode could not be resolved to a rated product.
///
/// Storage failures never show up here; the lookup absorbs them.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error("product with barcode {0} not found")]
    NotFound(String),
    #[error("product doesn't have any tracked nutrients")]
    EmptyNutrients,
    #[error(transparent)]
    Conversion(#[from] ConversionError),
    #[error("nutrition source unavailable: {0}")]
    Upstream(String),
}

impl From<NormalizeError> for LookupError {
    fn from(e: NormalizeError) -> Self {
        match e {
            NormalizeError::EmptyNutrients => Self::EmptyNutrients,
            NormalizeError::Conversion(c) => Self::Conversion(c),
        }
    }
}

impl From<SourceError> for LookupError {
    fn from(e: SourceError) -> Self {
        match e {
            SourceError::NotFound(barcode) => Self::NotFound(barcode),
            SourceError::Upstream(msg) => Self::Upstream(msg),
        }
    }
}

impl LookupError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Format(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::EmptyNutrients => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Conversion(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for LookupError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
