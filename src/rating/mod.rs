//! Pure nutrition rating pipeline: barcode check, metric catalog, unit
//! conversion, bucket classification, payload normalization and the
//! product-level aggregate. Nothing in here performs I/O.

pub mod aggregate;
pub mod barcode;
pub mod catalog;
pub mod classify;
pub mod convert;
pub mod normalize;
pub mod payload;

pub use aggregate::aggregate;
pub use barcode::{validate, FormatError};
pub use convert::ConversionError;
pub use normalize::{normalize, NormalizeError, NormalizedProduct};
pub use payload::RawNutritionPayload;
