use lazy_static::lazy_static;
use regex::Regex;

/// Barcode did not match the 8 to 13 digit shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("barcode format error: `{0}` is not 8 to 13 digits")]
pub struct FormatError(pub String);

pub(crate) fn is_valid_barcode(barcode: &str) -> bool {
    lazy_static! {
        // ASCII only: `\d` would also accept other Unicode digits.
        static ref BARCODE_RE: Regex = Regex::new(r"^[0-9]{8,13}$").unwrap();
    }
    BARCODE_RE.is_match(barcode)
}

pub fn validate(barcode: &str) -> Result<(), FormatError> {
    if is_valid_barcode(barcode) {
        Ok(())
    } else {
        Err(FormatError(barcode.to_string()))
    }
}
