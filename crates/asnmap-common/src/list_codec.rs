//! Codec for list-valued columns.
//!
//! Sibling ASNs and reference organizations are stored in a single text
//! column. The on-disk format is a JSON array of strings (`["1","2"]`); an
//! empty column decodes to an empty list so rows written before a field was
//! populated stay readable.

use crate::error::{AsnMapError, Result};

/// Encode a list of strings as a JSON array.
pub fn encode_list(values: &[String]) -> Result<String> {
    Ok(serde_json::to_string(values)?)
}

/// Decode a column written by [`encode_list`].
///
/// `field` names the column and is only used for error context.
pub fn decode_list(field: &str, raw: &str) -> Result<Vec<String>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    serde_json::from_str::<Vec<String>>(trimmed).map_err(|e| AsnMapError::ListCodec {
        field: field.to_string(),
        message: e.to_string(),
    })
}
