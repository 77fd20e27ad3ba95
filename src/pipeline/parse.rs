//! Model output parsing: strict JSON, one brace-extraction fallback, and
//! typed schema validation.
//!
//! The model is instructed to respond with bare JSON, but vision models
//! chat anyway ("here is the json: {…} thanks"). Recovery is deliberately
//! narrow: if strict parsing fails, take the substring from the first `{`
//! to the last `}` inclusive and parse that — nothing more. If that also
//! fails the request dies with an invalid-JSON error.
//!
//! Schema validation is serde's typed deserialize into
//! [`CandidateRecord`]: a missing or null field becomes `None`, a present
//! field of the wrong type is an error that aborts the whole request.
//! Unknown keys are ignored, matching the partial/optional schema.

use crate::error::Pdf2InvoiceError;
use crate::record::CandidateRecord;
use serde_json::Value;

/// Parse one batch's model response into a validated candidate record.
///
/// `batch` is 1-based and only used for error messages.
pub fn parse_candidate(text: &str, batch: usize) -> Result<CandidateRecord, Pdf2InvoiceError> {
    let value = parse_lenient(text).ok_or_else(|| Pdf2InvoiceError::InvalidModelOutput {
        batch,
        detail: format!("response was not JSON, even after brace extraction: {}", snippet(text)),
    })?;

    serde_json::from_value(value).map_err(|e| Pdf2InvoiceError::SchemaValidation {
        batch,
        detail: e.to_string(),
    })
}

/// Strict parse first, then the whole-response brace-extraction fallback.
fn parse_lenient(text: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str(text) {
        return Some(value);
    }
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

/// First 120 chars of the offending response, for error messages.
fn snippet(text: &str) -> String {
    let mut s: String = text.chars().take(120).collect();
    if s.len() < text.len() {
        s.push('…');
    }
    s
}
