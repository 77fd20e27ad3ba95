//! Prompts for VLM-based invoice field extraction.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — the JSON shape the model is asked for
//!    must stay in lockstep with [`crate::record::CandidateRecord`]; there
//!    is exactly one place where that shape is spelled out.
//!
//! 2. **Testability** — unit tests can inspect prompts directly without
//!    spinning up a real VLM, making prompt regressions easy to catch.

/// System prompt sent with every batch.
///
/// The response is parsed strictly as JSON (with a single brace-extraction
/// fallback), so the prompt forbids everything that would break that.
pub const SYSTEM_PROMPT: &str = "You are a precise data-extraction engine for business documents. \
You respond with a single JSON object and nothing else: \
no markdown fences, no commentary, no explanations, no text before or after the JSON.";

/// Build the user instruction for one batch.
///
/// `batch` is 1-based; `batch_count` is the total number of batches for the
/// document. The model is told its position so it does not re-describe
/// pages it cannot see.
pub fn batch_prompt(batch: usize, batch_count: usize) -> String {
    format!(
        r#"The attached images are the pages of batch {batch} of {batch_count} from one invoice or similar business document.

Extract the document's fields into exactly this JSON shape:

{{
  "document_type": string or null,
  "invoice_number": string or null,
  "date": string or null,
  "vendor": string or null,
  "buyer": string or null,
  "total": string or null,
  "currency": string or null,
  "line_items": [
    {{"description": string or null, "quantity": string or null, "unit_price": string or null, "amount": string or null}}
  ],
  "pages_processed": number
}}

Rules:
- Every value must be a string or null. If a field is not visible on these pages, use null. If no line items are visible, use an empty array.
- "currency" must be the ISO 4217 code (e.g. "EUR", "USD") when the currency is visually identifiable from a symbol or name; otherwise null.
- Transcribe "total" and all amounts verbatim as printed. Never compute, round, or invent values.
- "pages_processed" is the number of page images in this batch.
- Respond with the JSON object only."#
    )
}
