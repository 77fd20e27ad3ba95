//! Invoice record types and the merge fold.
//!
//! A PDF is processed as a sequence of page batches, each producing a
//! [`CandidateRecord`] from the model. Candidates are folded into a single
//! [`InvoiceRecord`] with a fixed precedence policy:
//!
//! * **Scalar fields** — first non-null wins. Once a field is set, a later
//!   batch never overwrites it, even with a different non-null value.
//!   Conflicts are logged at `warn!` for observability but the outcome is
//!   unchanged.
//! * **Line items** — concatenated in batch order.
//! * **`pages_processed`** — running sum of the *actual* pages in each
//!   batch. The model's own claim is deserialized (so it is type-checked)
//!   and then ignored.
//!
//! The merged record is an explicit value threaded through a sequential
//! fold in [`crate::extract`], never shared mutable state, so the precedence
//! policy does not depend on task-scheduler ordering.

use crate::error::Pdf2InvoiceError;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One invoice line item. Every field is a verbatim transcription or null;
/// no numeric parsing happens on the service side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: Option<String>,
    pub quantity: Option<String>,
    pub unit_price: Option<String>,
    pub amount: Option<String>,
}

/// One batch's structured extraction output, as returned by the model.
///
/// Deserialized with every field optional: the model may omit anything it
/// could not read. A present field of the wrong type is a schema violation
/// and aborts the request (see [`crate::pipeline::parse`]).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CandidateRecord {
    pub document_type: Option<String>,
    pub invoice_number: Option<String>,
    pub date: Option<String>,
    pub vendor: Option<String>,
    pub buyer: Option<String>,
    pub total: Option<String>,
    pub currency: Option<String>,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    /// The model's self-reported page count. Never trusted by the merge.
    #[serde(default)]
    pub pages_processed: Option<u64>,
}

/// The accumulated extraction result for one whole document.
///
/// Created empty at the start of a request, mutated once per batch via
/// [`InvoiceRecord::absorb`], and finalized with [`InvoiceRecord::finalize`]
/// before being returned. Request-local; no cross-request state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    pub document_type: Option<String>,
    pub invoice_number: Option<String>,
    pub date: Option<String>,
    pub vendor: Option<String>,
    pub buyer: Option<String>,
    pub total: Option<String>,
    pub currency: Option<String>,
    pub line_items: Vec<LineItem>,
    pub pages_processed: u64,
}

impl InvoiceRecord {
    /// Fold one batch's candidate into the merged record.
    ///
    /// `batch_pages` is the number of page images actually sent in the
    /// batch, which is what the page counter sums — not the model's claim.
    pub fn absorb(&mut self, candidate: CandidateRecord, batch_pages: usize) {
        adopt(&mut self.document_type, candidate.document_type, "document_type");
        adopt(&mut self.invoice_number, candidate.invoice_number, "invoice_number");
        adopt(&mut self.date, candidate.date, "date");
        adopt(&mut self.vendor, candidate.vendor, "vendor");
        adopt(&mut self.buyer, candidate.buyer, "buyer");
        adopt(&mut self.total, candidate.total, "total");
        adopt(&mut self.currency, candidate.currency, "currency");
        self.line_items.extend(candidate.line_items);
        self.pages_processed += batch_pages as u64;
    }

    /// Count of scalar fields currently set, for end-of-request logging.
    pub fn fields_set(&self) -> usize {
        [
            &self.document_type,
            &self.invoice_number,
            &self.date,
            &self.vendor,
            &self.buyer,
            &self.total,
            &self.currency,
        ]
        .iter()
        .filter(|f| f.is_some())
        .count()
    }

    /// Re-validate the merged record against the complete schema and return
    /// it as JSON.
    ///
    /// Per-batch validation should make failure here impossible, but the
    /// round trip is not assumed infallible; a failure surfaces as
    /// [`Pdf2InvoiceError::FinalValidation`].
    pub fn finalize(&self) -> Result<serde_json::Value, Pdf2InvoiceError> {
        let value = serde_json::to_value(self).map_err(|e| Pdf2InvoiceError::FinalValidation {
            detail: e.to_string(),
        })?;
        serde_json::from_value::<InvoiceRecord>(value.clone()).map_err(|e| {
            Pdf2InvoiceError::FinalValidation {
                detail: e.to_string(),
            }
        })?;
        Ok(value)
    }
}

/// First-non-null-wins adoption of one scalar field.
///
/// A later conflicting non-null value is discarded; we log it so silent data
/// loss is at least visible in the trace.
fn adopt(slot: &mut Option<String>, incoming: Option<String>, field: &'static str) {
    match (slot.as_deref(), incoming) {
        (None, Some(value)) => *slot = Some(value),
        (Some(kept), Some(discarded)) if kept != discarded => {
            warn!(field, kept, %discarded, "later batch conflicts with merged value; keeping first");
        }
        _ => {}
    }
}
