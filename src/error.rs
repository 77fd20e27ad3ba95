//! Error types for the pdf2invoice library.
//!
//! Every failure during an extraction request is terminal for that request:
//! there is no per-batch retry, no partial success, and no fallback model.
//! A single enum therefore covers the whole surface, and the HTTP layer maps
//! each variant to a status code and response body in [`crate::http`].
//!
//! Upload-time rejections ([`Pdf2InvoiceError::NoFileUploaded`],
//! [`Pdf2InvoiceError::UnsupportedFileType`], [`Pdf2InvoiceError::MalformedUpload`])
//! happen before the orchestrator runs and map to client-error statuses;
//! everything else is a server-side extraction failure.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the pdf2invoice library.
#[derive(Debug, Error)]
pub enum Pdf2InvoiceError {
    // ── Upload errors ─────────────────────────────────────────────────────
    /// The multipart request contained no `file` field.
    #[error("no file uploaded (expected a multipart field named 'file')")]
    NoFileUploaded,

    /// The multipart body could not be read (truncated, oversized, malformed).
    #[error("malformed upload: {detail}")]
    MalformedUpload { detail: String },

    /// The uploaded file is not a PDF (by content type, extension, or magic bytes).
    #[error("unsupported file type: {detail}\nOnly PDF uploads are accepted.")]
    UnsupportedFileType { detail: String },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be opened.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// The renderer produced zero page images. An empty document is an
    /// extraction failure, never an empty success.
    #[error("no pages could be rendered from '{path}'")]
    NoPagesRendered { path: PathBuf },

    /// pdfium returned an error while rasterising a specific page.
    #[error("rasterisation failed for page {page}: {detail}")]
    RenderFailed { page: usize, detail: String },

    // ── Model errors ──────────────────────────────────────────────────────
    /// Transport failure talking to the vision model endpoint.
    #[error("model call failed for batch {batch}: {detail}")]
    ModelCallFailed { batch: usize, detail: String },

    /// The model call exceeded the configured timeout.
    #[error("model call for batch {batch} timed out after {secs}s")]
    ModelCallTimeout { batch: usize, secs: u64 },

    /// The model's response text was not JSON, even after brace extraction.
    #[error("model did not return valid JSON for batch {batch}: {detail}")]
    InvalidModelOutput { batch: usize, detail: String },

    /// The model's JSON did not conform to the candidate record schema.
    #[error("model output for batch {batch} failed schema validation: {detail}")]
    SchemaValidation { batch: usize, detail: String },

    /// The fully merged record failed final validation. Indicates an
    /// internal inconsistency since every batch already validated.
    #[error("merged record failed final validation: {detail}")]
    FinalValidation { detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/dir containing libpdfium, or install pdfium system-wide."
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Pdf2InvoiceError {
    /// True when the error is the caller's fault and the request never
    /// reached the extraction orchestrator.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Pdf2InvoiceError::NoFileUploaded
                | Pdf2InvoiceError::MalformedUpload { .. }
                | Pdf2InvoiceError::UnsupportedFileType { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_errors_are_client_errors() {
        assert!(Pdf2InvoiceError::NoFileUploaded.is_client_error());
        assert!(Pdf2InvoiceError::UnsupportedFileType {
            detail: "text/plain".into()
        }
        .is_client_error());
        assert!(!Pdf2InvoiceError::NoPagesRendered {
            path: "x.pdf".into()
        }
        .is_client_error());
    }

    #[test]
    fn invalid_output_display_names_batch() {
        let e = Pdf2InvoiceError::InvalidModelOutput {
            batch: 2,
            detail: "expected value at line 1".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("batch 2"), "got: {msg}");
        assert!(msg.contains("valid JSON"), "got: {msg}");
    }

    #[test]
    fn timeout_display() {
        let e = Pdf2InvoiceError::ModelCallTimeout { batch: 1, secs: 300 };
        assert!(e.to_string().contains("300s"));
    }
}
