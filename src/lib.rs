//! # pdf2invoice
//!
//! Extract structured invoice data from PDFs with a local vision language
//! model.
//!
//! An uploaded PDF is rasterised page by page, the pages are grouped into
//! contiguous batches, and each batch is shown to a vision model that
//! returns the invoice fields it can read as JSON. The per-batch results
//! are folded into one record under a fixed precedence policy
//! (first-non-null-wins for scalars, concatenation for line items) and the
//! validated result is returned as JSON.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF upload
//!  │
//!  ├─ 1. Input    validate content type, extension, %PDF magic bytes
//!  ├─ 2. Render   rasterise pages via pdfium (CPU-bound, spawn_blocking)
//!  ├─ 3. Encode   PNG → base64 page payloads
//!  ├─ 4. Batch    contiguous groups of ≤ max_batch_size pages
//!  ├─ 5. Vision   one sequential model call per batch (Ollama-style API)
//!  ├─ 6. Parse    strict JSON (+ brace-extraction fallback) → candidate
//!  └─ 7. Merge    first-non-null-wins fold → finalized invoice record
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2invoice::{extract_pdf, ExtractionConfig, OllamaClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::default();
//!     let model = OllamaClient::new(&config)?;
//!     let result = extract_pdf("invoice.pdf".as_ref(), &config, &model).await?;
//!     println!("{} pages → {}", result.pages, result.data);
//!     Ok(())
//! }
//! ```
//!
//! The HTTP service (`POST /api/extract`, multipart field `file`) is a thin
//! wrapper over [`extract_pdf`]; see [`http::app`].
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | on      | Enables the `pdf2invoice` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod http;
pub mod pipeline;
pub mod prompts;
pub mod record;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder};
pub use error::Pdf2InvoiceError;
pub use extract::{extract_from_pages, extract_pdf, Extraction};
pub use http::{app, AppState, MAX_UPLOAD_BYTES};
pub use pipeline::encode::PageImage;
pub use pipeline::vision::{OllamaClient, VisionModel};
pub use record::{CandidateRecord, InvoiceRecord, LineItem};
