//! Pipeline stages for invoice extraction.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. switch rendering backend) without touching
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ encode ──▶ batch ──▶ vision ──▶ parse
//! (upload)  (pdfium)   (base64)  (planner)  (VLM)      (JSON + schema)
//! ```
//!
//! 1. [`input`]  — validate the uploaded file (content type, extension,
//!    magic bytes) before anything touches pdfium
//! 2. [`render`] — rasterise pages in document order; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 3. [`encode`] — PNG-encode and base64-wrap each page for the multimodal
//!    API request body
//! 4. [`batch`]  — partition the ordered page list into contiguous groups
//! 5. [`vision`] — the model client trait and the Ollama-style HTTP
//!    implementation; the only stage with network I/O
//! 6. [`parse`]  — strict JSON parse, brace-extraction fallback, and typed
//!    schema validation of the model's answer

pub mod batch;
pub mod encode;
pub mod input;
pub mod parse;
pub mod render;
pub mod vision;
