//! HTTP surface: the upload endpoint, the health endpoint, and the mapping
//! from [`Pdf2InvoiceError`] to status codes and response bodies.
//!
//! ## Response contract
//!
//! * Success: `200` with `{ "ok": true, "pages": N, "data": {…} }`.
//! * Upload rejected (no file, wrong type, malformed multipart): `400` with
//!   `{ "error": "…" }` — the request never reached the orchestrator.
//! * Extraction failure: `500` with `{ "ok": false, "error": "…" }`.
//!
//! The router is built by [`app`] so integration tests can drive it
//! in-process with `tower::ServiceExt::oneshot` and a scripted fake model.
//!
//! ## File hygiene
//!
//! The uploaded body lives in a [`tempfile::NamedTempFile`] whose RAII drop
//! removes it on every exit path — success, any error, or panic unwind.
//! Cleanup failures are swallowed by the tempfile crate, never surfaced.

use crate::config::ExtractionConfig;
use crate::error::Pdf2InvoiceError;
use crate::extract::extract_pdf;
use crate::pipeline::input::validate_upload;
use crate::pipeline::vision::VisionModel;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::io::Write;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Maximum accepted upload size: 50 MB.
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Shared per-request dependencies. Cheap to clone; requests share no
/// mutable state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ExtractionConfig>,
    pub model: Arc<dyn VisionModel>,
}

/// Build the service router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/api/extract", post(extract_handler))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Fixed plain-text liveness acknowledgment.
async fn health() -> &'static str {
    "ok"
}

/// Accept one uploaded PDF and run the extraction pipeline on it.
async fn extract_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<serde_json::Value>, Pdf2InvoiceError> {
    let upload = read_file_field(multipart).await?;
    validate_upload(
        upload.filename.as_deref(),
        upload.content_type.as_deref(),
        &upload.bytes,
    )?;

    info!(
        size = upload.bytes.len(),
        filename = upload.filename.as_deref().unwrap_or("<none>"),
        "upload accepted"
    );

    // Dropped on every exit path below, deleting the file.
    let mut tmp = tempfile::NamedTempFile::new()
        .map_err(|e| Pdf2InvoiceError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(&upload.bytes)
        .map_err(|e| Pdf2InvoiceError::Internal(format!("tempfile write: {e}")))?;

    let extraction = extract_pdf(tmp.path(), &state.config, state.model.as_ref()).await?;

    Ok(Json(json!({
        "ok": true,
        "pages": extraction.pages,
        "data": extraction.data,
    })))
}

struct Upload {
    filename: Option<String>,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

/// Pull the `file` field out of the multipart body.
async fn read_file_field(mut multipart: Multipart) -> Result<Upload, Pdf2InvoiceError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Pdf2InvoiceError::MalformedUpload {
            detail: e.to_string(),
        })?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| Pdf2InvoiceError::MalformedUpload {
                detail: e.to_string(),
            })?;
        return Ok(Upload {
            filename,
            content_type,
            bytes: bytes.to_vec(),
        });
    }
    Err(Pdf2InvoiceError::NoFileUploaded)
}

impl IntoResponse for Pdf2InvoiceError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        if self.is_client_error() {
            // Upload-time rejection: the orchestrator never ran.
            (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
        } else {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "ok": false, "error": message })),
            )
                .into_response()
        }
    }
}
