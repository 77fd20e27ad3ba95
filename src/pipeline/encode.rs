//! Image encoding: `DynamicImage` → base64 PNG wrapped in [`PageImage`].
//!
//! The Ollama-style chat API accepts images as plain base64 strings embedded
//! in the JSON request body. PNG is chosen over JPEG because it is lossless —
//! text crispness matters far more than file size for field transcription
//! accuracy.

use crate::error::Pdf2InvoiceError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// One rendered PDF page, ready to embed in a model request.
///
/// Immutable once created; discarded when the request completes.
#[derive(Debug, Clone)]
pub struct PageImage {
    /// 1-based page ordinal in document order.
    pub page: usize,
    /// Base64-encoded PNG bytes.
    pub data: String,
}

/// Encode a rasterised page as a base64 PNG payload.
pub fn encode_page(page: usize, img: &DynamicImage) -> Result<PageImage, Pdf2InvoiceError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| Pdf2InvoiceError::RenderFailed {
            page,
            detail: format!("PNG encoding failed: {e}"),
        })?;

    let data = STANDARD.encode(&buf);
    debug!(page, bytes = data.len(), "encoded page");

    Ok(PageImage { page, data })
}
