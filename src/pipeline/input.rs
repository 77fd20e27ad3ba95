//! Upload validation: reject anything that is not a PDF before pdfium sees it.
//!
//! Two layers of checking:
//!
//! 1. **Declared type** — the multipart field must either carry the
//!    `application/pdf` content type or a `.pdf` filename extension.
//! 2. **Magic bytes** — the body must begin with `%PDF` (after an optional
//!    UTF-8 BOM). Browsers and proxies routinely mislabel uploads, and a
//!    meaningful error here beats a pdfium crash later.

use crate::error::Pdf2InvoiceError;
use tracing::debug;

const PDF_MAGIC: &[u8] = b"%PDF";
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Validate an uploaded file's declared type and magic bytes.
///
/// `filename` and `content_type` are the values declared by the client in
/// the multipart field; either is optional in the wire format.
pub fn validate_upload(
    filename: Option<&str>,
    content_type: Option<&str>,
    bytes: &[u8],
) -> Result<(), Pdf2InvoiceError> {
    let declared_pdf = content_type
        .map(|ct| ct.eq_ignore_ascii_case("application/pdf"))
        .unwrap_or(false)
        || filename
            .map(|name| name.to_ascii_lowercase().ends_with(".pdf"))
            .unwrap_or(false);

    if !declared_pdf {
        return Err(Pdf2InvoiceError::UnsupportedFileType {
            detail: format!(
                "expected a PDF, got content type {:?} and filename {:?}",
                content_type.unwrap_or("<none>"),
                filename.unwrap_or("<none>")
            ),
        });
    }

    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    if !body.starts_with(PDF_MAGIC) {
        return Err(Pdf2InvoiceError::UnsupportedFileType {
            detail: format!(
                "file does not start with %PDF (first bytes: {:?})",
                &body[..body.len().min(4)]
            ),
        });
    }

    debug!(
        size = bytes.len(),
        filename = filename.unwrap_or("<none>"),
        "upload validated"
    );
    Ok(())
}
