//! PDF rasterisation: render every page to a `DynamicImage` via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto a dedicated thread pool
//! thread designed for blocking operations, preventing the Tokio worker
//! threads from stalling during CPU-heavy rendering.
//!
//! ## Why iterate instead of trusting the page count?
//!
//! Truncated documents can report more pages than pdfium can actually hand
//! out. The loop asks for pages one at a time and stops when pdfium says
//! "no more", so a damaged tail yields fewer pages rather than an error.
//! Zero pages is the orchestrator's problem — it treats that as fatal.

use crate::config::ExtractionConfig;
use crate::error::Pdf2InvoiceError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info, warn};

/// Rasterise every page of a PDF into images, in document order.
///
/// Runs inside `spawn_blocking` since pdfium operations are CPU-bound.
pub async fn render_pdf(
    pdf_path: &Path,
    config: &ExtractionConfig,
) -> Result<Vec<DynamicImage>, Pdf2InvoiceError> {
    let path = pdf_path.to_path_buf();
    let max_pixels = config.max_rendered_pixels;
    let dpi = config.dpi;

    tokio::task::spawn_blocking(move || render_blocking(&path, dpi, max_pixels))
        .await
        .map_err(|e| Pdf2InvoiceError::Internal(format!("render task panicked: {e}")))?
}

/// Blocking implementation of page rendering.
fn render_blocking(
    pdf_path: &Path,
    dpi: u32,
    max_pixels: u32,
) -> Result<Vec<DynamicImage>, Pdf2InvoiceError> {
    let pdfium = bind_pdfium()?;

    let document =
        pdfium
            .load_pdf_from_file(pdf_path, None)
            .map_err(|e| Pdf2InvoiceError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: format!("{e:?}"),
            })?;

    let pages = document.pages();
    info!(declared_pages = pages.len(), "PDF loaded");

    // Cap the longest edge so page geometry cannot force an unbounded
    // bitmap; within that cap, scale to the configured DPI (points are
    // 1/72 inch, so the scale factor is dpi/72).
    let render_config = PdfRenderConfig::new()
        .scale_page_by_factor(dpi as f32 / 72.0)
        .set_maximum_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    let mut images = Vec::new();
    let mut index: u16 = 0;
    loop {
        let page = match pages.get(index) {
            Ok(p) => p,
            // pdfium signals "no more pages" here; a truncated document
            // simply yields fewer images than it declared.
            Err(_) => break,
        };

        let bitmap = page.render_with_config(&render_config).map_err(|e| {
            Pdf2InvoiceError::RenderFailed {
                page: index as usize + 1,
                detail: format!("{e:?}"),
            }
        })?;

        let image = bitmap.as_image();
        debug!(
            page = index as usize + 1,
            width = image.width(),
            height = image.height(),
            "rendered page"
        );
        images.push(image);
        index += 1;
    }

    if (images.len() as u16) < pages.len() {
        warn!(
            rendered = images.len(),
            declared = pages.len(),
            "document yielded fewer pages than declared"
        );
    }

    Ok(images)
}

/// Bind to a pdfium shared library.
///
/// Resolution order: `PDFIUM_LIB_PATH`, the working directory, then the
/// system library path.
fn bind_pdfium() -> Result<Pdfium, Pdf2InvoiceError> {
    if let Ok(dir) = std::env::var("PDFIUM_LIB_PATH") {
        if let Ok(bindings) =
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&dir))
        {
            return Ok(Pdfium::new(bindings));
        }
        warn!(%dir, "PDFIUM_LIB_PATH set but binding failed; trying fallbacks");
    }

    Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map(Pdfium::new)
        .map_err(|e| Pdf2InvoiceError::PdfiumBindingFailed(format!("{e:?}")))
}
