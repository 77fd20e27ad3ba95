//! The extraction orchestrator: drive one request to completion or failure.
//!
//! Per request: render every page, fail fast on zero pages, partition into
//! contiguous batches, then fold batch results into one [`InvoiceRecord`]
//! strictly in order. Each model call completes before the next begins —
//! the first-non-null-wins merge policy is only deterministic under
//! sequential processing, so batches are never run concurrently.
//!
//! Every failure is terminal for the request. There is no partial success,
//! no per-batch retry, and no fallback model.

use crate::config::ExtractionConfig;
use crate::error::Pdf2InvoiceError;
use crate::pipeline::batch::plan_batches;
use crate::pipeline::encode::{encode_page, PageImage};
use crate::pipeline::parse::parse_candidate;
use crate::pipeline::render::render_pdf;
use crate::pipeline::vision::VisionModel;
use crate::prompts::{batch_prompt, SYSTEM_PROMPT};
use crate::record::InvoiceRecord;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// The finished result of one extraction request.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Total pages rendered from the document.
    pub pages: usize,
    /// The finalized merged record as JSON.
    pub data: serde_json::Value,
}

/// Extract structured invoice data from a PDF on disk.
///
/// The primary library entry point; the HTTP layer calls this after upload
/// validation, and the env-gated e2e test calls it directly.
pub async fn extract_pdf(
    pdf_path: &Path,
    config: &ExtractionConfig,
    model: &dyn VisionModel,
) -> Result<Extraction, Pdf2InvoiceError> {
    let rendered = render_pdf(pdf_path, config).await?;
    if rendered.is_empty() {
        return Err(Pdf2InvoiceError::NoPagesRendered {
            path: pdf_path.to_path_buf(),
        });
    }

    let pages = rendered
        .iter()
        .enumerate()
        .map(|(i, img)| encode_page(i + 1, img))
        .collect::<Result<Vec<_>, _>>()?;

    extract_from_pages(&pages, config, model).await
}

/// Run the batch fold over already-rendered pages.
///
/// Split out from [`extract_pdf`] so the orchestration semantics are
/// testable without pdfium or a real model.
pub async fn extract_from_pages(
    pages: &[PageImage],
    config: &ExtractionConfig,
    model: &dyn VisionModel,
) -> Result<Extraction, Pdf2InvoiceError> {
    if pages.is_empty() {
        return Err(Pdf2InvoiceError::NoPagesRendered {
            path: "<in-memory>".into(),
        });
    }

    let batches = plan_batches(pages, config.max_batch_size);
    let batch_count = batches.len();
    info!(
        pages = pages.len(),
        batches = batch_count,
        batch_size = config.max_batch_size,
        "extraction planned"
    );

    let mut merged = InvoiceRecord::default();
    for (i, batch) in batches.into_iter().enumerate() {
        let ordinal = i + 1;
        let user = batch_prompt(ordinal, batch_count);

        let start = Instant::now();
        let text = model.complete(SYSTEM_PROMPT, &user, batch, ordinal).await?;
        debug!(
            batch = ordinal,
            pages = batch.len(),
            ms = start.elapsed().as_millis() as u64,
            "model call complete"
        );

        let candidate = parse_candidate(&text, ordinal)?;
        merged.absorb(candidate, batch.len());
    }

    let data = merged.finalize()?;
    info!(
        pages = pages.len(),
        fields_set = merged.fields_set(),
        line_items = merged.line_items.len(),
        "extraction complete"
    );

    Ok(Extraction {
        pages: pages.len(),
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Scripted model: pops one canned response per call and records what
    /// it was asked.
    struct ScriptedModel {
        responses: Mutex<Vec<String>>,
        calls: Mutex<Vec<(usize, usize)>>, // (batch ordinal, images in batch)
    }

    impl ScriptedModel {
        fn new(responses: &[&str]) -> Self {
            let mut r: Vec<String> = responses.iter().map(|s| s.to_string()).collect();
            r.reverse(); // pop() then yields in script order
            Self {
                responses: Mutex::new(r),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(usize, usize)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl VisionModel for ScriptedModel {
        async fn complete(
            &self,
            _system: &str,
            user: &str,
            images: &[PageImage],
            batch: usize,
        ) -> Result<String, Pdf2InvoiceError> {
            assert!(user.contains(&format!("batch {batch} of")));
            self.calls.lock().unwrap().push((batch, images.len()));
            self.responses
                .lock()
                .unwrap()
                .pop()
                .ok_or(Pdf2InvoiceError::ModelCallFailed {
                    batch,
                    detail: "script exhausted".into(),
                })
        }
    }

    fn pages(n: usize) -> Vec<PageImage> {
        (1..=n)
            .map(|page| PageImage {
                page,
                data: format!("fake-page-{page}"),
            })
            .collect()
    }

    fn config(batch_size: usize) -> ExtractionConfig {
        ExtractionConfig::builder()
            .max_batch_size(batch_size)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn two_pages_batch_six_is_one_call() {
        let model = ScriptedModel::new(&[r#"{"vendor": "Acme"}"#]);
        let result = extract_from_pages(&pages(2), &config(6), &model)
            .await
            .unwrap();
        assert_eq!(result.pages, 2);
        assert_eq!(model.calls(), vec![(1, 2)]);
        assert_eq!(result.data["vendor"], "Acme");
        assert_eq!(result.data["pages_processed"], 2);
    }

    #[tokio::test]
    async fn ten_pages_batch_six_is_two_sequential_calls() {
        let model = ScriptedModel::new(&[
            r#"{"vendor": null, "total": "250.00"}"#,
            r#"{"vendor": "Acme", "total": "999.99"}"#,
        ]);
        let result = extract_from_pages(&pages(10), &config(6), &model)
            .await
            .unwrap();
        assert_eq!(model.calls(), vec![(1, 6), (2, 4)]);
        // vendor was null in batch 1, adopted from batch 2;
        // total was set in batch 1, the conflicting batch-2 value is discarded
        assert_eq!(result.data["vendor"], "Acme");
        assert_eq!(result.data["total"], "250.00");
        assert_eq!(result.data["pages_processed"], 10);
    }

    #[tokio::test]
    async fn zero_pages_is_fatal() {
        let model = ScriptedModel::new(&[]);
        let err = extract_from_pages(&[], &config(6), &model).await.unwrap_err();
        assert!(matches!(err, Pdf2InvoiceError::NoPagesRendered { .. }));
        assert!(model.calls().is_empty());
    }

    #[tokio::test]
    async fn invalid_json_aborts_request() {
        let model = ScriptedModel::new(&["total is one hundred", r#"{"vendor": "never asked"}"#]);
        let err = extract_from_pages(&pages(10), &config(6), &model)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Pdf2InvoiceError::InvalidModelOutput { batch: 1, .. }
        ));
        // The failing batch stopped the fold; batch 2 was never called
        assert_eq!(model.calls().len(), 1);
    }

    #[tokio::test]
    async fn transport_failure_aborts_request() {
        let model = ScriptedModel::new(&[r#"{"vendor": "Acme"}"#]); // script runs dry on call 2
        let err = extract_from_pages(&pages(10), &config(6), &model)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Pdf2InvoiceError::ModelCallFailed { batch: 2, .. }
        ));
    }

    #[tokio::test]
    async fn wrong_field_type_aborts_request() {
        let model = ScriptedModel::new(&[r#"{"total": 100}"#]);
        let err = extract_from_pages(&pages(1), &config(6), &model)
            .await
            .unwrap_err();
        assert!(matches!(err, Pdf2InvoiceError::SchemaValidation { .. }));
    }

    #[tokio::test]
    async fn line_items_accumulate_across_batches() {
        let model = ScriptedModel::new(&[
            r#"{"line_items": [{"description": "a", "quantity": "1", "unit_price": null, "amount": null}]}"#,
            r#"{"line_items": [
                {"description": "b", "quantity": null, "unit_price": null, "amount": null},
                {"description": "c", "quantity": null, "unit_price": null, "amount": null}
            ]}"#,
        ]);
        let result = extract_from_pages(&pages(8), &config(6), &model)
            .await
            .unwrap();
        let items = result.data["line_items"].as_array().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0]["description"], "a");
        assert_eq!(items[1]["description"], "b");
        assert_eq!(items[2]["description"], "c");
    }

    #[tokio::test]
    async fn chatty_response_still_succeeds() {
        let model =
            ScriptedModel::new(&["here is the json: {\"total\":\"100\"} thanks"]);
        let result = extract_from_pages(&pages(1), &config(6), &model)
            .await
            .unwrap();
        assert_eq!(result.data["total"], "100");
    }
}
