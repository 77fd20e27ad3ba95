//! Configuration types for invoice extraction.
//!
//! All behaviour is controlled through [`ExtractionConfig`], built via its
//! [`ExtractionConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share configs across requests, serialise them for logging, and
//! diff two runs to understand why their outputs differ.

use crate::error::Pdf2InvoiceError;
use serde::{Deserialize, Serialize};

/// Configuration for one extraction service instance.
///
/// Built via [`ExtractionConfig::builder()`] or [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2invoice::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .dpi(150)
///     .max_batch_size(6)
///     .model("llama3.2-vision")
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Rendering DPI used when rasterising each PDF page. Range: 72–400. Default: 150.
    ///
    /// 150 DPI is the sweet spot: invoice text is sharp enough for a VLM to
    /// read reliably while image payloads stay small. Increase to 200–300 for
    /// small-font documents.
    pub dpi: u32,

    /// Maximum rendered image dimension (width or height) in pixels. Default: 2000.
    ///
    /// A safety cap independent of DPI. A malicious page geometry (an A0
    /// poster at 300 DPI) could otherwise allocate an unbounded bitmap.
    /// pdfium scales the other dimension proportionally.
    pub max_rendered_pixels: u32,

    /// Maximum number of page images sent to the model in one call. Default: 6.
    ///
    /// Batches are contiguous and processed strictly in order; the merge
    /// policy (first-non-null-wins) is defined in terms of that order.
    pub max_batch_size: usize,

    /// Vision model identifier, e.g. "llama3.2-vision" or "qwen2.5vl".
    pub model: String,

    /// Base URL of the local inference endpoint (Ollama-style API).
    pub endpoint: String,

    /// Per-model-call timeout in seconds. Default: 300.
    ///
    /// A batch of six full-page images can legitimately take minutes on a
    /// local model. A timeout aborts the whole request; there is no retry.
    pub model_timeout_secs: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            dpi: 150,
            max_rendered_pixels: 2000,
            max_batch_size: 6,
            model: "llama3.2-vision".to_string(),
            endpoint: "http://127.0.0.1:11434".to_string(),
            model_timeout_secs: 300,
        }
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 400);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn max_batch_size(mut self, n: usize) -> Self {
        self.config.max_batch_size = n.max(1);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    pub fn model_timeout_secs(mut self, secs: u64) -> Self {
        self.config.model_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, Pdf2InvoiceError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 400 {
            return Err(Pdf2InvoiceError::InvalidConfig(format!(
                "DPI must be 72–400, got {}",
                c.dpi
            )));
        }
        if c.max_batch_size == 0 {
            return Err(Pdf2InvoiceError::InvalidConfig(
                "max batch size must be ≥ 1".into(),
            ));
        }
        if c.model.is_empty() {
            return Err(Pdf2InvoiceError::InvalidConfig("model must be set".into()));
        }
        if c.endpoint.is_empty() {
            return Err(Pdf2InvoiceError::InvalidConfig(
                "endpoint URL must be set".into(),
            ));
        }
        if c.model_timeout_secs == 0 {
            return Err(Pdf2InvoiceError::InvalidConfig(
                "model timeout must be ≥ 1s".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_build() {
        let config = ExtractionConfig::builder().build().unwrap();
        assert_eq!(config.dpi, 150);
        assert_eq!(config.max_batch_size, 6);
        assert_eq!(config.model_timeout_secs, 300);
    }

    #[test]
    fn dpi_is_clamped() {
        let config = ExtractionConfig::builder().dpi(10_000).build().unwrap();
        assert_eq!(config.dpi, 400);
        let config = ExtractionConfig::builder().dpi(10).build().unwrap();
        assert_eq!(config.dpi, 72);
    }

    #[test]
    fn batch_size_floor_is_one() {
        let config = ExtractionConfig::builder().max_batch_size(0).build().unwrap();
        assert_eq!(config.max_batch_size, 1);
    }

    #[test]
    fn empty_model_rejected() {
        let err = ExtractionConfig::builder().model("").build().unwrap_err();
        assert!(err.to_string().contains("model"));
    }

    #[test]
    fn empty_endpoint_rejected() {
        assert!(ExtractionConfig::builder().endpoint("").build().is_err());
    }
}
