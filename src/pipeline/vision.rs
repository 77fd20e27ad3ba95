//! Vision model client: trait boundary plus the Ollama-style HTTP client.
//!
//! The orchestrator only sees [`VisionModel`], so tests drive it with a
//! scripted fake and never touch the network. The real client speaks the
//! Ollama chat API: `POST {base}/api/chat` with `stream: false`, images as
//! base64 strings on the user message, and the answer in
//! `response.message.content`.
//!
//! One call may legitimately take minutes — a batch of six full-page PNGs
//! on a local model is slow. The per-call timeout comes from
//! [`ExtractionConfig::model_timeout_secs`]; a timeout or any transport
//! failure is fatal for the request, with no retry.

use crate::config::ExtractionConfig;
use crate::error::Pdf2InvoiceError;
use crate::pipeline::encode::PageImage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// The model boundary: one instruction pair plus a batch of images in,
/// free-form answer text out.
///
/// `batch` is the 1-based batch ordinal, used only for error attribution.
#[async_trait]
pub trait VisionModel: Send + Sync {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        images: &[PageImage],
        batch: usize,
    ) -> Result<String, Pdf2InvoiceError>;
}

/// HTTP client for a local Ollama-style inference endpoint.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    timeout_secs: u64,
}

impl OllamaClient {
    /// Build a client from the extraction config.
    pub fn new(config: &ExtractionConfig) -> Result<Self, Pdf2InvoiceError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.model_timeout_secs))
            .build()
            .map_err(|e| Pdf2InvoiceError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            timeout_secs: config.model_timeout_secs,
        })
    }

    /// Check whether the endpoint answers at all (`GET {base}/api/tags`).
    ///
    /// Used as a startup liveness probe; never blocks or fails startup.
    pub async fn probe(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match self.http.get(&url).timeout(Duration::from_secs(5)).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!(error = %e, %url, "model endpoint probe failed");
                false
            }
        }
    }
}

#[async_trait]
impl VisionModel for OllamaClient {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        images: &[PageImage],
        batch: usize,
    ) -> Result<String, Pdf2InvoiceError> {
        let request = ChatRequest {
            model: &self.model,
            stream: false,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                    images: None,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                    images: Some(images.iter().map(|p| p.data.as_str()).collect()),
                },
            ],
        };

        let url = format!("{}/api/chat", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Pdf2InvoiceError::ModelCallTimeout {
                        batch,
                        secs: self.timeout_secs,
                    }
                } else {
                    Pdf2InvoiceError::ModelCallFailed {
                        batch,
                        detail: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, batch, "model endpoint returned an error");
            return Err(Pdf2InvoiceError::ModelCallFailed {
                batch,
                detail: format!("HTTP {status}: {}", body.chars().take(200).collect::<String>()),
            });
        }

        let chat: ChatResponse =
            response
                .json()
                .await
                .map_err(|e| Pdf2InvoiceError::ModelCallFailed {
                    batch,
                    detail: format!("malformed chat response: {e}"),
                })?;

        Ok(chat.message.content)
    }
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    stream: bool,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    images: Option<Vec<&'a str>>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: String,
}
