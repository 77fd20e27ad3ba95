//! Router-level tests: drive the axum app in-process with `oneshot` and a
//! scripted fake model. No network, no real model, no pdfium needed for the
//! upload-rejection paths.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use pdf2invoice::{
    app, AppState, ExtractionConfig, PageImage, Pdf2InvoiceError, VisionModel,
};
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "pdf2invoice-test-boundary";

/// A model that answers every call with the same canned JSON.
struct CannedModel(&'static str);

#[async_trait]
impl VisionModel for CannedModel {
    async fn complete(
        &self,
        _system: &str,
        _user: &str,
        _images: &[PageImage],
        _batch: usize,
    ) -> Result<String, Pdf2InvoiceError> {
        Ok(self.0.to_string())
    }
}

fn test_app() -> axum::Router {
    let state = AppState {
        config: Arc::new(ExtractionConfig::default()),
        model: Arc::new(CannedModel(r#"{"vendor": "Acme"}"#)),
    };
    app(state)
}

/// Build a multipart body with a single field.
fn multipart_body(
    field_name: &str,
    filename: &str,
    content_type: &str,
    content: &[u8],
) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{field_name}\"; filename=\"{filename}\"\r\n\
             Content-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn extract_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/extract")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_answers_plain_text() {
    let response = test_app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"ok");
}

#[tokio::test]
async fn missing_file_field_is_client_error() {
    let body = multipart_body("document", "a.pdf", "application/pdf", b"%PDF-1.4");
    let response = test_app().oneshot(extract_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("no file uploaded"));
    // Upload-time rejections carry no "ok" field
    assert!(json.get("ok").is_none());
}

#[tokio::test]
async fn undeclared_type_is_rejected() {
    let body = multipart_body("file", "notes.txt", "text/plain", b"%PDF-1.4");
    let response = test_app().oneshot(extract_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("unsupported file type"));
}

#[tokio::test]
async fn mislabeled_body_is_rejected_by_magic_bytes() {
    let body = multipart_body("file", "fake.pdf", "application/pdf", b"PK\x03\x04not a pdf");
    let response = test_app().oneshot(extract_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("%PDF"));
}

#[tokio::test]
async fn unreadable_pdf_is_server_error_with_ok_false() {
    // Passes upload validation, then fails inside the pipeline (corrupt
    // document or no pdfium available — both are extraction failures).
    let body = multipart_body("file", "broken.pdf", "application/pdf", b"%PDF-1.4 garbage");
    let response = test_app().oneshot(extract_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    assert_eq!(json["ok"], false);
    assert!(json["error"].as_str().is_some());
}

#[tokio::test]
async fn non_multipart_post_is_client_error() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/extract")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}
