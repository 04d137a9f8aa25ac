//! HTTP surface tests, driven through `tower::ServiceExt::oneshot`.
//!
//! None of these reach pdfium: they cover routing, multipart handling and
//! the error → response mapping.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use edgequake_pdfpng::{router, AppState, ConversionConfig, ServerConfig};
use serde_json::Value;
use tower::ServiceExt;

const BOUNDARY: &str = "pdfpng-test-boundary";

fn app(max_upload_bytes: usize) -> Router {
    let state = AppState::new(ConversionConfig::default(), &ServerConfig::default());
    router(state, max_upload_bytes)
}

/// `(field, filename, bytes)` parts; `filename: None` makes a plain form field.
fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (field, filename, bytes) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match filename {
            Some(f) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{field}\"; filename=\"{f}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{field}\"\r\n\r\n").as_bytes(),
            ),
        }
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_healthy() {
    let response = app(1024)
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, serde_json::json!({"status": "healthy"}));
}

#[tokio::test]
async fn request_without_files_is_rejected() {
    let body = multipart_body(&[("note", None, b"hello")]);
    let response = app(1 << 20)
        .oneshot(upload("/convert-pdf-to-png", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["kind"], "validation");
    assert_eq!(json["detail"], "No files were uploaded");
}

#[tokio::test]
async fn non_pdf_upload_names_the_file() {
    let body = multipart_body(&[("files", Some("notes.txt"), b"plain text")]);
    let response = app(1 << 20)
        .oneshot(upload("/convert-pdf-to-png", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["kind"], "validation");
    assert!(json["detail"].as_str().unwrap().contains("notes.txt"), "{json}");
}

#[tokio::test]
async fn unsupported_image_type_is_rejected() {
    let body = multipart_body(&[
        ("files", Some("a.png"), b"\x89PNG"),
        ("files", Some("b.gif"), b"GIF89a"),
    ]);
    let response = app(1 << 20)
        .oneshot(upload("/convert-png-to-pdf", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert!(json["detail"].as_str().unwrap().contains("b.gif"), "{json}");
}

#[tokio::test]
async fn files_without_a_filename_are_ignored() {
    // A `files` part with no filename is a form value, not an upload.
    let body = multipart_body(&[("files", None, b"%PDF-1.4")]);
    let response = app(1 << 20)
        .oneshot(upload("/convert-pdf-to-png", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["detail"], "No files were uploaded");
}

#[tokio::test]
async fn non_multipart_request_is_a_client_error() {
    let request = Request::post("/convert-png-to-pdf")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let response = app(1 << 20).oneshot(request).await.unwrap();

    assert!(response.status().is_client_error(), "{}", response.status());
}

#[tokio::test]
async fn oversized_upload_is_payload_too_large() {
    let big = vec![b'x'; 64 * 1024];
    let body = multipart_body(&[("files", Some("big.pdf"), big.as_slice())]);
    let response = app(4 * 1024)
        .oneshot(upload("/convert-pdf-to-png", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let response = app(1024)
        .oneshot(Request::get("/convert").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
