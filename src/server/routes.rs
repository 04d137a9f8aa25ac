//! Route handlers and the error → response mapping.

use super::AppState;
use crate::convert::{pdf_to_png, png_to_pdf};
use crate::error::{ConvertError, ErrorKind};
use crate::pipeline::input::UploadedItem;
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{debug, error, warn};

/// Multipart field carrying the uploaded files.
pub const UPLOAD_FIELD: &str = "files";

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
    kind: ErrorKind,
}

/// Anything a conversion handler can fail with.
#[derive(Debug)]
pub enum ApiError {
    /// The multipart body itself could not be read.
    Upload(MultipartError),
    Convert(ConvertError),
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        ApiError::Upload(e)
    }
}

impl From<ConvertError> for ApiError {
    fn from(e: ConvertError) -> Self {
        ApiError::Convert(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, detail) = match &self {
            ApiError::Upload(e) => {
                warn!(error = %e, "Unreadable upload");
                (e.status(), ErrorKind::Validation, e.body_text())
            }
            ApiError::Convert(e) => match e.kind() {
                ErrorKind::Validation => {
                    warn!(error = %e, "Rejected conversion request");
                    (StatusCode::BAD_REQUEST, ErrorKind::Validation, e.public_message())
                }
                ErrorKind::Internal => {
                    error!(error = %e, "Conversion failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ErrorKind::Internal,
                        e.public_message(),
                    )
                }
            },
        };

        (status, Json(ErrorResponse { detail, kind })).into_response()
    }
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "healthy" })
}

/// POST /convert-pdf-to-png
pub async fn convert_pdf_to_png(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let items = collect_uploads(multipart).await?;
    let archive = state.bounded(pdf_to_png(items, &state.config)).await?;
    Ok(attachment(archive.bytes, "application/zip", &archive.filename))
}

/// POST /convert-png-to-pdf
pub async fn convert_png_to_pdf(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let items = collect_uploads(multipart).await?;
    let document = state.bounded(png_to_pdf(items, &state.config)).await?;
    Ok(attachment(document.bytes, "application/pdf", &document.filename))
}

/// Read every `files` part that carries a filename; other parts are ignored.
async fn collect_uploads(mut multipart: Multipart) -> Result<Vec<UploadedItem>, ApiError> {
    let mut items = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        let filename = field.file_name().map(str::to_string);

        match (name.as_deref(), filename) {
            (Some(UPLOAD_FIELD), Some(filename)) => {
                let bytes = field.bytes().await?;
                debug!(file = %filename, bytes = bytes.len(), "Received upload");
                items.push(UploadedItem::new(filename, bytes.to_vec()));
            }
            (name, _) => debug!(field = ?name, "Ignoring multipart field"),
        }
    }
    Ok(items)
}

fn attachment(bytes: Vec<u8>, content_type: &'static str, filename: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, content_disposition(filename)),
        ],
        bytes,
    )
        .into_response()
}

/// `attachment; filename=…`, with an RFC 5987 `filename*` for non-ASCII names.
pub fn content_disposition(filename: &str) -> String {
    let is_token = |c: char| c.is_ascii_graphic() && !matches!(c, '"' | ';' | ',' | '\\');
    if !filename.is_empty() && filename.chars().all(is_token) {
        return format!("attachment; filename={filename}");
    }

    let fallback: String = filename
        .chars()
        .map(|c| if c == ' ' || is_token(c) { c } else { '_' })
        .collect();
    format!(
        "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
        urlencoding::encode(filename)
    )
}
