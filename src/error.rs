//! Error types for the edgequake-pdfpng library.
//!
//! Every failure is a [`ConvertError`], and every variant belongs to one of
//! two [`ErrorKind`]s:
//!
//! * **Validation** — the caller sent something we cannot convert (no files,
//!   wrong extension, a document or image the decoder rejects). Surfaced as a
//!   client error carrying the offending filename and cause.
//!
//! * **Internal** — anything else (I/O failure, pdfium not available, archive
//!   writer failure). Surfaced as a server error with a summarized message;
//!   the full error is logged, not returned.
//!
//! There is no partial success: a pipeline either produces one complete
//! archive or document, or returns exactly one of these errors.

use std::path::PathBuf;
use thiserror::Error;

/// Whether an error was caused by the caller or by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Validation,
    Internal,
}

/// All errors returned by the conversion pipelines.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Validation errors ─────────────────────────────────────────────────
    /// The request carried no files at all.
    #[error("No files were uploaded")]
    NoFiles,

    /// A file submitted for rasterisation does not have a `.pdf` extension.
    #[error("'{filename}' is not a PDF file")]
    NotAPdf { filename: String },

    /// A file submitted for merging is not a PNG or JPEG.
    #[error("'{filename}' is not a supported image file (PNG/JPG)")]
    UnsupportedType { filename: String },

    /// The document parser or image decoder rejected the file.
    #[error("Could not open '{filename}': {detail}")]
    CannotOpen { filename: String, detail: String },

    /// No image survived decoding, so there is nothing to merge.
    #[error("No valid images to merge")]
    NoValidImages,

    // ── Internal errors ───────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or place the library next to the binary."
    )]
    PdfiumBindingFailed(String),

    /// pdfium returned an error for a specific page.
    #[error("Rasterisation failed for '{filename}' page {page}: {detail}")]
    RasterisationFailed {
        filename: String,
        page: usize,
        detail: String,
    },

    /// pdfium failed while building the merged document.
    #[error("PDF composition failed: {0}")]
    CompositionFailed(String),

    /// Workspace or output file I/O failed.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The ZIP writer failed.
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// The conversion exceeded the configured time budget.
    #[error("Conversion timed out after {secs}s")]
    Timeout { secs: u64 },

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConvertError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConvertError::Io {
            path: path.into(),
            source,
        }
    }

    /// Classify this error as caller-caused or service-caused.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConvertError::NoFiles
            | ConvertError::NotAPdf { .. }
            | ConvertError::UnsupportedType { .. }
            | ConvertError::CannotOpen { .. }
            | ConvertError::NoValidImages => ErrorKind::Validation,
            _ => ErrorKind::Internal,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }

    /// Message safe to hand back to a remote caller.
    ///
    /// Validation errors are returned verbatim. Internal errors are reduced to
    /// a category so paths and library internals stay in the logs.
    pub fn public_message(&self) -> String {
        let summary = match self {
            ConvertError::InvalidConfig(_) => "invalid server configuration",
            ConvertError::PdfiumBindingFailed(_) => "PDF engine unavailable",
            ConvertError::RasterisationFailed { .. } => "page rendering failed",
            ConvertError::CompositionFailed(_) => "PDF composition failed",
            ConvertError::Io { .. } => "file system error",
            ConvertError::Archive(_) => "archive creation failed",
            ConvertError::Timeout { .. } => "conversion timed out",
            ConvertError::Internal(_) => "unexpected failure",
            _ => return self.to_string(),
        };
        format!("Conversion error: {summary}")
    }
}
