//! # edgequake-pdfpng
//!
//! Convert PDF pages to PNG images and merge PNG/JPEG images into PDFs.
//!
//! ## Pipelines
//!
//! ```text
//! PDF → PNG
//!  ├─ 1. Validate  every name must end in .pdf
//!  ├─ 2. Persist   sanitised copies in a per-request workspace
//!  ├─ 3. Render    pages one at a time via pdfium (2× scale by default)
//!  └─ 4. Archive   {stem}_{page:03}.png entries in one Deflate ZIP
//!
//! PNG → PDF
//!  ├─ 1. Validate  .png / .jpg / .jpeg only
//!  ├─ 2. Persist   then sort by sanitised filename (this is the page order)
//!  ├─ 3. Decode    normalise every image to 8-bit RGB
//!  └─ 4. Compose   one image per page, sized at 100 px/inch by default
//! ```
//!
//! The workspace is removed on every exit path. Nothing outlives a call.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdfpng::{pdf_to_png, ConversionConfig, UploadedItem};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bytes = std::fs::read("report.pdf")?;
//!     let config = ConversionConfig::default();
//!     let archive = pdf_to_png(vec![UploadedItem::new("report.pdf", bytes)], &config).await?;
//!     std::fs::write(&archive.filename, &archive.bytes)?; // report_png_export.zip
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfpng` binary (clap + anyhow + tracing-subscriber) |
//!
//! ## pdfium
//!
//! Rendering and PDF writing use the pdfium shared library, looked up from
//! [`ConversionConfig::pdfium_library_path`], then `PDFIUM_LIB_PATH`, then the
//! working directory, then the system library path.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod sanitize;
pub mod server;
pub mod workspace;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder};
pub use convert::{pdf_to_png, pdf_to_png_blocking, png_to_pdf, png_to_pdf_blocking};
pub use error::{ConvertError, ErrorKind};
pub use output::{ConversionArchive, MergedDocument};
pub use pipeline::input::UploadedItem;
pub use pipeline::render::{PageRasterizer, RasterPage};
pub use sanitize::sanitize;
pub use server::{router, serve, AppState, ServerConfig};
pub use workspace::{with_workspace, Workspace};
