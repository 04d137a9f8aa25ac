//! Pipeline stages for PDF ⇔ PNG conversion.
//!
//! Each submodule implements one step. [`crate::convert`] wires them into the
//! two pipelines.
//!
//! ## Data Flow
//!
//! ```text
//! PDF → PNG:  input ──▶ engine ──▶ render ──▶ archive
//!             (persist)  (pdfium)   (pages)    (zip)
//!
//! PNG → PDF:  input ──▶ compose (decode, normalise) ──▶ engine (pdf)
//! ```
//!
//! 1. [`input`]   — extension checks, sanitised names, uploads written to the
//!    request workspace
//! 2. [`engine`]  — bind pdfium once and share the handle
//! 3. [`render`]  — lazy page iterator; one page's pixels alive at a time
//! 4. [`archive`] — Deflate ZIP with UTF-8 entry names
//! 5. [`compose`] — RGB normalisation and one-image-per-page PDF assembly

pub mod archive;
pub mod compose;
pub mod engine;
pub mod input;
pub mod render;
