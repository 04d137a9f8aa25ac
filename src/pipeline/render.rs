//! PDF rasterisation: turn pages into images one at a time.
//!
//! ## Why an iterator?
//!
//! A 300-page scan rendered at 2× holds roughly 1.5 GB of pixels if every
//! page is materialised up front. [`PageRasterizer`] renders a page only when
//! `next()` is called and hands ownership of the pixels to the caller, so the
//! caller decides when they are released. The PDF → PNG pipeline writes each
//! page out and drops it before asking for the next one, keeping peak memory
//! at one page regardless of document length.
//!
//! The iterator is finite and not restartable: once it has yielded every page
//! it returns `None` forever.

use crate::error::ConvertError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// One rendered page.
pub struct RasterPage {
    /// Name of the document the page came from, as uploaded.
    pub source_document: String,
    /// 0-based page index within the document.
    pub page_index: usize,
    pub image: DynamicImage,
}

impl RasterPage {
    /// 1-based page number, as used in archive entry names.
    pub fn page_number(&self) -> usize {
        self.page_index + 1
    }
}

/// Lazily renders every page of one open PDF, in document order.
pub struct PageRasterizer<'a> {
    document: PdfDocument<'a>,
    source: String,
    render_config: PdfRenderConfig,
    next: PdfPageIndex,
    total: PdfPageIndex,
}

impl<'a> PageRasterizer<'a> {
    /// Open the PDF at `path`.
    ///
    /// `source` is the name reported in errors and on each [`RasterPage`].
    /// Any pdfium load failure (corrupt file, not a PDF, encrypted) is a
    /// [`ConvertError::CannotOpen`].
    pub fn open(
        pdfium: &'a Pdfium,
        path: &Path,
        source: &str,
        scale: f32,
    ) -> Result<Self, ConvertError> {
        let document =
            pdfium
                .load_pdf_from_file(path, None)
                .map_err(|e| ConvertError::CannotOpen {
                    filename: source.to_string(),
                    detail: describe_load_error(&e),
                })?;

        let total = document.pages().len();
        info!(document = %source, pages = total, "PDF loaded");

        Ok(Self {
            document,
            source: source.to_string(),
            render_config: PdfRenderConfig::new().scale_page_by_factor(scale),
            next: 0,
            total,
        })
    }

    pub fn page_count(&self) -> usize {
        self.total as usize
    }

    fn render(&self, index: PdfPageIndex) -> Result<RasterPage, ConvertError> {
        let failed = |e: PdfiumError| ConvertError::RasterisationFailed {
            filename: self.source.clone(),
            page: index as usize + 1,
            detail: format!("{:?}", e),
        };

        let page = self.document.pages().get(index).map_err(failed)?;
        let bitmap = page.render_with_config(&self.render_config).map_err(failed)?;
        let image = bitmap.as_image();
        debug!(
            document = %self.source,
            page = index as usize + 1,
            "Rendered page → {}x{} px",
            image.width(),
            image.height()
        );

        Ok(RasterPage {
            source_document: self.source.clone(),
            page_index: index as usize,
            image,
        })
    }
}

impl Iterator for PageRasterizer<'_> {
    type Item = Result<RasterPage, ConvertError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.total {
            return None;
        }
        let index = self.next;
        self.next += 1;
        Some(self.render(index))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.total - self.next) as usize;
        (left, Some(left))
    }
}

impl ExactSizeIterator for PageRasterizer<'_> {}

fn describe_load_error(e: &PdfiumError) -> String {
    let raw = format!("{:?}", e);
    if raw.contains("Password") || raw.contains("password") {
        "document is password protected".to_string()
    } else if raw.contains("Format") {
        "file is not a valid PDF document".to_string()
    } else {
        raw
    }
}
