//! Conversion results.

use serde::Serialize;

/// Fixed download name of every merged PDF.
pub const MERGED_PDF_NAME: &str = "merged_from_pngs.pdf";

/// Result of the PDF → PNG pipeline: one ZIP holding every rendered page.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionArchive {
    /// Suggested download name, e.g. `report_png_export.zip`.
    pub filename: String,
    /// Entry names in archive order (input order, then page order).
    pub entries: Vec<String>,
    /// Number of input documents.
    pub document_count: usize,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

/// Result of the PNG → PDF pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct MergedDocument {
    /// Always [`MERGED_PDF_NAME`].
    pub filename: String,
    /// Upload names in page order, after sorting.
    pub page_sources: Vec<String>,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl MergedDocument {
    pub fn page_count(&self) -> usize {
        self.page_sources.len()
    }
}
