//! Conversion entry points.
//!
//! Each pipeline comes in two forms: a `*_blocking` function that does the
//! work on the calling thread, and an async wrapper that moves it onto
//! Tokio's blocking pool. pdfium and the image codecs are CPU-bound and
//! synchronous; running them on an async worker would stall every other
//! request sharing that worker.
//!
//! Both pipelines follow the same shape:
//!
//! ```text
//! validate ─▶ workspace ─▶ persist ─▶ convert ─▶ bytes
//!                 └──────── released on every exit path ────────┘
//! ```

use crate::config::ConversionConfig;
use crate::error::ConvertError;
use crate::output::{ConversionArchive, MergedDocument, MERGED_PDF_NAME};
use crate::pipeline::archive::{self, ArchiveWriter};
use crate::pipeline::compose::{self, PdfComposer};
use crate::pipeline::engine;
use crate::pipeline::input::{self, StoredItem, UploadedItem};
use crate::pipeline::render::PageRasterizer;
use crate::sanitize::split_extension;
use crate::workspace::{with_workspace, Workspace};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Rasterise every page of every PDF in `items` into one ZIP archive.
///
/// # Errors
/// Validation errors for an empty batch, a non-`.pdf` name, or a file pdfium
/// cannot open; internal errors for anything else.
pub async fn pdf_to_png(
    items: Vec<UploadedItem>,
    config: &ConversionConfig,
) -> Result<ConversionArchive, ConvertError> {
    let config = config.clone();
    tokio::task::spawn_blocking(move || pdf_to_png_blocking(items, &config))
        .await
        .map_err(|e| ConvertError::Internal(format!("Conversion task panicked: {}", e)))?
}

/// Merge every image in `items` into one PDF, ordered by sanitized filename.
///
/// # Errors
/// Validation errors for an empty batch, an unsupported extension, or an
/// undecodable image; internal errors for anything else.
pub async fn png_to_pdf(
    items: Vec<UploadedItem>,
    config: &ConversionConfig,
) -> Result<MergedDocument, ConvertError> {
    let config = config.clone();
    tokio::task::spawn_blocking(move || png_to_pdf_blocking(items, &config))
        .await
        .map_err(|e| ConvertError::Internal(format!("Conversion task panicked: {}", e)))?
}

/// Blocking implementation of [`pdf_to_png`].
pub fn pdf_to_png_blocking(
    items: Vec<UploadedItem>,
    config: &ConversionConfig,
) -> Result<ConversionArchive, ConvertError> {
    input::validate_pdfs(&items)?;
    let start = Instant::now();
    let document_count = items.len();
    info!(documents = document_count, "Starting PDF → PNG conversion");

    let (filename, entries, bytes) =
        with_workspace(config.workspace_root.as_deref(), |workspace| {
            let stored = input::persist_all(workspace, items)?;
            let sanitized: Vec<String> = stored.iter().map(|s| s.sanitized_name.clone()).collect();
            let filename = archive::archive_filename(&sanitized);

            let (entries, bytes) = engine::with_pdfium(config, |pdfium| {
                let mut archive = ArchiveWriter::new();
                for doc in &stored {
                    let pages =
                        PageRasterizer::open(pdfium, &doc.path, &doc.original_name, config.render_scale)?;
                    rasterise_into(workspace, doc, pages, &mut archive)?;
                }
                archive.finish()
            })?;
            Ok((filename, entries, bytes))
        })?;

    info!(
        documents = document_count,
        pages = entries.len(),
        archive = %filename,
        bytes = bytes.len(),
        "PDF → PNG conversion complete in {}ms",
        start.elapsed().as_millis()
    );

    Ok(ConversionArchive {
        filename,
        entries,
        document_count,
        bytes,
    })
}

/// Render each page of one document, flush it to the workspace, copy it into
/// the archive, then drop both the pixels and the file before the next page.
fn rasterise_into(
    workspace: &Workspace,
    doc: &StoredItem,
    pages: PageRasterizer<'_>,
    archive: &mut ArchiveWriter,
) -> Result<(), ConvertError> {
    let (stem, _) = split_extension(&doc.stored_name);
    let total = pages.page_count();

    for page in pages {
        let page = page?;
        let entry = archive::page_entry_name(stem, page.page_number());
        let png_path = workspace.path().join(&entry);

        page.image
            .save_with_format(&png_path, image::ImageFormat::Png)
            .map_err(|e| ConvertError::RasterisationFailed {
                filename: page.source_document.clone(),
                page: page.page_number(),
                detail: format!("PNG encoding failed: {}", e),
            })?;
        drop(page);

        archive.add_file(&entry, &png_path)?;
        if let Err(e) = std::fs::remove_file(&png_path) {
            warn!(file = %png_path.display(), error = %e, "Failed to remove rendered page");
        }
    }

    debug!(document = %doc.original_name, pages = total, "Document archived");
    Ok(())
}

/// Blocking implementation of [`png_to_pdf`].
pub fn png_to_pdf_blocking(
    items: Vec<UploadedItem>,
    config: &ConversionConfig,
) -> Result<MergedDocument, ConvertError> {
    input::validate_images(&items)?;
    let start = Instant::now();
    info!(images = items.len(), "Starting PNG → PDF conversion");

    let (page_sources, bytes) = with_workspace(config.workspace_root.as_deref(), |workspace| {
        let mut stored = input::persist_all(workspace, items)?;
        // Stable: identical sanitized names keep upload order.
        stored.sort_by(|a, b| a.sanitized_name.cmp(&b.sanitized_name));

        engine::with_pdfium(config, |pdfium| {
            let mut composer = PdfComposer::new(pdfium, config.pdf_resolution)?;
            let mut page_sources = Vec::with_capacity(stored.len());
            for item in &stored {
                let image = compose::normalize(compose::open_image(&item.path, &item.original_name)?);
                composer.add_page(&image)?;
                page_sources.push(item.original_name.clone());
            }

            if composer.page_count() == 0 {
                return Err(ConvertError::NoValidImages);
            }
            Ok((page_sources, composer.finish()?))
        })
    })?;

    info!(
        pages = page_sources.len(),
        bytes = bytes.len(),
        "PNG → PDF conversion complete in {}ms",
        start.elapsed().as_millis()
    );

    Ok(MergedDocument {
        filename: MERGED_PDF_NAME.to_string(),
        page_sources,
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(root: &std::path::Path) -> ConversionConfig {
        ConversionConfig::builder()
            .workspace_root(root)
            .build()
            .unwrap()
    }

    #[test]
    fn empty_batches_fail_without_touching_disk() {
        let root = tempfile::tempdir().unwrap();
        let config = config_in(root.path());

        assert!(matches!(
            pdf_to_png_blocking(Vec::new(), &config),
            Err(ConvertError::NoFiles)
        ));
        assert!(matches!(
            png_to_pdf_blocking(Vec::new(), &config),
            Err(ConvertError::NoFiles)
        ));
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn wrong_extensions_are_named() {
        let root = tempfile::tempdir().unwrap();
        let config = config_in(root.path());

        let err = pdf_to_png_blocking(vec![UploadedItem::new("notes.txt", b"hi".to_vec())], &config)
            .unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("notes.txt"));

        let err = png_to_pdf_blocking(vec![UploadedItem::new("anim.gif", b"GIF".to_vec())], &config)
            .unwrap_err();
        assert!(matches!(err, ConvertError::UnsupportedType { ref filename } if filename == "anim.gif"));
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn async_wrappers_propagate_validation_errors() {
        let config = ConversionConfig::default();
        let err = pdf_to_png(Vec::new(), &config).await.unwrap_err();
        assert!(matches!(err, ConvertError::NoFiles));
        let err = png_to_pdf(vec![UploadedItem::new("x.bmp", Vec::new())], &config)
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }
}
