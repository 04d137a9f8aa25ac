//! ZIP assembly for rendered pages.
//!
//! Entries are added in the order the pipeline produces them (input order,
//! then page order) and Deflate-compressed. The `zip` writer sets the
//! language-encoding flag (general purpose bit 11) on every entry whose name
//! is not plain ASCII, so Japanese or accented stems open correctly in
//! Windows Explorer, macOS Archive Utility and `unzip` alike.

use crate::error::ConvertError;
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, Cursor};
use std::path::Path;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Archive name used when more than one document was converted.
pub const MULTI_DOCUMENT_ARCHIVE_NAME: &str = "pdf_to_png_export.zip";

/// Entry name for a rendered page: `{stem}_{page:03}.png`, page 1-based.
pub fn page_entry_name(stem: &str, page_number: usize) -> String {
    format!("{stem}_{page_number:03}.png")
}

/// Download name for the archive.
///
/// One document → `{stem}_png_export.zip`, with `stem` taken from its
/// sanitized name; anything else → [`MULTI_DOCUMENT_ARCHIVE_NAME`].
pub fn archive_filename(sanitized_names: &[String]) -> String {
    match sanitized_names {
        [only] => {
            let (stem, _) = crate::sanitize::split_extension(only);
            format!("{stem}_png_export.zip")
        }
        _ => MULTI_DOCUMENT_ARCHIVE_NAME.to_string(),
    }
}

/// Builds an in-memory ZIP one entry at a time.
pub struct ArchiveWriter {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
    entries: Vec<String>,
    seen: HashSet<String>,
}

impl ArchiveWriter {
    pub fn new() -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            options: SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
            entries: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Stream the file at `path` into a new entry called `entry_name`.
    pub fn add_file(&mut self, entry_name: &str, path: &Path) -> Result<(), ConvertError> {
        if !self.seen.insert(entry_name.to_string()) {
            return Err(ConvertError::Internal(format!(
                "duplicate archive entry '{entry_name}'"
            )));
        }

        let mut file = File::open(path).map_err(|e| ConvertError::io(path, e))?;
        self.zip.start_file(entry_name, self.options)?;
        let written = io::copy(&mut file, &mut self.zip).map_err(|e| ConvertError::io(path, e))?;
        debug!(entry = %entry_name, bytes = written, "Archived entry");

        self.entries.push(entry_name.to_string());
        Ok(())
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Write the central directory and return `(entry names, zip bytes)`.
    pub fn finish(self) -> Result<(Vec<String>, Vec<u8>), ConvertError> {
        let cursor = self.zip.finish()?;
        Ok((self.entries, cursor.into_inner()))
    }
}

impl Default for ArchiveWriter {
    fn default() -> Self {
        Self::new()
    }
}
