//! pdfium binding.
//!
//! pdfium keeps process-global state: `FPDF_InitLibrary` on bind and
//! `FPDF_DestroyLibrary` when the [`Pdfium`] handle drops. The handle is
//! therefore bound once, on first use, and shared for the life of the
//! process. A failed bind leaves it unset and is retried by the next call.
//!
//! Conversions do not hold any lock of their own while they run. With the
//! `thread_safe` feature pdfium-render serialises each FFI call, so decoding,
//! PNG encoding, compression and disk I/O of concurrent requests overlap;
//! only the pdfium calls themselves take turns.

use crate::config::ConversionConfig;
use crate::error::ConvertError;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use tracing::{debug, info};

/// Environment variable naming a pdfium library file or directory.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

static PDFIUM: OnceLock<Pdfium> = OnceLock::new();

/// Held only while binding, so two first calls do not both load the library.
static BIND_LOCK: Mutex<()> = Mutex::new(());

/// The process-wide pdfium handle, bound on first use.
///
/// The library path in `config` only matters for the call that performs the
/// bind; later calls reuse whatever library was loaded.
pub fn pdfium(config: &ConversionConfig) -> Result<&'static Pdfium, ConvertError> {
    if let Some(pdfium) = PDFIUM.get() {
        return Ok(pdfium);
    }

    let _guard = BIND_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(pdfium) = PDFIUM.get() {
        return Ok(pdfium);
    }
    let bound = bind_pdfium(config.pdfium_library_path.as_deref())?;
    Ok(PDFIUM.get_or_init(move || bound))
}

/// Run `f` with the shared pdfium handle, binding it first if needed.
///
/// Several calls may run `f` at the same time.
pub fn with_pdfium<T, F>(config: &ConversionConfig, f: F) -> Result<T, ConvertError>
where
    F: FnOnce(&Pdfium) -> Result<T, ConvertError>,
{
    f(pdfium(config)?)
}

/// Whether pdfium can be used, binding it if it is not bound yet.
pub fn is_available(config: &ConversionConfig) -> Result<(), ConvertError> {
    pdfium(config).map(|_| ())
}

/// Bind to the first pdfium library found.
///
/// Lookup order: explicit path → `PDFIUM_LIB_PATH` → `./` → system library.
/// A path may name the library file itself or the directory holding it.
fn bind_pdfium(explicit: Option<&Path>) -> Result<Pdfium, ConvertError> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Some(p) = explicit {
        candidates.push(library_file(p));
    }
    if let Some(p) = std::env::var_os(PDFIUM_LIB_PATH_ENV).filter(|v| !v.is_empty()) {
        candidates.push(library_file(Path::new(&p)));
    }
    candidates.push(Pdfium::pdfium_platform_library_name_at_path("./"));

    let mut last_error = String::from("no candidate library paths");
    for candidate in &candidates {
        match Pdfium::bind_to_library(candidate) {
            Ok(bindings) => {
                info!(library = %candidate.display(), "Bound pdfium");
                return Ok(Pdfium::new(bindings));
            }
            Err(e) => {
                debug!(library = %candidate.display(), error = ?e, "pdfium candidate rejected");
                last_error = format!("{}: {:?}", candidate.display(), e);
            }
        }
    }

    match Pdfium::bind_to_system_library() {
        Ok(bindings) => {
            info!("Bound system pdfium");
            Ok(Pdfium::new(bindings))
        }
        Err(e) => Err(ConvertError::PdfiumBindingFailed(format!(
            "{last_error}; system library: {e:?}"
        ))),
    }
}

fn library_file(path: &Path) -> PathBuf {
    if path.is_dir() {
        Pdfium::pdfium_platform_library_name_at_path(path)
    } else {
        path.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_resolves_to_platform_library_name() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = library_file(dir.path());
        assert_eq!(resolved.parent(), Some(dir.path()));
        assert!(resolved
            .file_name()
            .unwrap()
            .to_string_lossy()
            .contains("pdfium"));
    }

    #[test]
    fn file_path_is_kept() {
        let p = Path::new("/opt/pdfium/lib/libpdfium.so");
        assert_eq!(library_file(p), p);
    }
}
