//! Configuration types for PDF ⇔ PNG conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The defaults reproduce the service's
//! historical constants (2× render scale, 100 DPI PDF metadata), so a default
//! config converts exactly as the HTTP endpoints always have.

use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default linear render scale over the PDF's 72-unit base (~150 DPI).
pub const DEFAULT_RENDER_SCALE: f32 = 2.0;

/// Default resolution written into merged PDFs, in pixels per inch.
pub const DEFAULT_PDF_RESOLUTION: f32 = 100.0;

const RENDER_SCALE_RANGE: (f32, f32) = (0.25, 8.0);
const PDF_RESOLUTION_RANGE: (f32, f32) = (10.0, 1200.0);

/// Configuration for both conversion pipelines.
///
/// # Example
/// ```rust
/// use edgequake_pdfpng::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .render_scale(3.0)
///     .pdf_resolution(150.0)
///     .build()
///     .unwrap();
/// assert_eq!(config.render_scale, 3.0);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Linear scale applied to each PDF page when rasterising. Default: 2.0.
    ///
    /// PDF user space is 72 units per inch, so 2.0 yields 144 DPI output.
    pub render_scale: f32,

    /// Pixels-per-inch used to size merged PDF pages. Default: 100.
    ///
    /// Only affects the physical page size (`pixels × 72 / resolution`
    /// points); image pixels are embedded unchanged.
    pub pdf_resolution: f32,

    /// Directory under which per-request workspaces are created.
    /// `None` uses the system temp directory.
    pub workspace_root: Option<PathBuf>,

    /// Explicit pdfium shared library (file or containing directory).
    /// `None` falls back to `PDFIUM_LIB_PATH`, `./`, then the system library.
    pub pdfium_library_path: Option<PathBuf>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            render_scale: DEFAULT_RENDER_SCALE,
            pdf_resolution: DEFAULT_PDF_RESOLUTION,
            workspace_root: None,
            pdfium_library_path: None,
        }
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn render_scale(mut self, scale: f32) -> Self {
        self.config.render_scale = scale.clamp(RENDER_SCALE_RANGE.0, RENDER_SCALE_RANGE.1);
        self
    }

    pub fn pdf_resolution(mut self, dpi: f32) -> Self {
        self.config.pdf_resolution = dpi.clamp(PDF_RESOLUTION_RANGE.0, PDF_RESOLUTION_RANGE.1);
        self
    }

    pub fn workspace_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.workspace_root = Some(dir.into());
        self
    }

    pub fn pdfium_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library_path = Some(path.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, ConvertError> {
        let c = &self.config;
        // clamp() passes NaN through
        if !c.render_scale.is_finite() {
            return Err(ConvertError::InvalidConfig(format!(
                "render scale must be {}–{}, got {}",
                RENDER_SCALE_RANGE.0, RENDER_SCALE_RANGE.1, c.render_scale
            )));
        }
        if !c.pdf_resolution.is_finite() {
            return Err(ConvertError::InvalidConfig(format!(
                "PDF resolution must be {}–{}, got {}",
                PDF_RESOLUTION_RANGE.0, PDF_RESOLUTION_RANGE.1, c.pdf_resolution
            )));
        }
        if let Some(root) = &c.workspace_root {
            if !root.is_dir() {
                return Err(ConvertError::InvalidConfig(format!(
                    "workspace root '{}' is not a directory",
                    root.display()
                )));
            }
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_constants() {
        let c = ConversionConfig::default();
        assert_eq!(c.render_scale, 2.0);
        assert_eq!(c.pdf_resolution, 100.0);
        assert!(c.workspace_root.is_none());
    }

    #[test]
    fn builder_clamps_out_of_range_values() {
        let c = ConversionConfig::builder()
            .render_scale(100.0)
            .pdf_resolution(1.0)
            .build()
            .unwrap();
        assert_eq!(c.render_scale, 8.0);
        assert_eq!(c.pdf_resolution, 10.0);
    }

    #[test]
    fn builder_rejects_nan() {
        let err = ConversionConfig::builder()
            .render_scale(f32::NAN)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConvertError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_missing_workspace_root() {
        let err = ConversionConfig::builder()
            .workspace_root("/definitely/not/a/real/dir")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }
}
