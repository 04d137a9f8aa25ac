//! Image decoding, colour normalisation and PDF composition.
//!
//! Uploaded images arrive as RGBA PNGs, greyscale scans, palette screenshots
//! or JPEGs. Every page of the merged PDF is embedded as plain 8-bit RGB so
//! the document has one colour model throughout; alpha is discarded, not
//! composited.

use crate::error::ConvertError;
use image::{DynamicImage, GenericImageView, ImageReader};
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::debug;

/// PDF user-space units per inch.
const POINTS_PER_INCH: f32 = 72.0;

/// Decode the image at `path`, sniffing the format from its content.
///
/// `filename` is the upload name reported on failure.
pub fn open_image(path: &Path, filename: &str) -> Result<DynamicImage, ConvertError> {
    let cannot_open = |detail: String| ConvertError::CannotOpen {
        filename: filename.to_string(),
        detail,
    };

    ImageReader::open(path)
        .map_err(|e| ConvertError::io(path, e))?
        .with_guessed_format()
        .map_err(|e| ConvertError::io(path, e))?
        .decode()
        .map_err(|e| cannot_open(e.to_string()))
}

/// Convert any colour type to 8-bit RGB.
pub fn normalize(image: DynamicImage) -> DynamicImage {
    match image {
        DynamicImage::ImageRgb8(_) => image,
        other => DynamicImage::ImageRgb8(other.into_rgb8()),
    }
}

/// Page size in points for an image of `pixels` at `resolution` pixels/inch.
pub fn page_size_points(pixels: u32, resolution: f32) -> f32 {
    pixels as f32 * POINTS_PER_INCH / resolution
}

/// Bytes per row of a 24-bit pdfium bitmap: 3 per pixel, padded to 4.
fn bgr_stride(width: u32) -> usize {
    (width as usize * 3).div_ceil(4) * 4
}

/// Pack an 8-bit RGB image into pdfium's BGR row layout.
fn bgr_buffer(image: &DynamicImage) -> Vec<u8> {
    let rgb = image.to_rgb8();
    let stride = bgr_stride(rgb.width());
    let mut buffer = vec![0u8; stride * rgb.height() as usize];
    for (row, out) in rgb.rows().zip(buffer.chunks_exact_mut(stride)) {
        for (pixel, bgr) in row.zip(out.chunks_exact_mut(3)) {
            let [r, g, b] = pixel.0;
            bgr.copy_from_slice(&[b, g, r]);
        }
    }
    buffer
}

fn pixels(n: u32) -> Result<Pixels, ConvertError> {
    Pixels::try_from(n)
        .map_err(|_| ConvertError::CompositionFailed(format!("image dimension {n} too large")))
}

/// Accumulates pages, one image per page, into a new PDF.
pub struct PdfComposer<'a> {
    document: PdfDocument<'a>,
    resolution: f32,
    pages: usize,
}

impl<'a> PdfComposer<'a> {
    pub fn new(pdfium: &'a Pdfium, resolution: f32) -> Result<Self, ConvertError> {
        let document = pdfium
            .create_new_pdf()
            .map_err(|e| ConvertError::CompositionFailed(format!("{:?}", e)))?;
        Ok(Self {
            document,
            resolution,
            pages: 0,
        })
    }

    /// Append `image` as a new page sized to fill it exactly.
    pub fn add_page(&mut self, image: &DynamicImage) -> Result<(), ConvertError> {
        let failed = |e: PdfiumError| ConvertError::CompositionFailed(format!("{:?}", e));

        let (width_px, height_px) = image.dimensions();
        let width = PdfPoints::new(page_size_points(width_px, self.resolution));
        let height = PdfPoints::new(page_size_points(height_px, self.resolution));

        let mut page = self
            .document
            .pages_mut()
            .create_page_at_end(PdfPagePaperSize::Custom(width, height))
            .map_err(failed)?;

        // `PdfPageImageObject::new` always embeds BGRA, which adds an SMask.
        // Start from a 1×1 placeholder and replace it with a 24-bit bitmap.
        let mut image_object =
            PdfPageImageObject::new(&self.document, &DynamicImage::new_rgb8(1, 1))
                .map_err(failed)?;
        let mut buffer = bgr_buffer(image);
        let (w, h) = (pixels(width_px)?, pixels(height_px)?);
        // SAFETY: `bgr_buffer` sizes the buffer to pdfium's own pitch for a
        // BGR bitmap of this width and height, and it outlives the bitmap.
        let bitmap = unsafe {
            PdfBitmap::from_bytes(
                w,
                h,
                PdfBitmapFormat::BGR,
                &mut buffer,
                self.document.bindings(),
            )
        }
        .map_err(failed)?;
        image_object.set_bitmap(&bitmap).map_err(failed)?;
        drop(bitmap);

        image_object
            .scale(width.value, height.value)
            .map_err(failed)?;

        page.objects_mut()
            .add_object(PdfPageObject::Image(image_object))
            .map_err(failed)?;

        self.pages += 1;
        debug!(
            page = self.pages,
            "Composed page {}x{} px → {:.1}x{:.1} pt",
            width_px,
            height_px,
            width.value,
            height.value
        );
        Ok(())
    }

    pub fn page_count(&self) -> usize {
        self.pages
    }

    /// Serialise the document.
    pub fn finish(self) -> Result<Vec<u8>, ConvertError> {
        self.document
            .save_to_bytes()
            .map_err(|e| ConvertError::CompositionFailed(format!("{:?}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgba, RgbaImage};

    #[test]
    fn normalize_strips_alpha_and_expands_grey() {
        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 0])));
        let out = normalize(rgba);
        assert!(matches!(out, DynamicImage::ImageRgb8(_)));
        assert_eq!(out.to_rgb8().get_pixel(0, 0).0, [10, 20, 30]);

        let grey = DynamicImage::ImageLuma8(GrayImage::from_pixel(3, 1, Luma([200])));
        let out = normalize(grey);
        assert!(matches!(out, DynamicImage::ImageRgb8(_)));
        assert_eq!(out.to_rgb8().get_pixel(2, 0).0, [200, 200, 200]);
    }

    #[test]
    fn bgr_rows_are_padded_to_four_bytes() {
        assert_eq!(bgr_stride(1), 4);
        assert_eq!(bgr_stride(4), 12);
        assert_eq!(bgr_stride(5), 16);

        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(5, 2, Rgba([1, 2, 3, 9])));
        let buffer = bgr_buffer(&img);
        assert_eq!(buffer.len(), 32);
        assert_eq!(&buffer[..3], &[3, 2, 1]);
        assert_eq!(&buffer[12..16], &[3, 2, 1, 0]);
        assert_eq!(&buffer[16..19], &[3, 2, 1]);
    }

    #[test]
    fn page_size_follows_resolution() {
        assert_eq!(page_size_points(100, 100.0), 72.0);
        assert_eq!(page_size_points(200, 100.0), 144.0);
        assert_eq!(page_size_points(300, 300.0), 72.0);
    }

    #[test]
    fn open_image_sniffs_content_not_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("actually-a-png.jpg");
        RgbaImage::from_pixel(4, 3, Rgba([1, 2, 3, 255]))
            .save_with_format(&path, image::ImageFormat::Png)
            .unwrap();
        let img = open_image(&path, "actually-a-png.jpg").unwrap();
        assert_eq!(img.dimensions(), (4, 3));
    }

    #[test]
    fn open_image_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"definitely not an image").unwrap();
        match open_image(&path, "broken.png") {
            Err(ConvertError::CannotOpen { filename, .. }) => assert_eq!(filename, "broken.png"),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
