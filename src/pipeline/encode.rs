//! Image encoding: `DynamicImage` ↔ compressed JPEG page bytes.
//!
//! Pages travel between the rasteriser and the OCR stage as encoded bytes,
//! which keeps a 40-page agreement at 300 DPI in the tens of megabytes
//! rather than the ~1 GB its raw RGBA bitmaps would take. Quality 90 keeps
//! glyph edges sharp enough for tesseract.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use tracing::debug;

/// Encode a rasterised page as JPEG.
///
/// The alpha channel is dropped first; JPEG has none and pdfium renders
/// opaque white page backgrounds anyway.
pub fn encode_page(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, image::ImageError> {
    let rgb = img.to_rgb8();
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
    rgb.write_with_encoder(encoder)?;

    debug!(
        "Encoded {}x{} page → {} bytes JPEG (q={})",
        rgb.width(),
        rgb.height(),
        buf.len(),
        quality
    );
    Ok(buf)
}

/// Decode JPEG page bytes back into a raster image for OCR.
pub fn decode_page(data: &[u8]) -> Result<DynamicImage, image::ImageError> {
    image::load_from_memory_with_format(data, ImageFormat::Jpeg)
}
