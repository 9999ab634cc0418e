//! Output encoding for extracted selections
//!
//! Converts an [`ExtractedSelection`] into compressed bytes in PNG, JPEG, or
//! WebP. JPEG has no alpha channel, so masked selections are composited onto
//! white before encoding; PNG maps the quality parameter onto compression
//! levels; WebP is lossless in the `image` crate, so quality is ignored.

use std::io::Cursor;
use std::str::FromStr;

use image::ImageEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::codecs::webp::WebPEncoder;
use serde::{Deserialize, Serialize};

use crate::error::{SelectError, SelectResult};
use crate::model::ExtractedSelection;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Png,
    Jpeg,
    Webp,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Webp => "webp",
        }
    }

    /// MIME type for clipboard/consumer handoff
    pub fn mime(&self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Webp => "image/webp",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "webp" => Ok(OutputFormat::Webp),
            other => Err(format!("unknown format '{other}', expected png, jpeg, or webp")),
        }
    }
}

/// Maps a 0-100 quality value onto a PNG compression level
fn compression_from_quality(quality: u8) -> CompressionType {
    match quality {
        0..=33 => CompressionType::Fast,
        34..=66 => CompressionType::Default,
        _ => CompressionType::Best,
    }
}

/// Encodes a selection in the given format.
///
/// `quality` applies to JPEG directly, maps to compression level for PNG,
/// and is ignored for (lossless) WebP.
pub fn encode_selection(
    selection: &ExtractedSelection,
    format: OutputFormat,
    quality: u8,
) -> SelectResult<Vec<u8>> {
    match format {
        OutputFormat::Png => encode_png(selection, compression_from_quality(quality)),
        OutputFormat::Jpeg => encode_jpeg(selection, quality),
        OutputFormat::Webp => encode_webp(selection),
    }
}

fn encode_png(
    selection: &ExtractedSelection,
    compression: CompressionType,
) -> SelectResult<Vec<u8>> {
    let mut output = Vec::new();
    let encoder = PngEncoder::new_with_quality(
        Cursor::new(&mut output),
        compression,
        FilterType::Adaptive,
    );
    encoder
        .write_image(
            selection.image.as_raw(),
            selection.width(),
            selection.height(),
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| SelectError::EncodingFailed {
            format: "png".to_string(),
            reason: e.to_string(),
        })?;
    Ok(output)
}

fn encode_jpeg(selection: &ExtractedSelection, quality: u8) -> SelectResult<Vec<u8>> {
    let quality = quality.clamp(1, 100);

    // JPEG carries no alpha: composite masked-out pixels onto white so the
    // shape stays readable instead of turning black.
    let rgb = image::RgbImage::from_fn(selection.width(), selection.height(), |x, y| {
        let p = selection.image.get_pixel(x, y);
        let alpha = p[3] as u16;
        let blend = |c: u8| ((c as u16 * alpha + 255 * (255 - alpha)) / 255) as u8;
        image::Rgb([blend(p[0]), blend(p[1]), blend(p[2])])
    });

    let mut output = Vec::new();
    let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut output), quality);
    encoder
        .write_image(
            rgb.as_raw(),
            selection.width(),
            selection.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| SelectError::EncodingFailed {
            format: "jpeg".to_string(),
            reason: e.to_string(),
        })?;
    Ok(output)
}

fn encode_webp(selection: &ExtractedSelection) -> SelectResult<Vec<u8>> {
    let mut output = Vec::new();
    let encoder = WebPEncoder::new_lossless(Cursor::new(&mut output));
    encoder
        .write_image(
            selection.image.as_raw(),
            selection.width(),
            selection.height(),
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| SelectError::EncodingFailed {
            format: "webp".to_string(),
            reason: e.to_string(),
        })?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selection(width: u32, height: u32) -> ExtractedSelection {
        let image = image::RgbaImage::from_fn(width, height, |x, _y| {
            // Left half opaque red, right half fully transparent
            if x < width / 2 {
                image::Rgba([255, 0, 0, 255])
            } else {
                image::Rgba([0, 255, 0, 0])
            }
        });
        ExtractedSelection {
            image,
            monitor_id: 0,
        }
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("png".parse::<OutputFormat>().unwrap(), OutputFormat::Png);
        assert_eq!("JPG".parse::<OutputFormat>().unwrap(), OutputFormat::Jpeg);
        assert_eq!("jpeg".parse::<OutputFormat>().unwrap(), OutputFormat::Jpeg);
        assert_eq!("webp".parse::<OutputFormat>().unwrap(), OutputFormat::Webp);
        assert!("bmp".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_mime_and_extension() {
        assert_eq!(OutputFormat::Png.mime(), "image/png");
        assert_eq!(OutputFormat::Jpeg.extension(), "jpg");
        assert_eq!(OutputFormat::Webp.mime(), "image/webp");
    }

    #[test]
    fn test_png_signature() {
        let bytes = encode_selection(&selection(32, 32), OutputFormat::Png, 80).unwrap();
        assert_eq!(&bytes[0..8], &[137, 80, 78, 71, 13, 10, 26, 10]);
    }

    #[test]
    fn test_png_preserves_alpha() {
        let bytes = encode_selection(&selection(32, 32), OutputFormat::Png, 80).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(0, 0)[3], 255);
        assert_eq!(decoded.get_pixel(31, 0)[3], 0);
    }

    #[test]
    fn test_jpeg_signature_and_white_composite() {
        let bytes = encode_selection(&selection(32, 32), OutputFormat::Jpeg, 90).unwrap();
        assert_eq!(&bytes[0..2], &[0xff, 0xd8]);

        // Transparent pixels come back (close to) white, not black
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
        let p = decoded.get_pixel(31, 0);
        assert!(p[0] > 200 && p[1] > 200 && p[2] > 200, "expected near-white, got {p:?}");
    }

    #[test]
    fn test_webp_signature() {
        let bytes = encode_selection(&selection(32, 32), OutputFormat::Webp, 80).unwrap();
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WEBP");
    }

    #[test]
    fn test_quality_to_compression_mapping() {
        assert!(matches!(compression_from_quality(10), CompressionType::Fast));
        assert!(matches!(compression_from_quality(50), CompressionType::Default));
        assert!(matches!(compression_from_quality(90), CompressionType::Best));
    }
}
