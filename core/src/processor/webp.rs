use image::DynamicImage;

use crate::error::CompressionError;
use crate::format::OutputFormat;
use crate::processor::ImageEncoder;

/// Largest width or height libwebp accepts
pub const WEBP_MAX_DIMENSION: u32 = 16383;

/// Compression effort for lossless output (libwebp reads quality as effort)
const LOSSLESS_EFFORT: f32 = 75.0;

/// WebP via libwebp. Quality 100 switches to lossless.
pub struct WebpEncoder;

impl ImageEncoder for WebpEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Webp
    }

    fn encode(&self, img: &DynamicImage, quality: u8) -> Result<Vec<u8>, CompressionError> {
        let (width, height) = (img.width(), img.height());
        if width > WEBP_MAX_DIMENSION || height > WEBP_MAX_DIMENSION {
            return Err(CompressionError::Encode(format!(
                "WebP: {}x{} exceeds the {} px limit per side",
                width, height, WEBP_MAX_DIMENSION
            )));
        }

        let rgba = img.to_rgba8();
        let encoder = webp::Encoder::from_rgba(rgba.as_raw(), width, height);
        let encoded = if quality >= 100 {
            encoder.encode_simple(true, LOSSLESS_EFFORT)
        } else {
            encoder.encode_simple(false, quality as f32)
        }
        .map_err(|e| CompressionError::Encode(format!("WebP: {:?}", e)))?;

        if encoded.is_empty() {
            return Err(CompressionError::Encode("WebP: encoder produced no data".into()));
        }
        Ok(encoded.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_encodes_riff_container() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(24, 12, Rgb([0, 128, 255])));
        let bytes = WebpEncoder.encode(&img, 75).unwrap();
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WEBP");

        let decoded = webp::Decoder::new(&bytes).decode().unwrap();
        assert_eq!((decoded.width(), decoded.height()), (24, 12));
    }

    #[test]
    fn test_oversized_side_is_encode_error() {
        let img = DynamicImage::new_rgb8(WEBP_MAX_DIMENSION + 1, 2);
        for quality in [80, 100] {
            let err = WebpEncoder.encode(&img, quality).unwrap_err();
            assert!(matches!(err, CompressionError::Encode(_)));
        }
    }

    #[test]
    fn test_lossless_at_full_quality() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([1, 2, 3])));
        let bytes = WebpEncoder.encode(&img, 100).unwrap();
        let decoded = webp::Decoder::new(&bytes).decode().unwrap().to_image();
        assert_eq!(decoded.to_rgb8().get_pixel(0, 0), &Rgb([1, 2, 3]));
    }
}
