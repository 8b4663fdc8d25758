use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;

use crate::error::CompressionError;
use crate::format::OutputFormat;
use crate::processor::ImageEncoder;

/// Baseline JPEG. Alpha is dropped; quality 0 is encoded as 1.
pub struct JpgEncoder;

impl ImageEncoder for JpgEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Jpeg
    }

    fn encode(&self, img: &DynamicImage, quality: u8) -> Result<Vec<u8>, CompressionError> {
        let rgb = img.to_rgb8();

        let mut output = Vec::new();
        let mut cursor = Cursor::new(&mut output);
        let mut encoder = JpegEncoder::new_with_quality(&mut cursor, quality.clamp(1, 100));

        encoder
            .encode(rgb.as_raw(), rgb.width(), rgb.height(), image::ExtendedColorType::Rgb8)
            .map_err(|e| CompressionError::Encode(format!("JPEG: {e}")))?;

        Ok(output)
    }
}
