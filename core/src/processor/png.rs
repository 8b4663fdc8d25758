use std::io::Cursor;

use image::DynamicImage;

use crate::error::CompressionError;
use crate::format::OutputFormat;
use crate::processor::ImageEncoder;

/// oxipng preset used for every PNG we emit
const OXIPNG_PRESET: u8 = 4;

/// PNG output.
///
/// Quality 100 keeps every colour (lossless re-encode). Anything lower
/// quantizes to an indexed palette with `imagequant`, using `quality` as the
/// upper bound of its quality range, so lower values yield smaller files.
/// Both paths finish with an oxipng pass that strips metadata chunks.
pub struct PngEncoder;

impl ImageEncoder for PngEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Png
    }

    fn encode(&self, img: &DynamicImage, quality: u8) -> Result<Vec<u8>, CompressionError> {
        let png = if quality >= 100 {
            encode_lossless(img)?
        } else {
            quantize_png(img, quality)?
        };
        optimize(&png)
    }
}

fn encode_lossless(img: &DynamicImage) -> Result<Vec<u8>, CompressionError> {
    let mut output = Vec::new();
    img.write_to(&mut Cursor::new(&mut output), image::ImageFormat::Png)
        .map_err(|e| CompressionError::Encode(format!("PNG: {e}")))?;
    Ok(output)
}

/// Quantize colors and encode as an indexed palette PNG
fn quantize_png(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, CompressionError> {
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let pixels: Vec<imagequant::RGBA> = rgba
        .pixels()
        .map(|p| imagequant::RGBA::new(p[0], p[1], p[2], p[3]))
        .collect();

    let quantize_err = |e: imagequant::Error| CompressionError::Encode(format!("PNG quantization: {e}"));

    let mut attr = imagequant::new();
    attr.set_quality(0, quality).map_err(quantize_err)?;

    let mut image = attr
        .new_image_borrowed(&pixels, width as usize, height as usize, 0.0)
        .map_err(quantize_err)?;
    let mut quantization = attr.quantize(&mut image).map_err(quantize_err)?;
    let (palette, indices) = quantization.remapped(&mut image).map_err(quantize_err)?;

    let lodepng_palette: Vec<lodepng::RGBA> = palette
        .iter()
        .map(|c| lodepng::RGBA {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        })
        .collect();

    let encode_err = |e: lodepng::Error| CompressionError::Encode(format!("PNG: {e}"));

    let mut encoder = lodepng::Encoder::new();
    encoder.set_auto_convert(false);
    encoder.set_palette(&lodepng_palette).map_err(encode_err)?;

    {
        let raw = encoder.info_raw_mut();
        raw.set_colortype(lodepng::ColorType::PALETTE);
        raw.set_bitdepth(8);
        raw.palette_clear();
        for &color in &lodepng_palette {
            raw.palette_add(color).map_err(encode_err)?;
        }
    }

    encoder
        .encode(&indices, width as usize, height as usize)
        .map_err(encode_err)
}

fn optimize(png_data: &[u8]) -> Result<Vec<u8>, CompressionError> {
    let mut opts = oxipng::Options::from_preset(OXIPNG_PRESET);
    opts.strip = oxipng::StripChunks::All;

    oxipng::optimize_from_memory(png_data, &opts)
        .map_err(|e| CompressionError::Encode(format!("PNG optimization: {e}")))
}
