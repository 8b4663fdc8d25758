use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageDecoder, ImageReader};
use serde::Serialize;

use crate::asset::ImageAsset;
use crate::config::{CompressionConfig, SizeLimit};
use crate::error::CompressionError;
use crate::format::OutputFormat;
use crate::pipeline::Pipeline;
use crate::resize::scale_down;

/// Name of the default output directory created under the system temp dir.
pub const DEFAULT_OUTPUT_DIR: &str = "compressor";

/// Everything known about a finished compression.
#[derive(Debug, Clone, Serialize)]
pub struct Compression {
    pub asset: ImageAsset,
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
    /// Quality of the encoding that was written
    pub quality: u8,
    /// Number of encodes performed, including the first
    pub attempts: u32,
    /// False when a size limit was set and could not be reached
    pub size_limit_met: bool,
}

pub struct Compressor {
    pipeline: Pipeline,
    output_dir: PathBuf,
}

impl Compressor {
    /// A compressor writing derived destinations into `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self::with_pipeline(output_dir, Pipeline::with_default_encoders())
    }

    pub fn with_pipeline(output_dir: impl Into<PathBuf>, pipeline: Pipeline) -> Self {
        Self {
            pipeline,
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Format the output is encoded in.
    pub fn format_for(&self, source: &ImageAsset, config: &CompressionConfig) -> OutputFormat {
        config
            .format
            .unwrap_or_else(|| OutputFormat::infer(source.path()))
    }

    /// Where `compress` will write the output of `source` under `config`.
    pub fn destination_for(&self, source: &ImageAsset, config: &CompressionConfig) -> PathBuf {
        if let Some(dest) = &config.destination {
            return dest.clone();
        }
        let stem = source
            .path()
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".into());
        let format = self.format_for(source, config);
        self.output_dir
            .join(format!("{}.{}", stem, format.extension()))
    }

    /// Compress `source` into a new file and return the written asset.
    pub fn compress(
        &self,
        source: &ImageAsset,
        config: &CompressionConfig,
    ) -> Result<ImageAsset, CompressionError> {
        self.compress_detailed(source, config).map(|c| c.asset)
    }

    /// Decode, scale down, encode (shrinking quality towards any size limit)
    /// and atomically write. The source file is only ever read.
    pub fn compress_detailed(
        &self,
        source: &ImageAsset,
        config: &CompressionConfig,
    ) -> Result<Compression, CompressionError> {
        config.validate()?;

        let format = self.format_for(source, config);
        let destination = self.destination_for(source, config);
        if same_file(source.path(), &destination) {
            return Err(CompressionError::InvalidConfig(format!(
                "destination {} would overwrite the source",
                destination.display()
            )));
        }

        let img = decode(source.path())?;
        log::debug!(
            "Decoded {}: {}x{} pixels",
            source.path().display(),
            img.width(),
            img.height()
        );

        let scaled = scale_down(img, config.max_width, config.max_height);
        let encoded = self.encode_within_limit(&scaled, format, config)?;

        let len = write_atomically(&destination, &encoded.bytes)?;
        log::debug!(
            "Wrote {} ({} bytes, {} at quality {})",
            destination.display(),
            len,
            format.as_str(),
            encoded.quality
        );

        Ok(Compression {
            asset: ImageAsset::new(destination, len),
            width: scaled.width(),
            height: scaled.height(),
            format,
            quality: encoded.quality,
            attempts: encoded.attempts,
            size_limit_met: encoded.size_limit_met,
        })
    }

    fn encode_within_limit(
        &self,
        img: &DynamicImage,
        format: OutputFormat,
        config: &CompressionConfig,
    ) -> Result<Encoded, CompressionError> {
        let mut quality = config.encoder_quality();
        let bytes = self.pipeline.encode(img, format, quality)?;
        log::debug!("Attempt 1: quality {} -> {} bytes", quality, bytes.len());

        let mut best = Encoded {
            bytes,
            quality,
            attempts: 1,
            size_limit_met: true,
        };

        let Some(limit) = config.size_limit else {
            return Ok(best);
        };

        let mut last_len = best.len();
        let mut iterations = 0;
        while last_len > limit.max_bytes
            && quality > limit.min_quality
            && iterations < limit.max_iterations
        {
            quality = next_quality(quality, &limit);
            iterations += 1;

            let bytes = self.pipeline.encode(img, format, quality)?;
            best.attempts += 1;
            log::debug!(
                "Attempt {}: quality {} -> {} bytes",
                best.attempts,
                quality,
                bytes.len()
            );

            last_len = bytes.len() as u64;
            if last_len < best.len() {
                best.bytes = bytes;
                best.quality = quality;
            }
        }

        best.size_limit_met = best.len() <= limit.max_bytes;
        if !best.size_limit_met {
            log::warn!(
                "Size limit of {} bytes not met: smallest encoding is {} bytes at quality {}",
                limit.max_bytes,
                best.len(),
                best.quality
            );
        }
        Ok(best)
    }
}

impl Default for Compressor {
    fn default() -> Self {
        Self::new(std::env::temp_dir().join(DEFAULT_OUTPUT_DIR))
    }
}

struct Encoded {
    bytes: Vec<u8>,
    quality: u8,
    attempts: u32,
    size_limit_met: bool,
}

impl Encoded {
    fn len(&self) -> u64 {
        self.bytes.len() as u64
    }
}

fn next_quality(quality: u8, limit: &SizeLimit) -> u8 {
    quality.saturating_sub(limit.step).max(limit.min_quality)
}

/// Decode by sniffing content, then apply any EXIF orientation.
fn decode(path: &Path) -> Result<DynamicImage, CompressionError> {
    let data = fs::read(path).map_err(|e| CompressionError::decode(path, e))?;

    let mut decoder = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| CompressionError::decode(path, e))?
        .into_decoder()
        .map_err(|e| CompressionError::decode(path, e))?;

    let orientation = decoder.orientation().ok();
    let mut img =
        DynamicImage::from_decoder(decoder).map_err(|e| CompressionError::decode(path, e))?;
    if let Some(orientation) = orientation {
        img.apply_orientation(orientation);
    }
    Ok(img)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Write through a temp file in the destination directory, then rename.
/// On any failure the temp file is removed and the destination is untouched.
fn write_atomically(destination: &Path, data: &[u8]) -> Result<u64, CompressionError> {
    let parent = match destination.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| CompressionError::write(parent, e))?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".compress-")
        .tempfile_in(parent)
        .map_err(|e| CompressionError::write(destination, e))?;
    tmp.write_all(data)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| CompressionError::write(destination, e))?;
    tmp.persist(destination)
        .map_err(|e| CompressionError::write(destination, e.error))?;

    let meta = fs::metadata(destination).map_err(|e| CompressionError::write(destination, e))?;
    Ok(meta.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limit(step: u8, min_quality: u8) -> SizeLimit {
        SizeLimit {
            max_bytes: 1,
            step,
            min_quality,
            max_iterations: 10,
        }
    }

    #[test]
    fn test_next_quality_steps_down_to_floor() {
        assert_eq!(next_quality(80, &limit(10, 10)), 70);
        assert_eq!(next_quality(15, &limit(10, 10)), 10);
        assert_eq!(next_quality(3, &limit(10, 0)), 0);
    }

    #[test]
    fn test_destination_derived_from_source_name() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("holiday.photo.png");
        fs::write(&src, b"x").unwrap();
        let asset = ImageAsset::open(&src).unwrap();

        let compressor = Compressor::new(dir.path().join("out"));
        assert_eq!(compressor.output_dir(), dir.path().join("out").as_path());
        let dest = compressor.destination_for(&asset, &CompressionConfig::default());
        assert_eq!(dest, dir.path().join("out").join("holiday.photo.png"));

        let webp = CompressionConfig::default().with_format(OutputFormat::Webp);
        assert_eq!(
            compressor.destination_for(&asset, &webp),
            dir.path().join("out").join("holiday.photo.webp")
        );
    }

    #[test]
    fn test_unknown_extension_becomes_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("scan.bmp");
        fs::write(&src, b"x").unwrap();
        let asset = ImageAsset::open(&src).unwrap();

        let compressor = Compressor::new(dir.path());
        assert_eq!(
            compressor.format_for(&asset, &CompressionConfig::default()),
            OutputFormat::Jpeg
        );
        assert_eq!(
            compressor.destination_for(&asset, &CompressionConfig::default()),
            dir.path().join("scan.jpg")
        );
    }

    #[test]
    fn test_write_atomically_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("nested").join("out.bin");
        let len = write_atomically(&dest, b"hello").unwrap();
        assert_eq!(len, 5);

        let entries: Vec<_> = fs::read_dir(dest.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("out.bin")]);
    }
}
