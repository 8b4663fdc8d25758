use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::CompressionError;
use crate::format::OutputFormat;

/// Iterative quality reduction towards a target file size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeLimit {
    /// Target upper bound on the encoded length in bytes
    pub max_bytes: u64,
    /// Quality decrement applied before each re-encode
    pub step: u8,
    /// Quality floor; the loop gives up once an encode at this quality is done
    pub min_quality: u8,
    /// Maximum number of re-encodes after the first attempt.
    ///
    /// Hitting the cap ends the loop just like reaching `min_quality`: the
    /// smallest encoding so far is written and `size_limit_met` is false.
    /// With a small `step` this can happen well above the floor.
    pub max_iterations: u32,
}

impl SizeLimit {
    pub const DEFAULT_STEP: u8 = 10;
    pub const DEFAULT_MIN_QUALITY: u8 = 10;
    pub const DEFAULT_MAX_ITERATIONS: u32 = 10;

    pub fn new(max_bytes: u64) -> Self {
        Self {
            max_bytes,
            step: Self::DEFAULT_STEP,
            min_quality: Self::DEFAULT_MIN_QUALITY,
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
        }
    }

    fn validate(&self) -> Result<(), CompressionError> {
        if self.max_bytes == 0 {
            return Err(invalid("max size must be a positive number of bytes"));
        }
        if self.step == 0 {
            return Err(invalid("size step must be positive"));
        }
        if self.min_quality > 100 {
            return Err(invalid(format!(
                "minimum quality {} is outside 0-100",
                self.min_quality
            )));
        }
        if self.max_iterations == 0 {
            return Err(invalid("max iterations must be positive"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressionConfig {
    /// Upper bound on output width in pixels
    pub max_width: u32,
    /// Upper bound on output height in pixels
    pub max_height: u32,
    /// Encoding quality 0-100 (signed so out-of-range input can be rejected)
    pub quality: i32,
    /// Target encoding; `None` derives it from the source extension
    pub format: Option<OutputFormat>,
    /// Optional target file size
    pub size_limit: Option<SizeLimit>,
    /// Output path; `None` writes into the compressor's output directory
    pub destination: Option<PathBuf>,
}

impl CompressionConfig {
    pub const DEFAULT_MAX_WIDTH: u32 = 612;
    pub const DEFAULT_MAX_HEIGHT: u32 = 816;
    pub const DEFAULT_QUALITY: i32 = 80;

    pub fn with_resolution(mut self, max_width: u32, max_height: u32) -> Self {
        self.max_width = max_width;
        self.max_height = max_height;
        self
    }

    pub fn with_quality(mut self, quality: i32) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_size_limit(mut self, limit: SizeLimit) -> Self {
        self.size_limit = Some(limit);
        self
    }

    /// Shorthand for a [`SizeLimit`] with default step, floor and iteration cap.
    pub fn with_max_size(self, max_bytes: u64) -> Self {
        self.with_size_limit(SizeLimit::new(max_bytes))
    }

    pub fn with_destination(mut self, destination: impl Into<PathBuf>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    /// Check every option is in range. Nothing is read or written.
    pub fn validate(&self) -> Result<(), CompressionError> {
        if self.max_width == 0 || self.max_height == 0 {
            return Err(invalid(format!(
                "resolution {}x{} must be positive",
                self.max_width, self.max_height
            )));
        }
        if !(0..=100).contains(&self.quality) {
            return Err(invalid(format!("quality {} is outside 0-100", self.quality)));
        }
        if let Some(limit) = &self.size_limit {
            limit.validate()?;
        }
        if let Some(dest) = &self.destination {
            if dest.file_name().is_none() {
                return Err(invalid(format!(
                    "destination {} does not name a file",
                    dest.display()
                )));
            }
        }
        Ok(())
    }

    /// Quality as an encoder parameter. Only meaningful after [`validate`](Self::validate).
    pub(crate) fn encoder_quality(&self) -> u8 {
        self.quality.clamp(0, 100) as u8
    }
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            max_width: Self::DEFAULT_MAX_WIDTH,
            max_height: Self::DEFAULT_MAX_HEIGHT,
            quality: Self::DEFAULT_QUALITY,
            format: None,
            size_limit: None,
            destination: None,
        }
    }
}

fn invalid(msg: impl Into<String>) -> CompressionError {
    CompressionError::InvalidConfig(msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = CompressionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!((config.max_width, config.max_height), (612, 816));
        assert_eq!(config.quality, 80);
    }

    #[test]
    fn test_quality_out_of_range() {
        for quality in [-1, 101, 150] {
            let err = CompressionConfig::default()
                .with_quality(quality)
                .validate()
                .unwrap_err();
            assert!(matches!(err, CompressionError::InvalidConfig(_)), "{quality}");
        }
        assert!(CompressionConfig::default().with_quality(0).validate().is_ok());
        assert!(CompressionConfig::default().with_quality(100).validate().is_ok());
    }

    #[test]
    fn test_zero_resolution_rejected() {
        let err = CompressionConfig::default()
            .with_resolution(0, 720)
            .validate()
            .unwrap_err();
        assert!(matches!(err, CompressionError::InvalidConfig(_)));
    }

    #[test]
    fn test_size_limit_validation() {
        let zero = CompressionConfig::default().with_max_size(0);
        assert!(zero.validate().is_err());

        let mut limit = SizeLimit::new(1024);
        limit.step = 0;
        assert!(CompressionConfig::default().with_size_limit(limit).validate().is_err());

        let mut limit = SizeLimit::new(1024);
        limit.min_quality = 101;
        assert!(CompressionConfig::default().with_size_limit(limit).validate().is_err());
    }

    #[test]
    fn test_destination_must_name_file() {
        let config = CompressionConfig::default().with_destination("/");
        assert!(config.validate().is_err());
    }
}
