pub mod jpg;
pub mod png;
pub mod webp;

use image::DynamicImage;

use crate::error::CompressionError;
use crate::format::OutputFormat;

pub trait ImageEncoder: Send + Sync {
    fn format(&self) -> OutputFormat;
    /// Encode `img` at `quality` (0-100). Format-specific meaning of quality
    /// is documented on each encoder.
    fn encode(&self, img: &DynamicImage, quality: u8) -> Result<Vec<u8>, CompressionError>;
}
