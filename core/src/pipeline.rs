use image::DynamicImage;

use crate::error::CompressionError;
use crate::format::OutputFormat;
use crate::processor::jpg::JpgEncoder;
use crate::processor::png::PngEncoder;
use crate::processor::webp::WebpEncoder;
use crate::processor::ImageEncoder;

pub struct Pipeline {
    encoders: Vec<Box<dyn ImageEncoder>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            encoders: Vec::new(),
        }
    }

    /// A pipeline with the JPEG, PNG and WebP encoders registered.
    pub fn with_default_encoders() -> Self {
        let mut pipeline = Self::new();
        pipeline.register(Box::new(JpgEncoder));
        pipeline.register(Box::new(PngEncoder));
        pipeline.register(Box::new(WebpEncoder));
        pipeline
    }

    /// Register an encoder. A later registration for the same format wins.
    pub fn register(&mut self, encoder: Box<dyn ImageEncoder>) {
        self.encoders.retain(|e| e.format() != encoder.format());
        self.encoders.push(encoder);
    }

    fn find_encoder(&self, format: OutputFormat) -> Option<&dyn ImageEncoder> {
        self.encoders
            .iter()
            .find(|e| e.format() == format)
            .map(|e| e.as_ref())
    }

    pub fn encode(
        &self,
        img: &DynamicImage,
        format: OutputFormat,
        quality: u8,
    ) -> Result<Vec<u8>, CompressionError> {
        let encoder = self.find_encoder(format).ok_or_else(|| {
            CompressionError::Encode(format!("no encoder registered for {}", format.as_str()))
        })?;
        encoder.encode(img, quality)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::with_default_encoders()
    }
}
