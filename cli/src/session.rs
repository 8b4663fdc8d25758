use std::path::Path;

use image_compressor_core::{Compression, CompressionConfig, Compressor, ImageAsset};

use crate::error::SessionError;

/// The image the user is working on and its latest compressed result.
#[derive(Debug, Default)]
pub struct Session {
    chosen: Option<ImageAsset>,
    compressed: Option<Compression>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Choose a new source image. Any previous result is discarded.
    pub fn choose(&mut self, path: &Path) -> Result<&ImageAsset, SessionError> {
        let asset = ImageAsset::open(path).map_err(SessionError::Unreadable)?;
        self.compressed = None;
        Ok(self.chosen.insert(asset))
    }

    pub fn chosen(&self) -> Option<&ImageAsset> {
        self.chosen.as_ref()
    }

    pub fn compressed(&self) -> Option<&Compression> {
        self.compressed.as_ref()
    }

    /// Compress the chosen image and keep the result.
    ///
    /// A failed request leaves the previous result in place.
    pub fn request_compression(
        &mut self,
        compressor: &Compressor,
        config: &CompressionConfig,
    ) -> Result<&Compression, SessionError> {
        let source = self.chosen.as_ref().ok_or(SessionError::NoImageChosen)?;
        let compression = compressor.compress_detailed(source, config)?;
        Ok(self.compressed.insert(compression))
    }

    pub fn clear(&mut self) {
        self.chosen = None;
        self.compressed = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat};
    use image_compressor_core::CompressionError;

    fn source(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("pick.png");
        DynamicImage::new_rgb8(40, 30)
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();
        path
    }

    #[test]
    fn test_compress_without_choice() {
        let dir = tempfile::tempdir().unwrap();
        let compressor = Compressor::new(dir.path());
        let mut session = Session::new();

        let err = session
            .request_compression(&compressor, &CompressionConfig::default())
            .unwrap_err();
        assert!(matches!(err, SessionError::NoImageChosen));
        assert_eq!(err.to_string(), "Please choose an image!");
    }

    #[test]
    fn test_choose_then_compress() {
        let dir = tempfile::tempdir().unwrap();
        let compressor = Compressor::new(dir.path().join("out"));
        let mut session = Session::new();

        let chosen = session.choose(&source(dir.path())).unwrap();
        assert!(chosen.len() > 0);

        let result = session
            .request_compression(&compressor, &CompressionConfig::default())
            .unwrap();
        assert_eq!(result.asset.path(), dir.path().join("out").join("pick.png"));
        assert!(session.compressed().is_some());
    }

    #[test]
    fn test_choosing_again_clears_result() {
        let dir = tempfile::tempdir().unwrap();
        let compressor = Compressor::new(dir.path().join("out"));
        let mut session = Session::new();
        let path = source(dir.path());

        session.choose(&path).unwrap();
        session
            .request_compression(&compressor, &CompressionConfig::default())
            .unwrap();
        session.choose(&path).unwrap();
        assert!(session.compressed().is_none());
        assert!(session.chosen().is_some());

        session.clear();
        assert!(session.chosen().is_none());
    }

    #[test]
    fn test_unreadable_choice_keeps_previous() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new();
        let path = source(dir.path());
        session.choose(&path).unwrap();

        let err = session.choose(&dir.path().join("missing.jpg")).unwrap_err();
        assert!(matches!(err, SessionError::Unreadable(_)));
        assert_eq!(session.chosen().unwrap().path(), path.as_path());
    }

    #[test]
    fn test_compression_error_surfaces() {
        let dir = tempfile::tempdir().unwrap();
        let compressor = Compressor::new(dir.path().join("out"));
        let mut session = Session::new();
        session.choose(&source(dir.path())).unwrap();

        let config = CompressionConfig::default().with_quality(150);
        let err = session.request_compression(&compressor, &config).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Compression(CompressionError::InvalidConfig(_))
        ));
    }
}
