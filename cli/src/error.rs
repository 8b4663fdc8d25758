use thiserror::Error;

use image_compressor_core::CompressionError;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Please choose an image!")]
    NoImageChosen,

    #[error("failed to read picture data: {0}")]
    Unreadable(#[source] CompressionError),

    #[error(transparent)]
    Compression(#[from] CompressionError),
}
