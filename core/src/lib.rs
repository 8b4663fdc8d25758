pub mod asset;
pub mod compressor;
pub mod config;
pub mod error;
pub mod format;
pub mod pipeline;
pub mod processor;
pub mod resize;
pub mod task;

pub use asset::ImageAsset;
pub use compressor::{Compression, Compressor};
pub use config::{CompressionConfig, SizeLimit};
pub use error::CompressionError;
pub use format::OutputFormat;
pub use task::compress_in_background;
