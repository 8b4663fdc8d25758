//! Running a compression off the caller's thread.

use std::sync::Arc;

use crate::asset::ImageAsset;
use crate::compressor::{Compression, Compressor};
use crate::config::CompressionConfig;
use crate::error::CompressionError;

/// Run [`Compressor::compress_detailed`] on tokio's blocking pool.
///
/// The whole call is the unit of suspension; there is no cancellation once
/// it has started. A panic inside the task is propagated to the awaiting
/// caller.
pub async fn compress_in_background(
    compressor: Arc<Compressor>,
    source: ImageAsset,
    config: CompressionConfig,
) -> Result<Compression, CompressionError> {
    let handle =
        tokio::task::spawn_blocking(move || compressor.compress_detailed(&source, &config));

    match handle.await {
        Ok(result) => result,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(e) => Err(CompressionError::Task(e.to_string())),
    }
}
