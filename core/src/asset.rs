use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::CompressionError;

/// An image file on durable storage.
///
/// Assets are never mutated: compressing one produces a new asset for the
/// written output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageAsset {
    path: PathBuf,
    len: u64,
}

impl ImageAsset {
    /// Resolve `path` to a readable regular file and record its length.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CompressionError> {
        let path = path.as_ref();
        let meta = fs::metadata(path).map_err(|e| CompressionError::decode(path, e))?;
        if !meta.is_file() {
            return Err(CompressionError::decode(path, "not a regular file"));
        }
        Ok(Self {
            path: path.to_path_buf(),
            len: meta.len(),
        })
    }

    pub(crate) fn new(path: PathBuf, len: u64) -> Self {
        Self { path, len }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Byte length at the time the asset was created.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}
