use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use image_compressor_core::OutputFormat;

/// Extensions picked up when expanding a directory.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "bmp", "tif", "tiff"];

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Expand the user's inputs into a list of files.
///
/// Explicit files are kept whatever their extension (the compressor sniffs
/// content). Directories contribute their image files, one level deep
/// unless `recursive` is set. Missing paths are returned as-is so the
/// caller can report them.
pub fn collect_files(inputs: &[PathBuf], recursive: bool) -> Result<Vec<PathBuf>, walkdir::Error> {
    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut files = Vec::new();

    for input in inputs {
        if !input.is_dir() {
            files.push(input.clone());
            continue;
        }
        for entry in WalkDir::new(input).max_depth(max_depth).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_file() && is_image(entry.path()) {
                files.push(entry.into_path());
            }
        }
    }

    Ok(files)
}

/// Destination for `input` given the user's `--output`.
///
/// `None` means the compressor derives one in its output directory. A
/// single input with an output that has an extension (and is not an
/// existing directory) is written exactly there; otherwise the output is
/// a directory receiving `<stem>.<ext>`.
pub fn resolve_destination(
    input: &Path,
    output: Option<&Path>,
    single_input: bool,
    format: OutputFormat,
) -> Option<PathBuf> {
    let out = output?;
    if single_input && out.extension().is_some() && !out.is_dir() {
        return Some(out.to_path_buf());
    }
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".into());
    Some(out.join(format!("{}.{}", stem, format.extension())))
}

/// First destination that occurs more than once.
pub fn duplicate_destination<'a>(paths: impl IntoIterator<Item = &'a Path>) -> Option<&'a Path> {
    let mut seen = HashSet::new();
    paths.into_iter().find(|p| !seen.insert(*p))
}

/// First destination that resolves to one of the batch's sources.
///
/// Paths that do not exist yet cannot clash and are skipped.
pub fn destination_overlapping_source<'a>(
    sources: impl IntoIterator<Item = &'a Path>,
    destinations: impl IntoIterator<Item = &'a Path>,
) -> Option<&'a Path> {
    let sources: HashSet<PathBuf> = sources
        .into_iter()
        .filter_map(|p| fs::canonicalize(p).ok())
        .collect();
    destinations.into_iter().find(|d| {
        fs::canonicalize(d)
            .map(|d| sources.contains(&d))
            .unwrap_or(false)
    })
}
