use std::path::PathBuf;

use serde::Serialize;

use image_compressor_core::{Compression, OutputFormat};

/// Result of processing a single file.
#[derive(Debug, Serialize)]
pub struct FileResult {
    pub path: PathBuf,
    pub original_size: u64,
    pub compressed_size: u64,
    pub output: Option<PathBuf>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub format: Option<OutputFormat>,
    pub quality: Option<u8>,
    pub size_limit_met: bool,
    pub error: Option<String>,
}

impl FileResult {
    pub fn compressed(path: PathBuf, original_size: u64, compression: &Compression) -> Self {
        Self {
            path,
            original_size,
            compressed_size: compression.asset.len(),
            output: Some(compression.asset.path().to_path_buf()),
            width: Some(compression.width),
            height: Some(compression.height),
            format: Some(compression.format),
            quality: Some(compression.quality),
            size_limit_met: compression.size_limit_met,
            error: None,
        }
    }

    pub fn failed(path: PathBuf, original_size: u64, error: String) -> Self {
        Self {
            path,
            original_size,
            compressed_size: 0,
            output: None,
            width: None,
            height: None,
            format: None,
            quality: None,
            size_limit_met: false,
            error: Some(error),
        }
    }

    pub fn savings_pct(&self) -> f64 {
        if self.original_size == 0 {
            return 0.0;
        }
        (1.0 - self.compressed_size as f64 / self.original_size as f64) * 100.0
    }
}

/// Aggregate report for all processed files.
#[derive(Debug, Default, Serialize)]
pub struct Report {
    pub results: Vec<FileResult>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, result: FileResult) {
        self.results.push(result);
    }

    fn successes(&self) -> impl Iterator<Item = &FileResult> {
        self.results.iter().filter(|r| r.error.is_none())
    }

    pub fn total_original(&self) -> u64 {
        self.successes().map(|r| r.original_size).sum()
    }

    pub fn total_compressed(&self) -> u64 {
        self.successes().map(|r| r.compressed_size).sum()
    }

    pub fn total_savings_pct(&self) -> f64 {
        let orig = self.total_original();
        if orig == 0 {
            return 0.0;
        }
        (1.0 - self.total_compressed() as f64 / orig as f64) * 100.0
    }

    pub fn success_count(&self) -> usize {
        self.successes().count()
    }

    pub fn error_count(&self) -> usize {
        self.results.iter().filter(|r| r.error.is_some()).count()
    }

    pub fn print_summary(&self) {
        for r in &self.results {
            match (&r.error, &r.output) {
                (Some(err), _) => println!("  ERROR {}: {}", r.path.display(), err),
                (None, Some(out)) => {
                    let note = if r.size_limit_met { "" } else { " [size limit not met]" };
                    println!(
                        "  {}: {} → {} ({:.1}% reduction) saved in {}{}",
                        r.path.display(),
                        format_size(r.original_size),
                        format_size(r.compressed_size),
                        r.savings_pct(),
                        out.display(),
                        note
                    );
                }
                (None, None) => {}
            }
        }

        println!("\n--- Summary ---");
        println!(
            "Files compressed: {} | Errors: {}",
            self.success_count(),
            self.error_count()
        );

        if self.success_count() > 0 {
            println!(
                "Total: {} → {} ({:.1}% reduction)",
                format_size(self.total_original()),
                format_size(self.total_compressed()),
                self.total_savings_pct()
            );
        }
    }
}

/// Human-readable size: powers of 1024, thousands separators, at most one
/// decimal (`1,000 B`, `1.5 KB`, `2 MB`). Zero is `"0"`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    if bytes == 0 {
        return "0".into();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    // Ties go to the even neighbour, so 1.25 KB prints as 1.2 KB
    let tenths = (value * 10.0).round_ties_even() as u64;
    let (whole, frac) = (tenths / 10, tenths % 10);
    let mut out = group_thousands(whole);
    if frac != 0 {
        out.push('.');
        out.push(char::from(b'0' + frac as u8));
    }
    out.push(' ');
    out.push_str(UNITS[unit]);
    out
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
