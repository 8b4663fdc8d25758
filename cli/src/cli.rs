use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use image_compressor_core::{CompressionConfig, OutputFormat, SizeLimit};

/// Pick images, compress them, and compare before/after sizes
#[derive(Debug, Parser)]
#[command(name = "image_compressor", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compress one or more images
    Compress(CompressArgs),

    /// Show format, dimensions and size without compressing
    Inspect {
        /// Input files or directories
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Process directories recursively
        #[arg(short, long)]
        recursive: bool,
    },
}

/// Starting point for the compression settings; explicit flags override it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    /// 612x816, quality 80, format taken from the source
    Default,
    /// 1280x720, quality 80, WebP, at most 2 MiB
    Custom,
}

impl Preset {
    pub const CUSTOM_MAX_BYTES: u64 = 2_097_152;

    pub fn config(self) -> CompressionConfig {
        match self {
            Preset::Default => CompressionConfig::default(),
            Preset::Custom => CompressionConfig::default()
                .with_resolution(1280, 720)
                .with_quality(80)
                .with_format(OutputFormat::Webp)
                .with_max_size(Self::CUSTOM_MAX_BYTES),
        }
    }
}

#[derive(Debug, Args)]
pub struct CompressArgs {
    /// Input files or directories
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output file (single input) or directory. Default: the system temp dir
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Settings to start from
    #[arg(long, value_enum, default_value_t = Preset::Default)]
    pub preset: Preset,

    /// Maximum output width in pixels
    #[arg(long)]
    pub max_width: Option<u32>,

    /// Maximum output height in pixels
    #[arg(long)]
    pub max_height: Option<u32>,

    /// Encoding quality 0–100
    #[arg(short, long, allow_negative_numbers = true)]
    pub quality: Option<i32>,

    /// Output format (jpg, png, webp). Default: same as the source
    #[arg(short, long)]
    pub format: Option<OutputFormat>,

    /// Target file size in bytes; quality is lowered until it fits
    #[arg(long, value_name = "BYTES")]
    pub max_size: Option<u64>,

    /// Quality decrement per retry when a size target is set
    #[arg(long)]
    pub size_step: Option<u8>,

    /// Lowest quality the size target may push to
    #[arg(long)]
    pub min_quality: Option<u8>,

    /// Maximum number of re-encodes when a size target is set
    #[arg(long)]
    pub max_iterations: Option<u32>,

    /// Process directories recursively
    #[arg(short, long)]
    pub recursive: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

impl CompressArgs {
    pub fn to_config(&self) -> CompressionConfig {
        let mut config = self.preset.config();

        if let Some(w) = self.max_width {
            config.max_width = w;
        }
        if let Some(h) = self.max_height {
            config.max_height = h;
        }
        if let Some(q) = self.quality {
            config.quality = q;
        }
        if let Some(f) = self.format {
            config.format = Some(f);
        }
        if let Some(max_bytes) = self.max_size {
            let limit = config.size_limit.unwrap_or_else(|| SizeLimit::new(max_bytes));
            config.size_limit = Some(SizeLimit { max_bytes, ..limit });
        }

        match config.size_limit.as_mut() {
            Some(limit) => {
                if let Some(step) = self.size_step {
                    limit.step = step;
                }
                if let Some(min) = self.min_quality {
                    limit.min_quality = min;
                }
                if let Some(n) = self.max_iterations {
                    limit.max_iterations = n;
                }
            }
            None => {
                if self.size_step.is_some() || self.min_quality.is_some() || self.max_iterations.is_some() {
                    log::warn!("--size-step/--min-quality/--max-iterations ignored without --max-size");
                }
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CompressArgs {
        let mut argv = vec!["image_compressor", "compress"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Compress(args) => args,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_default_preset() {
        let config = parse(&["a.jpg"]).to_config();
        assert_eq!(config, CompressionConfig::default());
    }

    #[test]
    fn test_custom_preset() {
        let config = parse(&["a.jpg", "--preset", "custom"]).to_config();
        assert_eq!((config.max_width, config.max_height), (1280, 720));
        assert_eq!(config.quality, 80);
        assert_eq!(config.format, Some(OutputFormat::Webp));
        assert_eq!(config.size_limit.unwrap().max_bytes, 2_097_152);
    }

    #[test]
    fn test_flags_override_preset() {
        let config = parse(&[
            "a.jpg", "--preset", "custom", "-q", "60", "-f", "png", "--max-size", "1000",
            "--size-step", "5",
        ])
        .to_config();
        assert_eq!(config.quality, 60);
        assert_eq!(config.format, Some(OutputFormat::Png));
        let limit = config.size_limit.unwrap();
        assert_eq!((limit.max_bytes, limit.step), (1000, 5));
        assert_eq!(limit.min_quality, SizeLimit::DEFAULT_MIN_QUALITY);
    }

    #[test]
    fn test_negative_quality_reaches_validation() {
        let config = parse(&["a.jpg", "-q", "-1"]).to_config();
        assert_eq!(config.quality, -1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_requires_an_input() {
        assert!(Cli::try_parse_from(["image_compressor", "compress"]).is_err());
    }
}
