use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use image::{GenericImageView, ImageReader};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use image_compressor::cli::{Cli, Command, CompressArgs};
use image_compressor::io::{
    collect_files, destination_overlapping_source, duplicate_destination, resolve_destination,
};
use image_compressor::report::{format_size, FileResult, Report};
use image_compressor::session::Session;
use image_compressor_core::{CompressionConfig, Compressor, ImageAsset, OutputFormat};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Init logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match &cli.command {
        Command::Compress(args) => handle_compress(args),
        Command::Inspect { inputs, recursive } => handle_inspect(inputs, *recursive),
    }
}

struct Job {
    path: PathBuf,
    session: Session,
    config: CompressionConfig,
}

fn handle_compress(args: &CompressArgs) -> Result<()> {
    let config = args.to_config();
    config.validate().context("Invalid compression settings")?;

    let files = collect_files(&args.inputs, args.recursive)
        .context("Failed to collect input files")?;
    if files.is_empty() {
        println!("No supported files found.");
        return Ok(());
    }

    let compressor = Compressor::default();
    let single_input = files.len() == 1;
    let mut report = Report::new();

    // Choose every source up front so destinations can be checked for clashes
    let mut jobs = Vec::with_capacity(files.len());
    let mut sources = Vec::with_capacity(files.len());
    let mut destinations = Vec::with_capacity(files.len());
    for path in files {
        let mut session = Session::new();
        let asset = match session.choose(&path) {
            Ok(asset) => asset.clone(),
            Err(e) => {
                log::error!("Error opening {}: {}", path.display(), e);
                report.add(FileResult::failed(path, 0, e.to_string()));
                continue;
            }
        };

        let mut job_config = config.clone();
        if job_config.format.is_none() && single_input {
            // `-o small.webp` implies the format
            job_config.format = args.output.as_deref().and_then(OutputFormat::from_path);
        }
        let format = compressor.format_for(&asset, &job_config);
        job_config.destination =
            resolve_destination(&path, args.output.as_deref(), single_input, format);
        sources.push(path.clone());
        destinations.push(compressor.destination_for(&asset, &job_config));
        jobs.push(Job {
            path,
            session,
            config: job_config,
        });
    }

    if let Some(dup) = duplicate_destination(destinations.iter().map(|d| d.as_path())) {
        anyhow::bail!(
            "Several inputs would be written to {}; pass --output with distinct names",
            dup.display()
        );
    }
    if let Some(clash) = destination_overlapping_source(
        sources.iter().map(|s| s.as_path()),
        destinations.iter().map(|d| d.as_path()),
    ) {
        anyhow::bail!(
            "Output {} is also one of the inputs; choose another --output",
            clash.display()
        );
    }

    let pb = if args.json {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(jobs.len() as u64)
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .context("Invalid progress bar template")?
            .progress_chars("█▓░"),
    );

    let results: Vec<FileResult> = jobs
        .par_iter_mut()
        .map(|job| {
            let original_size = job.session.chosen().map(|a| a.len()).unwrap_or(0);
            let result = match job.session.request_compression(&compressor, &job.config) {
                Ok(compression) => {
                    pb.set_message(job.path.display().to_string());
                    FileResult::compressed(job.path.clone(), original_size, compression)
                }
                Err(e) => {
                    log::error!("Error compressing {}: {}", job.path.display(), e);
                    FileResult::failed(job.path.clone(), original_size, e.to_string())
                }
            };
            pb.inc(1);
            result
        })
        .collect();
    pb.finish_and_clear();

    for result in results {
        report.add(result);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report.print_summary();
    }

    if report.error_count() > 0 {
        anyhow::bail!("{} file(s) failed", report.error_count());
    }
    Ok(())
}

fn handle_inspect(inputs: &[PathBuf], recursive: bool) -> Result<()> {
    let files = collect_files(inputs, recursive).context("Failed to collect input files")?;
    if files.is_empty() {
        println!("No supported files found.");
        return Ok(());
    }

    let mut failures = 0;
    for path in &files {
        println!("\nFile: {}", path.display());
        match inspect(path) {
            Ok(()) => {}
            Err(e) => {
                failures += 1;
                println!("  ERROR: {:#}", e);
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} file(s) could not be inspected", failures);
    }
    Ok(())
}

fn inspect(path: &Path) -> Result<()> {
    let asset = ImageAsset::open(path)?;
    let reader = ImageReader::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?
        .with_guessed_format()
        .context("Failed to read image header")?;
    let format = reader
        .format()
        .map(|f| format!("{:?}", f))
        .unwrap_or_else(|| "unknown".into());
    let img = reader.decode().context("Failed to decode image")?;
    let (width, height) = img.dimensions();

    println!("  Format: {}", format);
    println!("  Dimensions: {} x {} pixels", width, height);
    println!("  Color type: {:?}", img.color());
    println!("  Size: {} ({} bytes)", format_size(asset.len()), asset.len());
    Ok(())
}
