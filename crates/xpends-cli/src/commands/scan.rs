//! Scan command - extract fields from a single receipt file.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use xpends_core::{RawDocument, ReceiptScanner};

use super::{OutputFormat, format_result, load_config, local_recognizer, media_type_for};

/// Arguments for the scan command.
#[derive(Args)]
pub struct ScanArgs {
    /// Input file (image or PDF)
    #[arg(required = true)]
    input: PathBuf,

    /// Media type of the input (default: guessed from the extension)
    #[arg(long)]
    media_type: Option<String>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,
}

pub async fn run(args: ScanArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let media_type = match args.media_type.clone() {
        Some(media_type) => media_type,
        None => media_type_for(&args.input)
            .map(str::to_string)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Cannot guess the media type of {}. Pass --media-type.",
                    args.input.display()
                )
            })?,
    };

    info!("Scanning {} as {}", args.input.display(), media_type);

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));

    pb.set_message("Loading OCR models...");
    let recognizer = local_recognizer(&config, args.model_dir.clone());
    let scanner = ReceiptScanner::new(&config, recognizer)?;

    pb.set_message("Reading receipt...");
    let document = RawDocument::new(fs::read(&args.input)?, media_type);
    let result = scanner.scan(&document);
    pb.finish_and_clear();

    let result = result.map_err(|e| anyhow::anyhow!("{} (status {})", e.detail(), e.status_code()))?;
    let output = format_result(&result, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}
