//! Batch command - scan multiple receipt files.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use xpends_core::{ExtractionResult, LocalRecognizer, RawDocument, ReceiptScanner};

use super::{load_config, local_recognizer, media_type_for};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern of input files
    #[arg(required = true)]
    input: String,

    /// Output directory for per-file JSON results
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,
}

/// Outcome of scanning a single file.
struct ScanOutcome {
    path: PathBuf,
    result: Result<ExtractionResult, String>,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| media_type_for(p).is_some())
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let scanner = ReceiptScanner::new(&config, local_recognizer(&config, args.model_dir.clone()))?;

    let mut outcomes = Vec::with_capacity(files.len());
    for path in files {
        let result = scan_file(&scanner, &path);

        if let Err(e) = &result {
            if args.continue_on_error {
                warn!("Failed to process {}: {}", path.display(), e);
            } else {
                error!("Failed to process {}: {}", path.display(), e);
                pb.abandon();
                anyhow::bail!("Processing failed for {}: {}", path.display(), e);
            }
        }

        outcomes.push(ScanOutcome { path, result });
        pb.inc(1);
    }

    pb.finish_with_message("Complete");

    if let Some(output_dir) = &args.output_dir {
        for outcome in &outcomes {
            if let Ok(result) = &outcome.result {
                let output_name = outcome
                    .path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("receipt");
                let output_path = output_dir.join(format!("{}.json", output_name));

                fs::write(&output_path, serde_json::to_string(result)?)?;
                debug!("Wrote output to {}", output_path.display());
            }
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &outcomes)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let failed: Vec<_> = outcomes.iter().filter(|o| o.result.is_err()).collect();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        outcomes.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(outcomes.len() - failed.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for outcome in &failed {
            if let Err(e) = &outcome.result {
                println!("  - {}: {}", outcome.path.display(), e);
            }
        }
    }

    Ok(())
}

fn scan_file(scanner: &ReceiptScanner<LocalRecognizer>, path: &Path) -> Result<ExtractionResult, String> {
    let media_type = media_type_for(path).ok_or_else(|| "unknown file type".to_string())?;
    let bytes = fs::read(path).map_err(|e| e.to_string())?;

    scanner
        .scan(&RawDocument::new(bytes, media_type))
        .map_err(|e| e.detail())
}

fn write_summary(path: &Path, outcomes: &[ScanOutcome]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    write_summary_records(&mut wtr, outcomes)?;
    wtr.flush()?;
    Ok(())
}

fn write_summary_records<W: std::io::Write>(
    wtr: &mut csv::Writer<W>,
    outcomes: &[ScanOutcome],
) -> anyhow::Result<()> {
    wtr.write_record(["file", "amount", "rut", "provider_name", "error"])?;

    for outcome in outcomes {
        let file = outcome
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        match &outcome.result {
            Ok(result) => wtr.write_record([
                file,
                &result.amount.map(|a| a.to_string()).unwrap_or_default(),
                result.tax_id.as_deref().unwrap_or(""),
                result.provider_name.as_deref().unwrap_or(""),
                "",
            ])?,
            Err(e) => wtr.write_record([file, "", "", "", e.as_str()])?,
        }
    }

    Ok(())
}
