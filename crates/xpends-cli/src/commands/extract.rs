//! Extract command - run the field extractors over plain text.

use std::fs;
use std::io::Read;
use std::path::PathBuf;

use clap::Args;
use tracing::info;

use xpends_core::ReceiptParser;

use super::{OutputFormat, format_result, load_config};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Text file to read, or `-` for stdin (default: stdin)
    input: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let parser = ReceiptParser::from_config(&config.extraction)?;

    let text = match &args.input {
        Some(path) if path.as_os_str() != "-" => fs::read_to_string(path)?,
        _ => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            text
        }
    };

    info!("Extracting fields from {} chars of text", text.chars().count());

    let result = parser.parse(&text);
    println!("{}", format_result(&result, args.format)?);

    Ok(())
}
