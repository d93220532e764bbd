//! CLI subcommands and the helpers they share.

pub mod batch;
pub mod config;
pub mod extract;
pub mod scan;
pub mod serve;

use std::path::{Path, PathBuf};

use tracing::debug;

use xpends_core::models::config::XpendsConfig;
use xpends_core::{ExtractionResult, LocalRecognizer, MediaType};

/// Output format for a single result.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Plain text summary
    Text,
}

/// Default configuration location, `<config_dir>/xpends/config.json`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("xpends")
        .join("config.json")
}

/// Load the explicit config file, else the default one if it exists, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<XpendsConfig> {
    if let Some(path) = config_path {
        return Ok(XpendsConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Loading configuration from {}", default_path.display());
        Ok(XpendsConfig::from_file(&default_path)?)
    } else {
        Ok(XpendsConfig::default())
    }
}

/// Guess a media type label from a file extension.
pub fn media_type_for(path: &Path) -> Option<&'static str> {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(MediaType::from_extension)
        .map(|m| m.as_mime())
}

/// Build the local recognizer, honouring a `--model-dir` override.
pub fn local_recognizer(config: &XpendsConfig, model_dir: Option<PathBuf>) -> LocalRecognizer {
    let mut ocr = config.ocr.clone();
    if let Some(dir) = model_dir {
        ocr.model_dir = dir;
    }
    LocalRecognizer::from_config(ocr, config.pdf.clone())
}

pub fn format_result(result: &ExtractionResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(result)?),
        OutputFormat::Text => Ok(format_text(result)),
    }
}

fn format_text(result: &ExtractionResult) -> String {
    let field = |value: Option<String>| value.unwrap_or_else(|| "-".to_string());

    let mut output = String::new();
    output.push_str("=== RECEIPT ===\n\n");
    output.push_str(&format!("Provider: {}\n", field(result.provider_name.clone())));
    output.push_str(&format!("RUT:      {}\n", field(result.tax_id.clone())));
    output.push_str(&format!(
        "Amount:   {}\n",
        field(result.amount.map(|a| format!("${}", a)))
    ));

    let missing = result.missing_fields();
    if !missing.is_empty() {
        output.push_str(&format!("\nNot found: {}\n", missing.join(", ")));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_media_type_for() {
        assert_eq!(media_type_for(Path::new("boleta.JPG")), Some("image/jpeg"));
        assert_eq!(media_type_for(Path::new("factura.pdf")), Some("application/pdf"));
        assert_eq!(media_type_for(Path::new("notes.txt")), None);
        assert_eq!(media_type_for(Path::new("README")), None);
    }

    #[test]
    fn test_format_text() {
        let result = xpends_core::extract("RUT 76.123.456-7\nTotal $5.500");
        let text = format_result(&result, OutputFormat::Text).unwrap();
        assert!(text.contains("RUT:      76.123.456-7"));
        assert!(text.contains("Amount:   $5500"));
        assert!(text.contains("Provider: -"));
        assert!(text.contains("Not found: provider_name"));
    }

    #[test]
    fn test_format_json() {
        let result = xpends_core::extract("nothing here");
        let json = format_result(&result, OutputFormat::Json).unwrap();
        assert_eq!(
            json,
            r#"{"amount":null,"rut":null,"provider_name":null,"raw_text":"nothing here"}"#
        );
    }
}
