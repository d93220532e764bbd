//! Configuration structures for the scan pipeline.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::XpendsError;
use crate::models::document::MediaType;

/// Main configuration for the xpends pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct XpendsConfig {
    /// Upload validation.
    pub upload: UploadConfig,

    /// Field extraction rules.
    pub extraction: ExtractionConfig,

    /// OCR configuration.
    pub ocr: OcrConfig,

    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// HTTP server configuration.
    pub server: ServerConfig,
}

/// Limits enforced before any processing happens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Largest accepted payload in bytes.
    pub max_bytes: usize,

    /// Media types accepted for scanning.
    pub allowed_media_types: Vec<MediaType>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: 10 * 1024 * 1024,
            allowed_media_types: MediaType::ALL.to_vec(),
        }
    }
}

/// Keyword lists driving the field extractors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Labels that introduce the receipt total.
    pub amount_keywords: Vec<String>,

    /// Labels that introduce the provider name.
    pub provider_labels: Vec<String>,

    /// Legal-entity suffixes closing an unlabeled company name.
    pub legal_suffixes: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        use crate::receipt::rules::patterns::{AMOUNT_KEYWORDS, LEGAL_SUFFIXES, PROVIDER_LABELS};

        let owned = |words: &[&str]| words.iter().map(|w| w.to_string()).collect();
        Self {
            amount_keywords: owned(AMOUNT_KEYWORDS),
            provider_labels: owned(PROVIDER_LABELS),
            legal_suffixes: owned(LEGAL_SUFFIXES),
        }
    }
}

/// OCR engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,

    /// Keep `[UNK]` tokens in recognized text instead of replacing them with spaces.
    pub keep_unk: bool,

    /// Maximum image dimension (longer side) handed to the engine.
    pub max_image_size: u32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "latin_rec.onnx".to_string(),
            dictionary: "latin_dict.txt".to_string(),
            keep_unk: false,
            max_image_size: 2048,
        }
    }
}

impl OcrConfig {
    /// Get full path to a model file.
    pub fn model_path(&self, model_name: &str) -> PathBuf {
        self.model_dir.join(model_name)
    }

    /// Whether the detection and recognition models are present on disk.
    pub fn models_available(&self) -> bool {
        self.model_path(&self.detection_model).exists()
            && self.model_path(&self.recognition_model).exists()
            && self.model_path(&self.dictionary).exists()
    }
}

/// PDF processing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Try to extract embedded text before falling back to OCR.
    pub prefer_embedded_text: bool,

    /// Minimum text length to consider a page as text-based.
    pub min_text_length: usize,

    /// Read only the first page.
    pub first_page_only: bool,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            prefer_embedded_text: true,
            min_text_length: 50,
            first_page_only: true,
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on.
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
        }
    }
}

impl XpendsConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, XpendsError> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| XpendsError::Config(e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), XpendsError> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| XpendsError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Look up a value by dotted key, e.g. `upload.max_bytes`.
    pub fn get_value(&self, key: &str) -> Result<serde_json::Value, XpendsError> {
        let json = serde_json::to_value(self).map_err(|e| XpendsError::Config(e.to_string()))?;

        let mut current = &json;
        for part in key.split('.') {
            current = current
                .get(part)
                .ok_or_else(|| XpendsError::Config(format!("configuration key not found: {key}")))?;
        }
        Ok(current.clone())
    }

    /// Set a value by dotted key. The value is parsed as JSON and falls back
    /// to a plain string.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<serde_json::Value, XpendsError> {
        let parsed: serde_json::Value = serde_json::from_str(value)
            .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));

        let mut json = serde_json::to_value(&*self).map_err(|e| XpendsError::Config(e.to_string()))?;

        let (parent_path, leaf) = match key.rsplit_once('.') {
            Some((parent, leaf)) => (Some(parent), leaf),
            None => (None, key),
        };

        let mut current = &mut json;
        if let Some(parent_path) = parent_path {
            for part in parent_path.split('.') {
                current = current.get_mut(part).ok_or_else(|| {
                    XpendsError::Config(format!("configuration path not found: {key}"))
                })?;
            }
        }

        let object = current
            .as_object_mut()
            .ok_or_else(|| XpendsError::Config(format!("cannot set value at non-object path: {key}")))?;
        if !object.contains_key(leaf) {
            return Err(XpendsError::Config(format!("configuration key not found: {key}")));
        }
        object.insert(leaf.to_string(), parsed.clone());

        *self = serde_json::from_value(json).map_err(|e| XpendsError::Config(e.to_string()))?;
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = XpendsConfig::default();
        assert_eq!(config.upload.max_bytes, 10_485_760);
        assert_eq!(config.upload.allowed_media_types.len(), 6);
        assert_eq!(
            config.extraction.amount_keywords,
            vec!["total", "monto total", "a pagar", "importe neto", "importe"]
        );
        assert!(config.extraction.legal_suffixes.contains(&"SpA".to_string()));
        assert!(config.pdf.first_page_only);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: XpendsConfig =
            serde_json::from_str(r#"{ "upload": { "max_bytes": 1024 } }"#).unwrap();
        assert_eq!(config.upload.max_bytes, 1024);
        assert_eq!(config.upload.allowed_media_types, MediaType::ALL.to_vec());
        assert_eq!(config.extraction, ExtractionConfig::default());
    }

    #[test]
    fn test_get_and_set_value() {
        let mut config = XpendsConfig::default();
        assert_eq!(config.get_value("upload.max_bytes").unwrap(), serde_json::json!(10_485_760));

        config.set_value("upload.max_bytes", "2048").unwrap();
        assert_eq!(config.upload.max_bytes, 2048);

        config.set_value("server.bind", "0.0.0.0:9000").unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:9000");

        assert!(config.get_value("upload.missing").is_err());
        assert!(config.set_value("upload.missing", "1").is_err());
        assert!(config.set_value("upload.max_bytes", "\"lots\"").is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join(format!("xpends-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");

        let mut config = XpendsConfig::default();
        config.pdf.min_text_length = 10;
        config.save(&path).unwrap();

        let loaded = XpendsConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
