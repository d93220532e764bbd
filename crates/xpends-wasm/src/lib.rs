//! WASM bindings for Chilean receipt field extraction.
//!
//! OCR stays on the host page; these bindings take the recognized text and
//! return the extracted fields.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use xpends_core::models::config::ExtractionConfig;
use xpends_core::{ExtractionResult, MediaType, ReceiptParser};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Extract `{ amount, rut, provider_name, raw_text }` from receipt text.
#[wasm_bindgen]
pub fn extract_receipt(text: &str) -> Result<JsValue, JsValue> {
    to_js(&xpends_core::extract(text))
}

/// First RUT in the text, verbatim.
#[wasm_bindgen]
pub fn extract_rut(text: &str) -> Option<String> {
    xpends_core::receipt::rules::extract_rut(text)
}

/// Keyword-anchored total in pesos.
#[wasm_bindgen]
pub fn extract_amount(text: &str) -> Option<f64> {
    xpends_core::receipt::rules::extract_amount(text)
}

/// Labeled or legal-suffix provider name.
#[wasm_bindgen]
pub fn extract_provider_name(text: &str) -> Option<String> {
    xpends_core::receipt::rules::extract_provider_name(text)
}

/// Whether an upload with this MIME label would be accepted.
#[wasm_bindgen]
pub fn is_supported_media_type(mime: &str) -> bool {
    MediaType::from_mime(mime).is_some()
}

/// Receipt extractor with custom keyword lists.
#[wasm_bindgen]
pub struct ReceiptExtractor {
    parser: ReceiptParser,
}

#[wasm_bindgen]
impl ReceiptExtractor {
    /// Create an extractor with the default rules.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            parser: ReceiptParser::new(),
        }
    }

    /// Create an extractor from custom keyword lists.
    #[wasm_bindgen(js_name = withRules)]
    pub fn with_rules(
        amount_keywords: Vec<String>,
        provider_labels: Vec<String>,
        legal_suffixes: Vec<String>,
    ) -> Result<ReceiptExtractor, JsValue> {
        let config = ExtractionConfig {
            amount_keywords,
            provider_labels,
            legal_suffixes,
        };
        let parser =
            ReceiptParser::from_config(&config).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Self { parser })
    }

    /// Extract fields from text.
    #[wasm_bindgen]
    pub fn extract(&self, text: &str) -> Result<JsValue, JsValue> {
        to_js(&self.parser.parse(text))
    }
}

impl Default for ReceiptExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Absent fields become `null`, matching the HTTP response.
fn to_js(result: &ExtractionResult) -> Result<JsValue, JsValue> {
    result
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}
