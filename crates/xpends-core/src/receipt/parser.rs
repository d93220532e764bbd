//! Receipt parser combining the RUT, amount, and provider extractors.

use lazy_static::lazy_static;
use tracing::{debug, info};

use crate::error::ExtractionError;
use crate::models::config::ExtractionConfig;
use crate::models::receipt::ExtractionResult;

use super::rules::{AmountExtractor, FieldExtractor, ProviderExtractor, RutExtractor};

lazy_static! {
    static ref DEFAULT_PARSER: ReceiptParser = ReceiptParser::default();
}

/// Extract receipt fields from OCR text using the default rules.
///
/// Pure and infallible: fields that cannot be recovered are `None`, and
/// the input is always echoed back as `raw_text`.
pub fn extract(text: &str) -> ExtractionResult {
    DEFAULT_PARSER.parse(text)
}

/// Parser holding one compiled rule set.
///
/// Holds no mutable state, so one instance can be shared across threads
/// and requests.
#[derive(Debug, Clone)]
pub struct ReceiptParser {
    rut: RutExtractor,
    amount: AmountExtractor,
    provider: ProviderExtractor,
}

impl ReceiptParser {
    /// Create a parser with the default Chilean rules.
    pub fn new() -> Self {
        Self {
            rut: RutExtractor::new(),
            amount: AmountExtractor::default(),
            provider: ProviderExtractor::default(),
        }
    }

    /// Compile a parser from configured keyword lists.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self, ExtractionError> {
        Ok(Self {
            rut: RutExtractor::new(),
            amount: AmountExtractor::new(&config.amount_keywords)?,
            provider: ProviderExtractor::new(&config.provider_labels, &config.legal_suffixes)?,
        })
    }

    /// Run every extractor over the text and assemble the result.
    pub fn parse(&self, text: &str) -> ExtractionResult {
        info!("Extracting receipt fields from {} characters of text", text.chars().count());

        let result = ExtractionResult {
            amount: self.amount.extract(text).map(|m| m.value),
            tax_id: self.rut.extract(text).map(|m| m.value),
            provider_name: self.provider.extract(text).map(|m| m.value),
            raw_text: text.to_string(),
        };

        debug!(
            amount = ?result.amount,
            rut = ?result.tax_id,
            provider_name = ?result.provider_name,
            "Extracted {} of 3 fields",
            result.found_count()
        );

        result
    }
}

impl Default for ReceiptParser {
    fn default() -> Self {
        Self::new()
    }
}
