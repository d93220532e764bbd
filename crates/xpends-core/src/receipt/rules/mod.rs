//! Rule-based field extractors for Chilean receipts.

pub mod amounts;
pub mod patterns;
pub mod provider;
pub mod rut;

pub use amounts::{extract_amount, parse_clp_amount, AmountExtractor};
pub use provider::{extract_provider_name, ProviderExtractor};
pub use rut::{extract_rut, RutExtractor};

use crate::error::ExtractionError;

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text. This is the first candidate in
    /// precedence order.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all candidates in precedence order.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// A candidate value together with where it was found.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Byte range of the match in the searched text.
    pub position: (usize, usize),
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, m: regex::Match<'_>) -> Self {
        Self {
            value,
            position: (m.start(), m.end()),
            source: m.as_str().to_string(),
        }
    }
}

/// Reject empty keyword lists before they are compiled into patterns.
pub(crate) fn non_empty<S: AsRef<str>>(rule: &str, words: &[S]) -> Result<(), ExtractionError> {
    if words.is_empty() || words.iter().any(|w| w.as_ref().trim().is_empty()) {
        return Err(ExtractionError::InvalidRules {
            rule: rule.to_string(),
            reason: "keyword list must contain only non-empty entries".to_string(),
        });
    }
    Ok(())
}

pub(crate) fn invalid(rule: &str, err: regex::Error) -> ExtractionError {
    ExtractionError::InvalidRules {
        rule: rule.to_string(),
        reason: err.to_string(),
    }
}
