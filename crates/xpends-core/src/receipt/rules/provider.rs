//! Provider (merchant/issuer) name extraction.

use lazy_static::lazy_static;
use regex::Regex;

use super::patterns::{
    labeled_provider_pattern, suffixed_provider_pattern, LEGAL_SUFFIXES, PROVIDER_LABELS,
};
use super::{invalid, non_empty, ExtractionMatch, FieldExtractor};
use crate::error::ExtractionError;

lazy_static! {
    static ref DEFAULT_EXTRACTOR: ProviderExtractor = ProviderExtractor::default();
}

/// Provider name extractor.
///
/// A labeled field (`Razón Social: ...`) is preferred. Without one, an
/// uppercase run ending in a legal-entity suffix (`... LTDA`) is used.
#[derive(Debug, Clone)]
pub struct ProviderExtractor {
    labeled: Regex,
    suffixed: Regex,
}

impl ProviderExtractor {
    pub fn new<L, S>(labels: &[L], suffixes: &[S]) -> Result<Self, ExtractionError>
    where
        L: AsRef<str>,
        S: AsRef<str>,
    {
        non_empty("provider label", labels)?;
        non_empty("legal suffix", suffixes)?;
        Ok(Self {
            labeled: labeled_provider_pattern(labels).map_err(|e| invalid("provider label", e))?,
            suffixed: suffixed_provider_pattern(suffixes)
                .map_err(|e| invalid("legal suffix", e))?,
        })
    }

    fn candidates<'t>(&'t self, re: &'t Regex, text: &'t str) -> impl Iterator<Item = ExtractionMatch<String>> + 't {
        re.captures_iter(text).filter_map(|caps| {
            let span = caps.get(1)?;
            let name = span.as_str().trim();
            (!name.is_empty()).then(|| ExtractionMatch::new(name.to_string(), span))
        })
    }
}

impl Default for ProviderExtractor {
    fn default() -> Self {
        Self::new(PROVIDER_LABELS, LEGAL_SUFFIXES).expect("default provider rules compile")
    }
}

impl FieldExtractor for ProviderExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.candidates(&self.labeled, text)
            .next()
            .or_else(|| self.candidates(&self.suffixed, text).next())
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results: Vec<Self::Output> = self.candidates(&self.labeled, text).collect();
        for candidate in self.candidates(&self.suffixed, text) {
            if results.iter().all(|r| r.value != candidate.value) {
                results.push(candidate);
            }
        }
        results
    }
}

/// Extract the provider name from text.
pub fn extract_provider_name(text: &str) -> Option<String> {
    DEFAULT_EXTRACTOR.extract(text).map(|m| m.value)
}
