//! RUT (Chilean tax identifier) extraction.

use super::patterns::RUT_PATTERN;
use super::{ExtractionMatch, FieldExtractor};

/// RUT field extractor.
///
/// Returns the identifier verbatim, keeping the dots and the case of the
/// check character. When several are present the leftmost one wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct RutExtractor;

impl RutExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl FieldExtractor for RutExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        RUT_PATTERN
            .find(text)
            .map(|m| ExtractionMatch::new(m.as_str().to_string(), m))
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        RUT_PATTERN
            .find_iter(text)
            .map(|m| ExtractionMatch::new(m.as_str().to_string(), m))
            .collect()
    }
}

/// Extract the first RUT from text.
pub fn extract_rut(text: &str) -> Option<String> {
    RutExtractor::new().extract(text).map(|m| m.value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_rut_with_dots() {
        let text = "BOLETA ELECTRONICA\nRUT: 76.123.456-7\nTotal $5.500";
        assert_eq!(extract_rut(text), Some("76.123.456-7".to_string()));
    }

    #[test]
    fn test_extract_rut_without_dots() {
        let text = "RUT del emisor: 76123456-7 en el documento";
        assert_eq!(extract_rut(text), Some("76123456-7".to_string()));
    }

    #[test]
    fn test_extract_rut_check_letter_case_preserved() {
        assert_eq!(extract_rut("RUT Emisor: 96543210-K"), Some("96543210-K".to_string()));
        assert_eq!(extract_rut("rut 9.654.321-k."), Some("9.654.321-k".to_string()));
    }

    #[test]
    fn test_extract_rut_first_wins() {
        let text = "Emisor: 12.345.678-9  Receptor: 98.765.432-1";
        assert_eq!(extract_rut(text), Some("12.345.678-9".to_string()));

        let all = RutExtractor::new().extract_all(text);
        let values: Vec<&str> = all.iter().map(|m| m.value.as_str()).collect();
        assert_eq!(values, vec!["12.345.678-9", "98.765.432-1"]);
        assert!(all[0].position.0 < all[1].position.0);
    }

    #[test]
    fn test_extract_rut_not_found() {
        assert_eq!(extract_rut("Este texto no tiene RUT ni monto ni razón social."), None);
        assert_eq!(extract_rut("Folio 123456789-0123"), None);
        assert_eq!(extract_rut(""), None);
    }
}
