//! Amount extraction for Chilean receipts.
//!
//! Chilean pesos have no fractional units and use `.` as the thousands
//! separator. Amounts are only taken after a trigger keyword such as
//! `total` or `a pagar`. The whole text is searched for a grouped amount
//! (`5.500`) before any plain digit run (`9500`) is considered.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::trace;

use super::patterns::{amount_pattern, AMOUNT_KEYWORDS, GROUPED_AMOUNT, PLAIN_AMOUNT};
use super::{invalid, non_empty, ExtractionMatch, FieldExtractor};
use crate::error::ExtractionError;

lazy_static! {
    static ref DEFAULT_EXTRACTOR: AmountExtractor = AmountExtractor::default();
}

/// Amount field extractor.
#[derive(Debug, Clone)]
pub struct AmountExtractor {
    grouped: Regex,
    plain: Regex,
}

impl AmountExtractor {
    /// Build an extractor triggered by the given keywords.
    pub fn new<S: AsRef<str>>(keywords: &[S]) -> Result<Self, ExtractionError> {
        non_empty("amount", keywords)?;
        Ok(Self {
            grouped: amount_pattern(keywords, GROUPED_AMOUNT).map_err(|e| invalid("amount", e))?,
            plain: amount_pattern(keywords, PLAIN_AMOUNT).map_err(|e| invalid("amount", e))?,
        })
    }

    /// Candidates of one pass, in document order, skipping malformed tokens.
    fn pass<'t>(&'t self, re: &'t Regex, text: &'t str) -> impl Iterator<Item = ExtractionMatch<f64>> + 't {
        re.captures_iter(text).filter_map(|caps| {
            let full = caps.get(0)?;
            match parse_clp_amount(&caps[1]) {
                Some(amount) => Some(ExtractionMatch::new(amount, full)),
                None => {
                    trace!("Skipping malformed amount token {:?}", &caps[1]);
                    None
                }
            }
        })
    }
}

impl Default for AmountExtractor {
    fn default() -> Self {
        Self::new(AMOUNT_KEYWORDS).expect("default amount keywords compile")
    }
}

impl FieldExtractor for AmountExtractor {
    type Output = ExtractionMatch<f64>;

    /// Positions refer to the lowercased text.
    fn extract(&self, text: &str) -> Option<Self::Output> {
        let lowered = text.to_lowercase();
        self.pass(&self.grouped, &lowered)
            .next()
            .or_else(|| self.pass(&self.plain, &lowered).next())
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let lowered = text.to_lowercase();
        let mut results: Vec<Self::Output> = self.pass(&self.grouped, &lowered).collect();

        // A plain run behind a keyword that already produced a grouped
        // amount is a fragment of that amount.
        for candidate in self.pass(&self.plain, &lowered) {
            if results.iter().all(|r| r.position.0 != candidate.position.0) {
                results.push(candidate);
            }
        }

        results
    }
}

/// Extract the receipt total from text.
pub fn extract_amount(text: &str) -> Option<f64> {
    DEFAULT_EXTRACTOR.extract(text).map(|m| m.value)
}

/// Parse a peso amount such as `180.784` or `9500`.
///
/// Every `.` is a thousands separator. Returns `None` for anything that is
/// not a digit string with a finite value.
pub fn parse_clp_amount(s: &str) -> Option<f64> {
    let digits: String = s.chars().filter(|c| *c != '.').collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    digits.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_clp_amount() {
        assert_eq!(parse_clp_amount("5.500"), Some(5500.0));
        assert_eq!(parse_clp_amount("180.784"), Some(180784.0));
        assert_eq!(parse_clp_amount("1.234.567"), Some(1234567.0));
        assert_eq!(parse_clp_amount("9500"), Some(9500.0));
        assert_eq!(parse_clp_amount("00"), Some(0.0));
        assert_eq!(parse_clp_amount(""), None);
        assert_eq!(parse_clp_amount("12a"), None);
        assert_eq!(parse_clp_amount(&"9".repeat(400)), None);
    }

    #[test]
    fn test_total_grouped() {
        assert_eq!(extract_amount("Total $5.500"), Some(5500.0));
        assert_eq!(extract_amount("Monto Total: 12.300"), Some(12300.0));
        assert_eq!(extract_amount("Importe: 3.750"), Some(3750.0));
        assert_eq!(extract_amount("IMPORTE NETO 180.784"), Some(180784.0));
    }

    #[test]
    fn test_subtotal_is_not_a_trigger() {
        let text = "Subtotal $8.000\nA Pagar $9.500";
        assert_eq!(extract_amount(text), Some(9500.0));
    }

    #[test]
    fn test_plain_digits_fallback() {
        assert_eq!(extract_amount("TOTAL: 9500"), Some(9500.0));
        assert_eq!(extract_amount("total 7"), None);
    }

    #[test]
    fn test_grouped_beats_earlier_plain() {
        // The plain run comes first in the document, but grouped amounts are
        // searched across the whole text before falling back.
        let text = "Total 4500\nDescuento 0\nA pagar $4.050";
        assert_eq!(extract_amount(text), Some(4050.0));
    }

    #[test]
    fn test_boleta_with_line_items() {
        let text = r#"
BOLETA ELECTRONICA N° 004521
Lechuga           $1.200
Pan Integral       $2.500
Leche Entera       $1.800

Total             $5.500
"#;
        assert_eq!(extract_amount(text), Some(5500.0));
    }

    #[test]
    fn test_zero_is_found() {
        assert_eq!(extract_amount("Total: 00"), Some(0.0));
    }

    #[test]
    fn test_malformed_token_is_skipped() {
        let huge = "9".repeat(400);
        let text = format!("Total {huge}\nA pagar 1500");
        assert_eq!(extract_amount(&text), Some(1500.0));
    }

    #[test]
    fn test_not_found() {
        assert_eq!(extract_amount("Este texto no tiene RUT ni monto ni razón social."), None);
        assert_eq!(extract_amount(""), None);
    }

    #[test]
    fn test_extract_all_orders_passes() {
        let extractor = AmountExtractor::default();
        let results = extractor.extract_all("Total 4500\nA pagar $4.050");
        let values: Vec<f64> = results.iter().map(|m| m.value).collect();
        assert_eq!(values, vec![4050.0, 4500.0]);

        // "12" behind the same keyword as "12.300" is not repeated.
        let results = extractor.extract_all("Monto Total: 12.300");
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_custom_keywords() {
        let extractor = AmountExtractor::new(&["Neto"]).unwrap();
        assert_eq!(extractor.extract("NETO 1.000").map(|m| m.value), Some(1000.0));
        assert_eq!(extractor.extract("Total 1.000"), None);

        assert!(AmountExtractor::new::<&str>(&[]).is_err());
        assert!(AmountExtractor::new(&["  "]).is_err());
    }
}
