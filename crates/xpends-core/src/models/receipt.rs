//! Extraction result returned for every scanned receipt.

use serde::{Deserialize, Serialize};

/// Fields recovered from one receipt.
///
/// Absent fields mean "not found". An amount of `0.0` is a real value and
/// is distinct from `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Monetary total in pesos.
    pub amount: Option<f64>,

    /// Chilean tax identifier exactly as printed.
    #[serde(rename = "rut")]
    pub tax_id: Option<String>,

    /// Merchant or issuer name.
    pub provider_name: Option<String>,

    /// Text the fields were extracted from.
    pub raw_text: String,
}

impl ExtractionResult {
    /// A result with no recovered fields.
    pub fn empty(raw_text: impl Into<String>) -> Self {
        Self {
            amount: None,
            tax_id: None,
            provider_name: None,
            raw_text: raw_text.into(),
        }
    }

    /// Number of optional fields that were recovered.
    pub fn found_count(&self) -> usize {
        [
            self.amount.is_some(),
            self.tax_id.is_some(),
            self.provider_name.is_some(),
        ]
        .into_iter()
        .filter(|found| *found)
        .count()
    }

    /// Names of the optional fields that were not recovered.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.amount.is_none() {
            missing.push("amount");
        }
        if self.tax_id.is_none() {
            missing.push("rut");
        }
        if self.provider_name.is_none() {
            missing.push("provider_name");
        }
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_serializes_to_response_shape() {
        let result = ExtractionResult {
            amount: Some(5500.0),
            tax_id: Some("76.123.456-7".to_string()),
            provider_name: None,
            raw_text: "Total $5.500".to_string(),
        };

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "amount": 5500.0,
                "rut": "76.123.456-7",
                "provider_name": null,
                "raw_text": "Total $5.500",
            })
        );
    }

    #[test]
    fn test_zero_amount_is_found() {
        let mut result = ExtractionResult::empty("");
        assert_eq!(result.found_count(), 0);
        assert_eq!(result.missing_fields(), vec!["amount", "rut", "provider_name"]);

        result.amount = Some(0.0);
        assert_eq!(result.found_count(), 1);
        assert_eq!(result.missing_fields(), vec!["rut", "provider_name"]);
    }
}
