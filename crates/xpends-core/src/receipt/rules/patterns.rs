//! Regex patterns for Chilean receipt extraction.

use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};

/// Labels that introduce the receipt total.
pub const AMOUNT_KEYWORDS: &[&str] = &["total", "monto total", "a pagar", "importe neto", "importe"];

/// Labels that introduce the provider name.
pub const PROVIDER_LABELS: &[&str] = &["razón social", "razon social", "nombre", "emisor"];

/// Legal-entity suffixes of Chilean companies (matched case-sensitively).
pub const LEGAL_SUFFIXES: &[&str] = &["LTDA", "S.A.", "S.P.A.", "EIRL", "SpA"];

/// Peso amount with `.` thousands separators, e.g. `5.500` or `180.784`.
pub const GROUPED_AMOUNT: &str = r"([0-9]{1,3}(?:\.[0-9]{3})+)";

/// Peso amount written without separators, e.g. `9500`.
pub const PLAIN_AMOUNT: &str = r"([0-9]{2,})";

/// Uppercase letters accepted at the start of a provider name.
const UPPERCASE: &str = "A-ZÁÉÍÓÚÑ";

const MAX_PATTERN_SIZE: usize = 1 << 20;

lazy_static! {
    // RUT: XX.XXX.XXX-X or XXXXXXXX-X, check digit may be K
    pub static ref RUT_PATTERN: Regex = Regex::new(
        r"\b\d{1,2}\.?\d{3}\.?\d{3}-[\dkK]\b"
    ).unwrap();
}

/// Alternation of regex-escaped words, in the given order.
pub fn alternation<S: AsRef<str>>(words: &[S]) -> String {
    words
        .iter()
        .map(|w| regex::escape(w.as_ref()))
        .collect::<Vec<_>>()
        .join("|")
}

/// Keyword followed by an amount, matched against lowercased text.
///
/// Whitespace, `:` and `$` may separate the keyword from the number. The
/// keyword must not be preceded by a word character, so `subtotal` does not
/// trigger on `total`.
pub fn amount_pattern<S: AsRef<str>>(keywords: &[S], number: &str) -> Result<Regex, regex::Error> {
    let lowered: Vec<String> = keywords.iter().map(|k| k.as_ref().to_lowercase()).collect();
    build(&format!(r"\b(?:{})[\s:$]*{}", alternation(&lowered), number))
}

/// `Label: Name` on a single line. The label is case-insensitive, the name
/// must start with an uppercase letter.
pub fn labeled_provider_pattern<S: AsRef<str>>(labels: &[S]) -> Result<Regex, regex::Error> {
    build(&format!(
        r"(?i:{})[:\s]+([{UPPERCASE}][^\n]{{3,60}})",
        alternation(labels)
    ))
}

/// Uppercase run ending in a legal-entity suffix, e.g. `CLINICA ALEMANA LTDA`.
pub fn suffixed_provider_pattern<S: AsRef<str>>(suffixes: &[S]) -> Result<Regex, regex::Error> {
    build(&format!(
        r"([{UPPERCASE}]{{2,}}[^\n]{{0,55}}(?:{}))",
        alternation(suffixes)
    ))
}

fn build(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).size_limit(MAX_PATTERN_SIZE).build()
}
