//! Error types for the xpends-core library.

use thiserror::Error;

/// Main error type for the xpends library.
#[derive(Error, Debug)]
pub enum XpendsError {
    /// Upload rejected before processing.
    #[error("upload rejected: {0}")]
    Guard(#[from] GuardError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Extraction rule error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Image processing error.
    #[cfg(feature = "native")]
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Reasons an upload is refused by the input guard.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GuardError {
    /// The declared media type is not on the allow-list.
    #[error("Unsupported file type '{0}'. Upload an image or PDF.")]
    UnsupportedMediaType(String),

    /// The payload is larger than the configured maximum.
    #[error("File too large. Maximum is {}.", size_limit(.max))]
    PayloadTooLarge { size: usize, max: usize },
}

/// Whole mebibytes as `MB`, anything else in bytes.
fn size_limit(max: &usize) -> String {
    const MIB: usize = 1024 * 1024;
    let max = *max;
    if max >= MIB && max % MIB == 0 {
        format!("{} MB", max / MIB)
    } else {
        format!("{} bytes", max)
    }
}

/// Errors related to text acquisition.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// The payload could not be decoded as an image.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// The payload could not be read as a PDF.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors raised while compiling extraction rules.
///
/// Extraction itself never fails; a field that cannot be recovered is
/// reported as absent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// A rule list is empty or does not compile.
    #[error("invalid {rule} rules: {reason}")]
    InvalidRules { rule: String, reason: String },
}

/// Failure of a single scan request.
///
/// Only guard rejections and OCR failures surface to the caller; everything
/// after text acquisition degrades to absent fields.
#[derive(Error, Debug)]
pub enum ScanError {
    /// Upload rejected by the input guard.
    #[error(transparent)]
    Guard(#[from] GuardError),

    /// The OCR provider failed.
    #[error("OCR service error: {0}")]
    Ocr(#[from] OcrError),
}

impl ScanError {
    /// HTTP status the upload handler answers with.
    pub fn status_code(&self) -> u16 {
        match self {
            ScanError::Guard(GuardError::UnsupportedMediaType(_)) => 415,
            ScanError::Guard(GuardError::PayloadTooLarge { .. }) => 413,
            ScanError::Ocr(_) => 502,
        }
    }

    /// Human readable message returned as the response `detail`.
    pub fn detail(&self) -> String {
        self.to_string()
    }
}
