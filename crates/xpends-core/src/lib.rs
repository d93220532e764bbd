//! Core library for Chilean receipt scanning.
//!
//! This crate provides:
//! - Upload validation (media type allow-list and size limit)
//! - Text acquisition from images and PDFs using pure Rust OCR
//! - Receipt field extraction (RUT, total amount, provider name)
//! - A scanning pipeline tying the stages together

pub mod error;
pub mod guard;
pub mod models;
pub mod ocr;
#[cfg(feature = "native")]
pub mod pdf;
pub mod receipt;
pub mod scanner;

pub use error::{ExtractionError, GuardError, OcrError, PdfError, ScanError, XpendsError};
pub use guard::UploadGuard;
pub use models::config::XpendsConfig;
pub use models::document::{MediaType, RawDocument};
pub use models::receipt::ExtractionResult;
pub use ocr::TextRecognizer;
#[cfg(feature = "native")]
pub use ocr::LocalRecognizer;
pub use receipt::{extract, ReceiptParser};
pub use scanner::ReceiptScanner;
