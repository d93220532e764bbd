//! Receipt scanning pipeline: guard, text acquisition, field extraction.

use std::time::Instant;

use tracing::{info, warn};

use crate::error::{ScanError, XpendsError};
use crate::guard::UploadGuard;
use crate::models::config::XpendsConfig;
use crate::models::document::RawDocument;
use crate::models::receipt::ExtractionResult;
use crate::ocr::TextRecognizer;
use crate::receipt::ReceiptParser;

/// Turns an uploaded receipt into an [`ExtractionResult`].
pub struct ReceiptScanner<R> {
    guard: UploadGuard,
    recognizer: R,
    parser: ReceiptParser,
}

impl<R: TextRecognizer> ReceiptScanner<R> {
    /// Build a scanner from configuration and a text source.
    pub fn new(config: &XpendsConfig, recognizer: R) -> Result<Self, XpendsError> {
        Ok(Self {
            guard: UploadGuard::new(&config.upload),
            recognizer,
            parser: ReceiptParser::from_config(&config.extraction)?,
        })
    }

    pub fn guard(&self) -> &UploadGuard {
        &self.guard
    }

    /// Validate, recognize and extract.
    ///
    /// A document whose text yields no fields is a success with every field
    /// absent; only guard rejections and recognizer failures are errors.
    pub fn scan(&self, document: &RawDocument) -> Result<ExtractionResult, ScanError> {
        let start = Instant::now();
        let media_type = self.guard.check(document).inspect_err(|e| {
            warn!(media_type = %document.media_type, size = document.len(), "Upload rejected: {}", e);
        })?;

        let text = self
            .recognizer
            .recognize(&document.bytes, media_type)
            .inspect_err(|e| warn!(%media_type, "Text recognition failed: {}", e))?;

        let result = self.parser.parse(&text);
        info!(
            %media_type,
            size = document.len(),
            found = result.found_count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Scanned receipt"
        );

        Ok(result)
    }
}
