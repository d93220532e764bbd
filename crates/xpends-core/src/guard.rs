//! Upload validation performed before any processing.

use tracing::debug;

use crate::error::GuardError;
use crate::models::config::UploadConfig;
use crate::models::document::{MediaType, RawDocument};

/// Checks declared media type and payload size against the configured limits.
#[derive(Debug, Clone)]
pub struct UploadGuard {
    allowed: Vec<MediaType>,
    max_bytes: usize,
}

impl UploadGuard {
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            allowed: config.allowed_media_types.clone(),
            max_bytes: config.max_bytes,
        }
    }

    /// Largest accepted payload in bytes.
    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Validate the declared media type label.
    pub fn check_media_type(&self, label: &str) -> Result<MediaType, GuardError> {
        MediaType::from_mime(label)
            .filter(|media_type| self.allowed.contains(media_type))
            .ok_or_else(|| GuardError::UnsupportedMediaType(label.to_string()))
    }

    /// Validate a payload length. A length equal to the maximum is accepted.
    pub fn check_size(&self, size: usize) -> Result<(), GuardError> {
        if size > self.max_bytes {
            return Err(GuardError::PayloadTooLarge {
                size,
                max: self.max_bytes,
            });
        }
        Ok(())
    }

    /// Validate a whole document, media type first.
    pub fn check(&self, document: &RawDocument) -> Result<MediaType, GuardError> {
        let media_type = self.check_media_type(&document.media_type)?;
        self.check_size(document.len())?;

        debug!("Accepted {} upload of {} bytes", media_type, document.len());
        Ok(media_type)
    }
}

impl Default for UploadGuard {
    fn default() -> Self {
        Self::new(&UploadConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MAX: usize = 10 * 1024 * 1024;

    #[test]
    fn test_accepts_allowed_types() {
        let guard = UploadGuard::default();
        for media_type in MediaType::ALL {
            let doc = RawDocument::new(b"data".to_vec(), media_type.as_mime());
            assert_eq!(guard.check(&doc), Ok(media_type));
        }
    }

    #[test]
    fn test_rejects_unsupported_type() {
        let guard = UploadGuard::default();
        let doc = RawDocument::new(b"hello".to_vec(), "text/plain");
        assert_eq!(
            guard.check(&doc),
            Err(GuardError::UnsupportedMediaType("text/plain".to_string()))
        );
    }

    #[test]
    fn test_size_limit_boundary() {
        let guard = UploadGuard::default();
        assert_eq!(guard.check_size(MAX), Ok(()));
        assert_eq!(
            guard.check_size(MAX + 1),
            Err(GuardError::PayloadTooLarge {
                size: MAX + 1,
                max: MAX
            })
        );
    }

    #[test]
    fn test_media_type_checked_before_size() {
        let guard = UploadGuard::default();
        let doc = RawDocument::new(vec![0u8; MAX + 1], "text/plain");
        assert!(matches!(
            guard.check(&doc),
            Err(GuardError::UnsupportedMediaType(_))
        ));
    }

    #[test]
    fn test_configured_allow_list() {
        let guard = UploadGuard::new(&UploadConfig {
            max_bytes: 4,
            allowed_media_types: vec![MediaType::Pdf],
        });

        assert!(guard.check(&RawDocument::new(b"%PDF".to_vec(), "application/pdf")).is_ok());
        assert!(guard.check(&RawDocument::new(b"png".to_vec(), "image/png")).is_err());
        assert!(guard.check(&RawDocument::new(b"%PDF-".to_vec(), "application/pdf")).is_err());
    }
}
