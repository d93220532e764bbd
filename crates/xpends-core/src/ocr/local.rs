//! On-device text acquisition for images and PDFs.

use std::sync::mpsc::{self, Sender};
use std::thread;

use image::{DynamicImage, ImageFormat};
use tracing::{debug, info, warn};

use super::{PureOcrEngine, TextRecognizer};
use crate::error::OcrError;
use crate::models::config::{OcrConfig, PdfConfig};
use crate::models::document::MediaType;
use crate::pdf::{PdfExtractor, PdfProcessor, PdfType};

/// Recognizer that runs OCR locally and reads embedded PDF text.
///
/// Without OCR models it still serves PDFs that carry a text layer; image
/// uploads then fail with [`OcrError::ModelLoad`].
pub struct LocalRecognizer {
    worker: Option<OcrWorker>,
    pdf: PdfConfig,
}

impl LocalRecognizer {
    /// Load the OCR models named in `ocr`.
    pub fn new(ocr: OcrConfig, pdf: PdfConfig) -> Result<Self, OcrError> {
        Ok(Self {
            worker: Some(OcrWorker::spawn(ocr)?),
            pdf,
        })
    }

    /// A recognizer limited to embedded PDF text.
    pub fn text_only(pdf: PdfConfig) -> Self {
        Self { worker: None, pdf }
    }

    /// Load models when present, otherwise fall back to [`Self::text_only`].
    pub fn from_config(ocr: OcrConfig, pdf: PdfConfig) -> Self {
        if !ocr.models_available() {
            warn!(
                "OCR models not found in {}, only PDFs with embedded text can be read",
                ocr.model_dir.display()
            );
            return Self::text_only(pdf);
        }

        match Self::new(ocr, pdf.clone()) {
            Ok(recognizer) => recognizer,
            Err(e) => {
                warn!("Failed to load OCR models: {}", e);
                Self::text_only(pdf)
            }
        }
    }

    /// Whether image OCR is available.
    pub fn has_ocr(&self) -> bool {
        self.worker.is_some()
    }

    fn ocr_image(&self, image: DynamicImage) -> Result<String, OcrError> {
        self.worker
            .as_ref()
            .ok_or_else(|| OcrError::ModelLoad("no OCR models loaded".to_string()))?
            .recognize(image)
    }

    fn recognize_image(&self, bytes: &[u8], media_type: MediaType) -> Result<String, OcrError> {
        if !self.has_ocr() {
            return Err(OcrError::ModelLoad("no OCR models loaded".to_string()));
        }

        let image = match image_format(media_type) {
            Some(format) => image::load_from_memory_with_format(bytes, format),
            None => image::load_from_memory(bytes),
        }
        .map_err(|e| OcrError::InvalidImage(e.to_string()))?;

        self.ocr_image(image)
    }

    fn recognize_pdf(&self, bytes: &[u8]) -> Result<String, OcrError> {
        let extractor = PdfExtractor::from_bytes(bytes)?;
        let last_page = if self.pdf.first_page_only {
            1
        } else {
            extractor.page_count()
        };

        let mut pages = Vec::new();
        for page in 1..=last_page {
            let text = self.recognize_pdf_page(&extractor, page)?;
            if !text.trim().is_empty() {
                pages.push(text);
            }
        }

        Ok(pages.join("\n\n"))
    }

    fn recognize_pdf_page(&self, extractor: &PdfExtractor, page: u32) -> Result<String, OcrError> {
        let embedded = if self.pdf.prefer_embedded_text {
            extractor.extract_page_text(page).unwrap_or_else(|e| {
                debug!("No embedded text on page {}: {}", page, e);
                String::new()
            })
        } else {
            String::new()
        };

        let text_len = embedded.trim().chars().count();
        if text_len >= self.pdf.min_text_length {
            debug!("Page {}: using {} chars of embedded text", page, text_len);
            return Ok(embedded);
        }

        if !self.has_ocr() {
            warn!("Page {} has too little embedded text and no OCR models are loaded", page);
            return Ok(embedded);
        }

        let images = extractor.extract_images(page)?;
        let image_count = images.len();
        match PdfType::classify(text_len, image_count, self.pdf.min_text_length) {
            PdfType::Image => {}
            pdf_type => {
                debug!("Page {} classified as {:?}, keeping embedded text", page, pdf_type);
                return Ok(embedded);
            }
        }

        let mut texts = Vec::new();
        for (i, image) in images.into_iter().enumerate() {
            let text = self.ocr_image(image)?;
            if text.trim().is_empty() {
                debug!("No text detected in image {} of page {}", i + 1, page);
            } else {
                texts.push(text);
            }
        }

        info!("OCR read {} of {} images on page {}", texts.len(), image_count, page);
        Ok(texts.join("\n\n"))
    }
}

impl TextRecognizer for LocalRecognizer {
    fn recognize(&self, bytes: &[u8], media_type: MediaType) -> Result<String, OcrError> {
        if media_type.is_pdf() {
            self.recognize_pdf(bytes)
        } else {
            self.recognize_image(bytes, media_type)
        }
    }
}

/// One OCR request and the channel its answer goes back on.
struct OcrJob {
    image: DynamicImage,
    reply: Sender<Result<String, OcrError>>,
}

/// Dedicated thread owning the OCR engine.
///
/// The engine cannot move between threads, so it is built on the worker and
/// callers only hold the job sender. Jobs are served one at a time. The
/// thread exits once every sender is dropped.
struct OcrWorker {
    jobs: Sender<OcrJob>,
}

impl OcrWorker {
    fn spawn(config: OcrConfig) -> Result<Self, OcrError> {
        let (jobs, queue) = mpsc::channel::<OcrJob>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), OcrError>>();

        thread::Builder::new()
            .name("xpends-ocr".to_string())
            .spawn(move || {
                let engine = match PureOcrEngine::from_config(config) {
                    Ok(engine) => engine,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));

                for job in queue {
                    let result = engine.process(&job.image).map(|r| r.text);
                    // The caller may have given up waiting.
                    let _ = job.reply.send(result);
                }
                debug!("OCR worker stopped");
            })
            .map_err(|e| OcrError::ModelLoad(format!("failed to start OCR worker: {}", e)))?;

        ready_rx
            .recv()
            .map_err(|_| OcrError::ModelLoad("OCR worker exited during startup".to_string()))??;

        Ok(Self { jobs })
    }

    fn recognize(&self, image: DynamicImage) -> Result<String, OcrError> {
        let (reply, answer) = mpsc::channel();
        self.jobs
            .send(OcrJob { image, reply })
            .map_err(|_| OcrError::Recognition("OCR worker is not running".to_string()))?;

        answer
            .recv()
            .map_err(|_| OcrError::Recognition("OCR worker stopped before answering".to_string()))?
    }
}

fn image_format(media_type: MediaType) -> Option<ImageFormat> {
    match media_type {
        MediaType::Jpeg => Some(ImageFormat::Jpeg),
        MediaType::Png => Some(ImageFormat::Png),
        MediaType::Webp => Some(ImageFormat::WebP),
        MediaType::Gif => Some(ImageFormat::Gif),
        MediaType::Tiff => Some(ImageFormat::Tiff),
        MediaType::Pdf => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PdfError;
    use crate::pdf::test_support::{blank_pdf, pdf_with_pages};
    use pretty_assertions::assert_eq;

    const PAGE_ONE: &str = "COMERCIAL ANDES SpA RUT 76.123.456-7 Total $1.000 Gracias por su compra";
    const PAGE_TWO: &str = "Anexo de productos vendidos en sucursal centro Total $2.000 fin del anexo";

    fn assert_send_sync<T: Send + Sync>() {}

    fn recognize_pdf(pdf: PdfConfig, bytes: &[u8]) -> String {
        LocalRecognizer::text_only(pdf)
            .recognize(bytes, MediaType::Pdf)
            .unwrap()
    }

    #[test]
    fn test_recognizer_is_shareable() {
        assert_send_sync::<LocalRecognizer>();
    }

    #[test]
    fn test_image_without_models() {
        let recognizer = LocalRecognizer::text_only(PdfConfig::default());
        assert!(!recognizer.has_ocr());
        assert!(matches!(
            recognizer.recognize(b"\x89PNG", MediaType::Png),
            Err(OcrError::ModelLoad(_))
        ));
    }

    #[test]
    fn test_missing_model_dir_falls_back() {
        let ocr = OcrConfig {
            model_dir: std::env::temp_dir().join("xpends-no-such-models"),
            ..OcrConfig::default()
        };
        assert!(matches!(
            LocalRecognizer::new(ocr.clone(), PdfConfig::default()),
            Err(OcrError::ModelLoad(_))
        ));
        assert!(!LocalRecognizer::from_config(ocr, PdfConfig::default()).has_ocr());
    }

    #[test]
    fn test_malformed_pdf() {
        let recognizer = LocalRecognizer::text_only(PdfConfig::default());
        assert!(matches!(
            recognizer.recognize(b"not a pdf", MediaType::Pdf),
            Err(OcrError::Pdf(PdfError::Parse(_)))
        ));
    }

    #[test]
    fn test_blank_pdf_yields_no_text() {
        let text = recognize_pdf(PdfConfig::default(), &blank_pdf());
        assert!(text.trim().is_empty());
    }

    #[test]
    fn test_reads_first_page_only_by_default() {
        let text = recognize_pdf(PdfConfig::default(), &pdf_with_pages(&[PAGE_ONE, PAGE_TWO]));

        assert!(text.contains("Total $1.000"));
        assert!(!text.contains("2.000"));
        assert_eq!(crate::extract(&text).amount, Some(1000.0));
    }

    #[test]
    fn test_reads_every_page_when_configured() {
        let pdf = PdfConfig {
            first_page_only: false,
            ..PdfConfig::default()
        };
        let text = recognize_pdf(pdf, &pdf_with_pages(&[PAGE_ONE, "", PAGE_TWO]));

        let first = text.find("1.000").unwrap();
        let second = text.find("2.000").unwrap();
        assert!(first < second);
        assert!(text[first..second].contains("\n\n"));
        assert_eq!(crate::extract(&text).amount, Some(1000.0));
    }

    #[test]
    fn test_short_embedded_text_kept_without_models() {
        let pdf = PdfConfig {
            min_text_length: 500,
            ..PdfConfig::default()
        };
        let text = recognize_pdf(pdf, &pdf_with_pages(&[PAGE_ONE]));
        assert!(text.contains("Total $1.000"));
    }

    #[test]
    fn test_embedded_text_ignored_when_not_preferred() {
        let pdf = PdfConfig {
            prefer_embedded_text: false,
            ..PdfConfig::default()
        };
        let text = recognize_pdf(pdf, &pdf_with_pages(&[PAGE_ONE]));
        assert_eq!(text, "");
    }

    #[test]
    fn test_image_formats() {
        assert_eq!(image_format(MediaType::Webp), Some(ImageFormat::WebP));
        assert_eq!(image_format(MediaType::Pdf), None);
    }
}
