// src/acquisition.rs

use crate::config::Config;
use crate::error::{AcquisitionError, AcquisitionFailure};
use crate::media::MediaKind;
use crate::ocr::{OcrEngine, TesseractCli, recognize_pages};
use crate::pdf_extract::{NativePdf, PdfContent, PdfTextSource, assess_native_text};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Which path produced the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcquisitionMethod {
    #[serde(rename = "native-text")]
    NativeText,
    #[serde(rename = "ocr")]
    Ocr,
    #[serde(rename = "failed")]
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub text: String,
    pub method: AcquisitionMethod,
}

/// Text Acquisition Engine: document bytes + declared media type in,
/// plain-text transcript out.
#[derive(Clone)]
pub struct Acquirer {
    pdf: Arc<dyn PdfTextSource>,
    ocr: Arc<dyn OcrEngine>,
    min_text_chars: usize,
}

impl Acquirer {
    pub fn new(pdf: Arc<dyn PdfTextSource>, ocr: Arc<dyn OcrEngine>, min_text_chars: usize) -> Self {
        Self {
            pdf,
            ocr,
            min_text_chars,
        }
    }

    /// Production engines: `pdf-extract`/`lopdf` and the Tesseract CLI.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(NativePdf),
            Arc::new(TesseractCli::new(&config.ocr)),
            config.acquisition.min_text_chars,
        )
    }

    pub fn acquire(&self, bytes: &[u8], media_type: &str) -> Result<Transcript, AcquisitionFailure> {
        match MediaKind::from_declared(media_type) {
            MediaKind::Pdf => self.acquire_pdf(bytes),
            MediaKind::Image => {
                info!(bytes = bytes.len(), "Raster image, running OCR directly");
                let text = recognize_pages(self.ocr.as_ref(), &[bytes])?;
                Ok(Transcript {
                    text,
                    method: AcquisitionMethod::Ocr,
                })
            }
            MediaKind::Unsupported => {
                Err(AcquisitionError::UnsupportedMediaType(media_type.to_string()).into())
            }
        }
    }

    fn acquire_pdf(&self, bytes: &[u8]) -> Result<Transcript, AcquisitionFailure> {
        // A PDF whose text layer cannot be read is handled like a scanned one.
        let native = match self.pdf.extract_text(bytes) {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Native text extraction failed; may be scanned or corrupted");
                String::new()
            }
        };

        match assess_native_text(native, self.min_text_chars) {
            PdfContent::Text(text) => Ok(Transcript {
                text,
                method: AcquisitionMethod::NativeText,
            }),
            PdfContent::ScannedImage(partial) => {
                let images = match self.pdf.page_images(bytes) {
                    Ok(images) => images,
                    Err(e) => return Err(AcquisitionFailure::new(partial, e)),
                };
                match recognize_pages(self.ocr.as_ref(), &images) {
                    Ok(text) => Ok(Transcript {
                        text,
                        method: AcquisitionMethod::Ocr,
                    }),
                    Err(e) => Err(AcquisitionFailure::new(partial, e)),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::MockOcrEngine;

    /// Native PDF stub with canned text and page images.
    struct StubPdf {
        text: Result<String, String>,
        images: Vec<Vec<u8>>,
    }

    impl PdfTextSource for StubPdf {
        fn extract_text(&self, _pdf_bytes: &[u8]) -> Result<String, AcquisitionError> {
            self.text.clone().map_err(AcquisitionError::PdfParsing)
        }

        fn page_images(&self, _pdf_bytes: &[u8]) -> Result<Vec<Vec<u8>>, AcquisitionError> {
            if self.images.is_empty() {
                Err(AcquisitionError::NoPageImages)
            } else {
                Ok(self.images.clone())
            }
        }
    }

    fn acquirer(pdf: StubPdf, ocr: Arc<MockOcrEngine>) -> Acquirer {
        Acquirer::new(Arc::new(pdf), ocr, 50)
    }

    const LONG_TEXT: &str =
        "BILL OF LADING  B/L No: MEDU1234567  SHIPPER: ACME TRADING CO LTD  CONSIGNEE: SOGUICAF";

    #[test]
    fn pdf_with_text_layer_uses_native_text() {
        let ocr = Arc::new(MockOcrEngine::returning("ocr text"));
        let a = acquirer(
            StubPdf {
                text: Ok(LONG_TEXT.to_string()),
                images: vec![],
            },
            ocr.clone(),
        );
        let t = a.acquire(b"%PDF", "application/pdf").unwrap();
        assert_eq!(t.method, AcquisitionMethod::NativeText);
        assert_eq!(t.text, LONG_TEXT);
        assert_eq!(ocr.sessions_opened(), 0);
    }

    #[test]
    fn whitespace_only_pdf_falls_back_to_ocr() {
        let ocr = Arc::new(MockOcrEngine::returning("SCANNED BL TEXT"));
        let a = acquirer(
            StubPdf {
                text: Ok("   \n  \n".to_string()),
                images: vec![vec![0xFF, 0xD8]],
            },
            ocr.clone(),
        );
        let t = a.acquire(b"%PDF", "application/pdf").unwrap();
        assert_eq!(t.method, AcquisitionMethod::Ocr);
        assert_eq!(t.text, "SCANNED BL TEXT");
        assert_eq!(ocr.sessions_opened(), 1);
        assert_eq!(ocr.sessions_released(), 1);
    }

    #[test]
    fn unreadable_text_layer_falls_back_to_ocr() {
        let ocr = Arc::new(MockOcrEngine::returning("SCANNED"));
        let a = acquirer(
            StubPdf {
                text: Err("bad xref".to_string()),
                images: vec![vec![1], vec![2]],
            },
            ocr,
        );
        let t = a.acquire(b"%PDF", "application/pdf").unwrap();
        assert_eq!(t.method, AcquisitionMethod::Ocr);
        assert_eq!(t.text, "SCANNED\nSCANNED");
    }

    #[test]
    fn ocr_failure_keeps_partial_native_text() {
        let ocr = Arc::new(MockOcrEngine::failing("engine crashed"));
        let a = acquirer(
            StubPdf {
                text: Ok("B/L MEDU".to_string()),
                images: vec![vec![1]],
            },
            ocr.clone(),
        );
        let err = a.acquire(b"%PDF", "application/pdf").unwrap_err();
        assert_eq!(err.partial_text, "B/L MEDU");
        assert!(matches!(err.source, AcquisitionError::OcrProcessing(_)));
        assert_eq!(ocr.sessions_released(), 1);
    }

    #[test]
    fn scanned_pdf_without_images_fails() {
        let ocr = Arc::new(MockOcrEngine::returning("unused"));
        let a = acquirer(
            StubPdf {
                text: Ok(String::new()),
                images: vec![],
            },
            ocr.clone(),
        );
        let err = a.acquire(b"%PDF", "application/pdf").unwrap_err();
        assert!(matches!(err.source, AcquisitionError::NoPageImages));
        assert_eq!(ocr.sessions_opened(), 0);
    }

    #[test]
    fn images_go_straight_to_ocr() {
        let ocr = Arc::new(MockOcrEngine::returning("DESTINATAIRE"));
        let a = acquirer(
            StubPdf {
                text: Ok(LONG_TEXT.to_string()),
                images: vec![],
            },
            ocr.clone(),
        );
        for mime in ["image/jpeg", "image/png", "image/webp"] {
            let t = a.acquire(b"\xFF\xD8", mime).unwrap();
            assert_eq!(t.method, AcquisitionMethod::Ocr);
            assert_eq!(t.text, "DESTINATAIRE");
        }
        assert_eq!(ocr.sessions_opened(), 3);
        assert_eq!(ocr.sessions_released(), 3);
    }

    #[test]
    fn unsupported_media_type_is_an_error() {
        let ocr = Arc::new(MockOcrEngine::returning("unused"));
        let a = acquirer(
            StubPdf {
                text: Ok(LONG_TEXT.to_string()),
                images: vec![],
            },
            ocr,
        );
        let err = a.acquire(b"hello", "text/plain").unwrap_err();
        assert!(err.partial_text.is_empty());
        assert!(matches!(err.source, AcquisitionError::UnsupportedMediaType(ref m) if m == "text/plain"));
    }

    #[test]
    fn method_serializes_to_wire_names() {
        assert_eq!(serde_json::to_string(&AcquisitionMethod::NativeText).unwrap(), "\"native-text\"");
        assert_eq!(serde_json::to_string(&AcquisitionMethod::Ocr).unwrap(), "\"ocr\"");
        assert_eq!(serde_json::to_string(&AcquisitionMethod::Failed).unwrap(), "\"failed\"");
    }
}
