// src/ocr.rs

use crate::config::OcrConfig;
use crate::error::AcquisitionError;
use std::path::PathBuf;
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;
use tracing::{debug, info};

/// One recognition worker. Dropping it releases whatever the engine
/// allocated, so a session never outlives the request that opened it.
pub trait OcrSession {
    fn recognize(&mut self, image: &[u8]) -> Result<String, AcquisitionError>;
}

/// OCR engine abstraction (allows mocking for tests).
pub trait OcrEngine: Send + Sync {
    /// Tesseract-style language spec, e.g. "eng+fra".
    fn languages(&self) -> &str;

    fn start_session(&self) -> Result<Box<dyn OcrSession + '_>, AcquisitionError>;
}

/// Recognize a sequence of page images inside a single session and join the
/// page transcripts with newlines. The session is dropped on every return
/// path, including errors.
pub fn recognize_pages<I: AsRef<[u8]>>(
    engine: &dyn OcrEngine,
    images: &[I],
) -> Result<String, AcquisitionError> {
    let mut session = engine.start_session()?;
    info!(pages = images.len(), languages = engine.languages(), "OCR session started");

    let mut pages = Vec::with_capacity(images.len());
    for (idx, image) in images.iter().enumerate() {
        let text = session.recognize(image.as_ref())?;
        debug!(page = idx + 1, chars = text.len(), "Page recognized");
        pages.push(text);
    }
    Ok(pages.join("\n"))
}

// ---------------------------------------------------------------------------
// Tesseract CLI
// ---------------------------------------------------------------------------

/// Runs the `tesseract` binary once per image.
pub struct TesseractCli {
    tesseract_path: String,
    languages: String,
    tessdata_dir: Option<PathBuf>,
}

impl TesseractCli {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            tesseract_path: config.tesseract_path.clone(),
            languages: config.languages.clone(),
            tessdata_dir: config.tessdata_dir.clone(),
        }
    }

    /// Check whether the configured binary can be launched at all.
    pub fn is_available(&self) -> bool {
        Command::new(&self.tesseract_path)
            .arg("--version")
            .output()
            .is_ok_and(|o| o.status.success())
    }
}

impl OcrEngine for TesseractCli {
    fn languages(&self) -> &str {
        &self.languages
    }

    fn start_session(&self) -> Result<Box<dyn OcrSession + '_>, AcquisitionError> {
        let workdir = tempfile::Builder::new()
            .prefix("bl-ocr-")
            .tempdir()
            .map_err(|e| AcquisitionError::OcrInit(format!("failed to create work dir: {e}")))?;
        Ok(Box::new(TesseractSession {
            engine: self,
            workdir,
            pages: 0,
        }))
    }
}

/// Scratch directory for the images handed to tesseract. Removed when the
/// session drops.
struct TesseractSession<'a> {
    engine: &'a TesseractCli,
    workdir: TempDir,
    pages: usize,
}

impl OcrSession for TesseractSession<'_> {
    fn recognize(&mut self, image: &[u8]) -> Result<String, AcquisitionError> {
        self.pages += 1;
        let input = self.workdir.path().join(format!("page-{}.img", self.pages));
        std::fs::write(&input, image)?;

        let mut cmd = Command::new(&self.engine.tesseract_path);
        cmd.arg(&input)
            .arg("stdout")
            .arg("-l")
            .arg(&self.engine.languages);
        if let Some(dir) = &self.engine.tessdata_dir {
            cmd.arg("--tessdata-dir").arg(dir);
        }

        let output = cmd.output().map_err(|e| {
            AcquisitionError::OcrInit(format!(
                "failed to run tesseract (path='{}'): {e}",
                self.engine.tesseract_path
            ))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AcquisitionError::OcrProcessing(format!(
                "tesseract exited with code {}: {}",
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Drop for TesseractSession<'_> {
    fn drop(&mut self) {
        debug!(
            pages = self.pages,
            workdir = %self.workdir.path().display(),
            "OCR session released"
        );
    }
}

// ---------------------------------------------------------------------------
// Mock engine
// ---------------------------------------------------------------------------

/// Mock OCR engine for tests without Tesseract. Counts opened and released
/// sessions so callers can check that nothing leaks.
pub struct MockOcrEngine {
    outcome: Result<String, String>,
    opened: AtomicUsize,
    released: AtomicUsize,
}

impl MockOcrEngine {
    pub fn returning(text: &str) -> Self {
        Self::with_outcome(Ok(text.to_string()))
    }

    pub fn failing(message: &str) -> Self {
        Self::with_outcome(Err(message.to_string()))
    }

    fn with_outcome(outcome: Result<String, String>) -> Self {
        Self {
            outcome,
            opened: AtomicUsize::new(0),
            released: AtomicUsize::new(0),
        }
    }

    pub fn sessions_opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn sessions_released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

impl OcrEngine for MockOcrEngine {
    fn languages(&self) -> &str {
        "eng+fra"
    }

    fn start_session(&self) -> Result<Box<dyn OcrSession + '_>, AcquisitionError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockSession { engine: self }))
    }
}

struct MockSession<'a> {
    engine: &'a MockOcrEngine,
}

impl OcrSession for MockSession<'_> {
    fn recognize(&mut self, _image: &[u8]) -> Result<String, AcquisitionError> {
        self.engine
            .outcome
            .clone()
            .map_err(AcquisitionError::OcrProcessing)
    }
}

impl Drop for MockSession<'_> {
    fn drop(&mut self) {
        self.engine.released.fetch_add(1, Ordering::SeqCst);
    }
}
