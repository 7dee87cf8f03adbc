// src/error.rs

use thiserror::Error;

/// Everything that can stop the Text Acquisition Engine from producing a
/// transcript.
#[derive(Error, Debug)]
pub enum AcquisitionError {
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("PDF parsing failed: {0}")]
    PdfParsing(String),

    #[error("PDF has no embedded page images to recognize")]
    NoPageImages,

    #[error("image processing error: {0}")]
    ImageProcessing(String),

    #[error("OCR initialization failed: {0}")]
    OcrInit(String),

    #[error("OCR processing failed: {0}")]
    OcrProcessing(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// An acquisition error together with whatever transcript had already been
/// produced when it happened (possibly empty).
#[derive(Error, Debug)]
#[error("{source}")]
pub struct AcquisitionFailure {
    pub partial_text: String,
    #[source]
    pub source: AcquisitionError,
}

impl AcquisitionFailure {
    pub fn new(partial_text: impl Into<String>, source: AcquisitionError) -> Self {
        Self {
            partial_text: partial_text.into(),
            source,
        }
    }
}

impl From<AcquisitionError> for AcquisitionFailure {
    fn from(source: AcquisitionError) -> Self {
        Self::new(String::new(), source)
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Why a pipeline run fell back to the all-defaults result.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Acquisition(#[from] AcquisitionFailure),

    #[error("pipeline stage panicked")]
    Panicked { transcript: String },
}

impl PipelineError {
    /// Transcript obtained before the failure, possibly empty.
    pub fn into_partial_text(self) -> String {
        match self {
            PipelineError::Acquisition(failure) => failure.partial_text,
            PipelineError::Panicked { transcript } => transcript,
        }
    }
}
