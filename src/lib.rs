//! Bill of Lading extraction: document bytes in, structured shipment data out.
//!
//! [`acquisition`] turns a PDF or image into a plain-text transcript (native
//! text layer, or OCR when there is none); [`heuristics`] parses that
//! transcript into [`ExtractedBlData`]; [`pipeline`] runs both behind a
//! boundary that never returns an error.

pub mod acquisition;
pub mod config;
pub mod error;
pub mod heuristics;
pub mod media;
pub mod ocr;
pub mod pdf_extract;
pub mod pipeline;

pub use acquisition::{Acquirer, AcquisitionMethod, Transcript};
pub use config::Config;
pub use error::{AcquisitionError, AcquisitionFailure, ConfigError, PipelineError};
pub use heuristics::{ContainerRecord, ContainerType, ExtractedBlData, extract_bl, extract_bl_with};
pub use pipeline::{ExtractionOutcome, Pipeline, run_extraction};
