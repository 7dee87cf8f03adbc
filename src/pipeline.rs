// src/pipeline.rs

use crate::acquisition::{Acquirer, AcquisitionMethod};
use crate::config::{Config, ExtractionConfig};
use crate::error::PipelineError;
use crate::heuristics::{ExtractedBlData, extract_bl_with};
use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, info_span};

/// What a caller gets back from a pipeline run. Always well-formed: on
/// failure `data` holds the defaults and `method` is `Failed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionOutcome {
    pub data: ExtractedBlData,
    pub raw_text: String,
    pub method: AcquisitionMethod,
}

impl ExtractionOutcome {
    pub fn failed(raw_text: String) -> Self {
        Self {
            data: ExtractedBlData::default(),
            raw_text,
            method: AcquisitionMethod::Failed,
        }
    }
}

/// Acquisition followed by field extraction, behind one failure boundary.
#[derive(Clone)]
pub struct Pipeline {
    acquirer: Acquirer,
    extraction: ExtractionConfig,
}

impl Pipeline {
    pub fn new(acquirer: Acquirer, extraction: ExtractionConfig) -> Self {
        Self {
            acquirer,
            extraction,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(Acquirer::from_config(config), config.extraction.clone())
    }

    /// Run the whole pipeline. Never fails: any error or panic in either
    /// stage is logged and turned into [`ExtractionOutcome::failed`] with
    /// whatever transcript was obtained.
    pub fn run(&self, bytes: &[u8], media_type: &str) -> ExtractionOutcome {
        let span = info_span!("bl_extract", media_type = %media_type, bytes = bytes.len());
        let _enter = span.enter();

        let mut transcript = None;
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            self.try_run(bytes, media_type, &mut transcript)
        }))
        .unwrap_or_else(|_| {
            Err(PipelineError::Panicked {
                transcript: transcript.take().unwrap_or_default(),
            })
        });

        match result {
            Ok(outcome) => {
                let (filled, total) = outcome.data.coverage();
                info!(
                    method = ?outcome.method,
                    chars = outcome.raw_text.len(),
                    filled,
                    total,
                    containers = outcome.data.containers.len(),
                    "BL extracted"
                );
                outcome
            }
            Err(e) => {
                error!(error = %e, "BL extraction failed");
                ExtractionOutcome::failed(e.into_partial_text())
            }
        }
    }

    /// `transcript` is filled as soon as acquisition succeeds, so a later
    /// panic can still report it.
    fn try_run(
        &self,
        bytes: &[u8],
        media_type: &str,
        transcript: &mut Option<String>,
    ) -> Result<ExtractionOutcome, PipelineError> {
        let acquired = self.acquirer.acquire(bytes, media_type)?;
        *transcript = Some(acquired.text.clone());

        let data = extract_bl_with(&acquired.text, &self.extraction);

        Ok(ExtractionOutcome {
            data,
            raw_text: acquired.text,
            method: acquired.method,
        })
    }

    /// [`Pipeline::run`] on the blocking pool, bounded by `timeout`. A run
    /// that does not finish in time yields a `Failed` outcome with an empty
    /// transcript; the blocking work itself is not interrupted and releases
    /// its OCR session when it completes.
    pub async fn run_with_timeout(
        self: Arc<Self>,
        bytes: Vec<u8>,
        media_type: String,
        timeout: Duration,
    ) -> ExtractionOutcome {
        let task = tokio::task::spawn_blocking(move || self.run(&bytes, &media_type));

        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                error!(error = %e, "Extraction task aborted");
                ExtractionOutcome::failed(String::new())
            }
            Err(_) => {
                error!(timeout_ms = timeout.as_millis() as u64, "BL extraction timed out");
                ExtractionOutcome::failed(String::new())
            }
        }
    }
}

/// Run the pipeline with the stock configuration.
pub fn run_extraction(bytes: &[u8], media_type: &str) -> ExtractionOutcome {
    Pipeline::from_config(&Config::default()).run(bytes, media_type)
}
