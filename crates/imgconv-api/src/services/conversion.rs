//! Batch conversion service
//!
//! Validates a parsed upload, transcodes every file on the blocking pool
//! (bounded by a per-request semaphore) and assembles the response in upload
//! order.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use futures::future::join_all;
use imgconv_core::{resolve, AppError, FailurePolicy, FormatEntry, TargetFormat};
use imgconv_processing::{ImageTranscoder, TranscodeError};
use serde::Serialize;
use tokio::sync::Semaphore;

use crate::utils::naming::{data_url, output_name};

/// One uploaded file, held in memory for the duration of the request
#[derive(Debug, Clone)]
pub struct RawFile {
    pub original_name: String,
    pub bytes: Bytes,
}

/// State of the `format` field after reading the multipart body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FormatField {
    #[default]
    Missing,
    Value(String),
    /// Sent as a file, not valid UTF-8, or sent more than once
    Invalid,
}

/// Upload as parsed from the multipart body, before validation
#[derive(Debug, Clone, Default)]
pub struct ConversionForm {
    pub format: FormatField,
    pub files: Vec<RawFile>,
}

/// Validated request: a registry format and at least one file
#[derive(Debug)]
pub struct ConversionRequest {
    pub target: &'static FormatEntry,
    pub files: Vec<RawFile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertedFile {
    pub name: String,
    pub mime: String,
    /// Length of the encoded output in bytes
    pub size: usize,
    pub data_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ConversionOutcome {
    Converted(ConvertedFile),
    Failed { name: String, error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversionResponse {
    pub files: Vec<ConversionOutcome>,
}

/// Why a single file produced no output
#[derive(Debug)]
enum FileFailure {
    Transcode(TranscodeError),
    /// The blocking task panicked or the semaphore closed
    Aborted(String),
}

impl FileFailure {
    fn description(&self) -> &'static str {
        match self {
            FileFailure::Transcode(e) => e.kind_description(),
            FileFailure::Aborted(_) => "Conversion aborted",
        }
    }
}

impl fmt::Display for FileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileFailure::Transcode(e) => write!(f, "{}", e),
            FileFailure::Aborted(reason) => write!(f, "conversion task aborted: {}", reason),
        }
    }
}

type FileResult = (String, Result<Bytes, FileFailure>);

#[derive(Debug, Clone)]
pub struct ConversionService {
    transcoder: ImageTranscoder,
    max_concurrent: usize,
    failure_policy: FailurePolicy,
}

impl ConversionService {
    pub fn new(
        transcoder: ImageTranscoder,
        max_concurrent: usize,
        failure_policy: FailurePolicy,
    ) -> Self {
        Self {
            transcoder,
            max_concurrent: max_concurrent.max(1),
            failure_policy,
        }
    }

    /// Check the form in order: format present, format known, files present.
    pub fn validate(form: ConversionForm) -> Result<ConversionRequest, AppError> {
        let ConversionForm { format, files } = form;

        let format = match format {
            FormatField::Value(value) if !value.is_empty() => value,
            _ => return Err(AppError::MissingOrInvalidFormat),
        };

        let target = resolve(&format).ok_or(AppError::UnsupportedFormat(format))?;

        if files.is_empty() {
            return Err(AppError::NoFilesUploaded);
        }

        Ok(ConversionRequest { target, files })
    }

    #[tracing::instrument(
        skip(self, form),
        fields(format = ?form.format, file_count = form.files.len())
    )]
    pub async fn convert(&self, form: ConversionForm) -> Result<ConversionResponse, AppError> {
        let request = Self::validate(form)?;
        let target = request.target;

        let results = self.transcode_all(request.files, target.format).await;

        for (name, result) in &results {
            if let Err(failure) = result {
                tracing::warn!(
                    file = %name,
                    format = target.id,
                    error = %failure,
                    "File conversion failed"
                );
            }
        }

        if self.failure_policy == FailurePolicy::AllOrNothing {
            if let Some((name, Err(failure))) = results.iter().find(|(_, r)| r.is_err()) {
                return Err(AppError::ConversionFailed {
                    file: name.clone(),
                    reason: failure.to_string(),
                });
            }
        }

        let files: Vec<ConversionOutcome> = results
            .into_iter()
            .map(|(original_name, result)| match result {
                Ok(bytes) => ConversionOutcome::Converted(ConvertedFile {
                    name: output_name(&original_name, target),
                    mime: target.mime.to_string(),
                    size: bytes.len(),
                    data_url: data_url(target.mime, &bytes),
                }),
                Err(failure) => ConversionOutcome::Failed {
                    name: original_name,
                    error: failure.description().to_string(),
                },
            })
            .collect();

        let failed = files
            .iter()
            .filter(|f| matches!(f, ConversionOutcome::Failed { .. }))
            .count();
        tracing::info!(
            format = target.id,
            converted = files.len() - failed,
            failed,
            "Batch conversion finished"
        );

        Ok(ConversionResponse { files })
    }

    /// Fan out one blocking transcode per file, fan in by position.
    async fn transcode_all(&self, files: Vec<RawFile>, target: TargetFormat) -> Vec<FileResult> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));

        let tasks = files.into_iter().map(|file| {
            let semaphore = Arc::clone(&semaphore);
            let transcoder = self.transcoder;

            async move {
                let RawFile {
                    original_name,
                    bytes,
                } = file;

                let result = match semaphore.acquire_owned().await {
                    Ok(permit) => {
                        // The permit moves into the task so it is held until the
                        // blocking work ends, even if this future is dropped.
                        let handle = tokio::task::spawn_blocking(move || {
                            let _permit = permit;
                            transcoder.transcode(&bytes, target)
                        });
                        match handle.await {
                            Ok(result) => result.map_err(FileFailure::Transcode),
                            Err(e) => Err(FileFailure::Aborted(e.to_string())),
                        }
                    }
                    Err(e) => Err(FileFailure::Aborted(e.to_string())),
                };

                (original_name, result)
            }
        });

        join_all(tasks).await
    }
}
