use std::io;

use crate::backend::BackendError;

/// Represents the different types of errors that can occur while classifying a dataset.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    /// Error occurred while reading input files or writing results
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Error occurred while decoding input data or encoding an outcome
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Error occurred while writing a CSV report
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    /// A local backend failure; these always abort the run
    #[error(transparent)]
    Backend(#[from] BackendError),
    /// A record lacks a field required to build the prompt or the outcome
    #[error("Record {identifier} is missing required field '{field}'")]
    MissingField {
        identifier: String,
        field: &'static str,
    },
    /// The ground-truth field holds something other than a string
    #[error("Record {identifier} has a non-string value in label field '{field}'")]
    InvalidLabel { identifier: String, field: String },
    /// The prompt template could not be parsed
    #[error("Template error: {0}")]
    TemplateError(String),
    /// Error occurred during the build phase
    #[error("Build error: {0}")]
    BuildError(String),
    /// Error occurred due to invalid input parameters
    #[error("Validation error: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, ClassifierError>;
