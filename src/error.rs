use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PipelineError {
    #[error("prediction is unavailable: model artifacts could not be loaded")]
    ArtifactUnavailable,
    #[error("feature columns do not match the scaler schema; missing: {}", missing.join(", "))]
    SchemaMismatch { missing: Vec<String> },
    #[error("processing failed: {0}")]
    Processing(String),
}

impl PipelineError {
    pub fn processing(detail: impl std::fmt::Display) -> Self {
        PipelineError::Processing(detail.to_string())
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum InputError {
    #[error("{field}: unknown option {value:?}")]
    UnknownOption { field: &'static str, value: String },
    #[error("{field}: value {value} is outside {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("{field}: value must be a finite number")]
    NotFinite { field: &'static str },
    #[error("malformed submission: {0}")]
    Malformed(String),
}
