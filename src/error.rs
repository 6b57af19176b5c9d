//! Error taxonomy for the risk pipeline and the dashboard around it

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Which loaded artifact an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Scaler,
    Model,
    Dataset,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArtifactKind::Scaler => "scaler",
            ArtifactKind::Model => "model",
            ArtifactKind::Dataset => "reference dataset",
        };
        f.write_str(name)
    }
}

/// An artifact could not be read or deserialized at load time.
///
/// The slot it was meant to fill is marked absent; the process keeps running.
#[derive(Debug, Clone, Error)]
#[error("{kind} artifact '{}' unavailable: {reason}", .path.display())]
pub struct ArtifactMissing {
    pub kind: ArtifactKind,
    pub path: PathBuf,
    pub reason: String,
}

impl ArtifactMissing {
    pub fn new(kind: ArtifactKind, path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        Self {
            kind,
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// A display-only asset (chart, cluster table, report) is absent.
#[derive(Debug, Clone, Error)]
#[error("asset '{}' unavailable: {reason}", .path.display())]
pub struct SupportingAssetMissing {
    pub path: PathBuf,
    pub reason: String,
}

/// A submitted patient field is absent or outside its domain
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("field '{field}' is required")]
    Missing { field: &'static str },

    #[error("field '{field}' is not a number: '{raw}'")]
    Unparseable { field: &'static str, raw: String },

    #[error("field '{field}' must be a finite number")]
    NotFinite { field: &'static str },

    #[error("field '{field}' must not be negative (got {value})")]
    Negative { field: &'static str, value: f64 },

    #[error("field '{field}' must be a whole number (got {value})")]
    NotInteger { field: &'static str, value: f64 },

    #[error("field '{field}' is zero, which is treated as a missing measurement")]
    ZeroMeasurement { field: &'static str },

    #[error("request body is not a patient record: {reason}")]
    MalformedBody { reason: String },
}

impl ValidationError {
    /// Name of the offending field, if the error concerns a single field
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ValidationError::Missing { field }
            | ValidationError::Unparseable { field, .. }
            | ValidationError::NotFinite { field }
            | ValidationError::Negative { field, .. }
            | ValidationError::NotInteger { field, .. }
            | ValidationError::ZeroMeasurement { field } => Some(*field),
            ValidationError::MalformedBody { .. } => None,
        }
    }
}

/// The scaler or classifier produced output that breaks the pipeline contract
#[derive(Debug, Clone, Error)]
pub enum InferenceError {
    #[error("expected a {expected_rows}x{expected_cols} matrix, got {rows}x{cols}")]
    ShapeMismatch {
        expected_rows: usize,
        expected_cols: usize,
        rows: usize,
        cols: usize,
    },

    #[error("classifier output is malformed: {0}")]
    MalformedOutput(String),

    #[error("model backend failed: {0}")]
    Backend(String),
}

/// Outcome of a single submission that did not produce a prediction
#[derive(Debug, Clone, Error)]
pub enum PredictError {
    #[error("prediction unavailable: {}", .missing.join("; "))]
    Unavailable { missing: Vec<String> },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Inference(#[from] InferenceError),
}
