//! Diabetes Risk Dashboard Library
//!
//! Loads a trained scaler and classifier, turns patient measurements into
//! a validated feature vector, and serves risk predictions alongside
//! exploratory and evaluation material for the reference dataset.

pub mod assets;
pub mod config;
pub mod context;
pub mod dashboard;
pub mod dataset;
pub mod error;
pub mod feature_assembler;
pub mod metrics;
pub mod models;
pub mod types;

pub use config::AppConfig;
pub use context::AppContext;
pub use error::{ArtifactMissing, InferenceError, PredictError, ValidationError};
pub use feature_assembler::FeatureAssembler;
pub use models::{infer, ArtifactLoader, LoadedArtifacts};
pub use types::{FeatureVector, PatientInput, PredictionResult, RiskAssessment};
