//! Type definitions for the risk dashboard

pub mod patient;
pub mod prediction;

pub use patient::{FeatureVector, PatientInput, FEATURE_COLUMNS, FEATURE_COUNT};
pub use prediction::{PredictionResult, RiskAssessment, RiskLevel};
