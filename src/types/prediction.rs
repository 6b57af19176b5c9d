//! Prediction and risk assessment data structures

use crate::types::patient::FeatureVector;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Output of the inference pipeline for one feature vector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Predicted class: 1 = diabetic, 0 = non-diabetic
    pub label: u8,
    /// Probability of the negative class (0.0 - 1.0)
    pub probability_of_negative: f64,
    /// Probability of the positive class (0.0 - 1.0)
    pub probability_of_positive: f64,
}

impl PredictionResult {
    pub fn is_positive(&self) -> bool {
        self.label == 1
    }

    /// Positive-class probability as a percentage
    pub fn positive_percent(&self) -> f64 {
        self.probability_of_positive * 100.0
    }
}

/// Risk classification shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Elevated,
}

impl RiskLevel {
    /// Risk level follows the classifier's own decision
    pub fn from_prediction(prediction: &PredictionResult) -> Self {
        if prediction.is_positive() {
            RiskLevel::Elevated
        } else {
            RiskLevel::Low
        }
    }

    pub fn headline(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low risk of diabetes",
            RiskLevel::Elevated => "Elevated risk of diabetes",
        }
    }
}

/// A prediction together with the inputs it was made from
#[derive(Debug, Clone, Serialize)]
pub struct RiskAssessment {
    /// Unique assessment identifier
    pub assessment_id: String,

    /// The validated features that were scored
    pub features: FeatureVector,

    /// Raw pipeline output
    pub prediction: PredictionResult,

    /// Risk level classification
    pub risk_level: RiskLevel,

    /// Positive-class probability (0 - 100)
    pub probability_percent: f64,

    /// Assessment timestamp
    pub timestamp: DateTime<Utc>,
}

impl RiskAssessment {
    pub fn new(features: FeatureVector, prediction: PredictionResult) -> Self {
        Self {
            assessment_id: uuid::Uuid::new_v4().to_string(),
            features,
            risk_level: RiskLevel::from_prediction(&prediction),
            probability_percent: prediction.positive_percent(),
            prediction,
            timestamp: Utc::now(),
        }
    }

    /// One-line message for display, e.g. "Elevated risk of diabetes (probability 71.8%)"
    pub fn message(&self) -> String {
        format!(
            "{} (probability {:.1}%)",
            self.risk_level.headline(),
            self.probability_percent
        )
    }
}
