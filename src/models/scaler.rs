//! Fitted feature scalers

use crate::error::InferenceError;
use crate::models::check_columns;
use crate::types::patient::FEATURE_COUNT;
use ndarray::{Array2, ArrayView1, ArrayView2};
use serde::Deserialize;

/// A fitted transform that maps raw feature magnitudes to the distribution
/// the classifier was trained on.
pub trait Scaler: Send + Sync {
    /// Number of columns the scaler was fitted on
    fn n_features(&self) -> usize;

    /// Transform every row of `x`, producing a matrix of the same shape
    fn transform(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, InferenceError>;
}

/// Serialized scaler document, tagged by `kind`
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScalerArtifact {
    Standard(StandardScaler),
    MinMax(MinMaxScaler),
}

impl ScalerArtifact {
    /// Check fitted parameters before the artifact is put into service
    pub fn validate(&self) -> Result<(), String> {
        match self {
            ScalerArtifact::Standard(s) => s.validate(),
            ScalerArtifact::MinMax(s) => s.validate(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScalerArtifact::Standard(_) => "standard",
            ScalerArtifact::MinMax(_) => "min_max",
        }
    }
}

impl Scaler for ScalerArtifact {
    fn n_features(&self) -> usize {
        match self {
            ScalerArtifact::Standard(s) => s.n_features(),
            ScalerArtifact::MinMax(s) => s.n_features(),
        }
    }

    fn transform(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, InferenceError> {
        match self {
            ScalerArtifact::Standard(s) => s.transform(x),
            ScalerArtifact::MinMax(s) => s.transform(x),
        }
    }
}

/// Standardization: `(x - mean) / scale`
#[derive(Debug, Clone, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    fn validate(&self) -> Result<(), String> {
        check_width("mean", self.mean.len())?;
        check_width("scale", self.scale.len())?;
        if self.mean.iter().any(|v| !v.is_finite()) {
            return Err("mean contains a non-finite value".to_string());
        }
        if self.scale.iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return Err("scale must be finite and positive".to_string());
        }
        Ok(())
    }
}

impl Scaler for StandardScaler {
    fn n_features(&self) -> usize {
        self.mean.len()
    }

    fn transform(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, InferenceError> {
        check_columns(x, self.n_features())?;
        let mean = ArrayView1::from(&self.mean[..]);
        let scale = ArrayView1::from(&self.scale[..]);
        Ok((&x - &mean) / &scale)
    }
}

/// Min-max scaling: `x * scale + min`
#[derive(Debug, Clone, Deserialize)]
pub struct MinMaxScaler {
    pub min: Vec<f64>,
    pub scale: Vec<f64>,
}

impl MinMaxScaler {
    fn validate(&self) -> Result<(), String> {
        check_width("min", self.min.len())?;
        check_width("scale", self.scale.len())?;
        if self.min.iter().any(|v| !v.is_finite()) {
            return Err("min contains a non-finite value".to_string());
        }
        if self.scale.iter().any(|v| !v.is_finite() || *v == 0.0) {
            return Err("scale must be finite and non-zero".to_string());
        }
        Ok(())
    }
}

impl Scaler for MinMaxScaler {
    fn n_features(&self) -> usize {
        self.min.len()
    }

    fn transform(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, InferenceError> {
        check_columns(x, self.n_features())?;
        let scale = ArrayView1::from(&self.scale[..]);
        let min = ArrayView1::from(&self.min[..]);
        Ok(&x * &scale + &min)
    }
}

fn check_width(name: &str, len: usize) -> Result<(), String> {
    if len != FEATURE_COUNT {
        return Err(format!(
            "{name} has {len} entries, expected {FEATURE_COUNT}"
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn standard() -> ScalerArtifact {
        serde_json::from_str(
            r#"{"kind": "standard",
                "mean": [1, 2, 3, 4, 5, 6, 7, 8],
                "scale": [1, 2, 1, 2, 1, 2, 1, 2]}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_standard_transform() {
        let scaler = standard();
        assert!(scaler.validate().is_ok());
        assert_eq!(scaler.name(), "standard");

        let x = array![[1.0, 4.0, 3.0, 8.0, 5.0, 10.0, 9.0, 8.0]];
        let out = scaler.transform(x.view()).unwrap();
        assert_eq!(out, array![[0.0, 1.0, 0.0, 2.0, 0.0, 2.0, 2.0, 0.0]]);
    }

    #[test]
    fn test_min_max_transform() {
        let scaler: ScalerArtifact = serde_json::from_str(
            r#"{"kind": "min_max",
                "min": [0, 0, 0, 0, 0, 0, 0, -1],
                "scale": [0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5]}"#,
        )
        .unwrap();
        assert!(scaler.validate().is_ok());

        let x = array![[2.0, 4.0, 6.0, 8.0, 10.0, 12.0, 14.0, 4.0]];
        let out = scaler.transform(x.view()).unwrap();
        assert_eq!(out, array![[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 1.0]]);
    }

    #[test]
    fn test_wrong_width_fails_validation() {
        let scaler: ScalerArtifact = serde_json::from_str(
            r#"{"kind": "standard", "mean": [0, 0, 0], "scale": [1, 1, 1]}"#,
        )
        .unwrap();
        let err = scaler.validate().unwrap_err();
        assert!(err.contains("expected 8"), "{err}");
    }

    #[test]
    fn test_zero_scale_fails_validation() {
        let scaler: ScalerArtifact = serde_json::from_str(
            r#"{"kind": "standard",
                "mean": [0, 0, 0, 0, 0, 0, 0, 0],
                "scale": [1, 1, 1, 0, 1, 1, 1, 1]}"#,
        )
        .unwrap();
        assert!(scaler.validate().is_err());
    }

    #[test]
    fn test_transform_rejects_wrong_input_width() {
        let scaler = standard();
        let x = array![[1.0, 2.0]];
        assert!(matches!(
            scaler.transform(x.view()),
            Err(InferenceError::ShapeMismatch { cols: 2, .. })
        ));
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let parsed: Result<ScalerArtifact, _> =
            serde_json::from_str(r#"{"kind": "robust", "center": [], "scale": []}"#);
        assert!(parsed.is_err());
    }
}
