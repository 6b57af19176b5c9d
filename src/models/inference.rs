//! Inference pipeline: scale one feature vector, then classify it

use crate::error::InferenceError;
use crate::models::classifier::Classifier;
use crate::models::scaler::Scaler;
use crate::types::patient::{FeatureVector, FEATURE_COUNT};
use crate::types::prediction::PredictionResult;
use tracing::debug;

/// Allowed drift of `p0 + p1` away from 1.0
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// Score one validated feature vector.
///
/// The caller must only invoke this with both artifacts present. The
/// computation is synchronous and deterministic; errors are returned as-is
/// and never retried.
pub fn infer(
    vector: &FeatureVector,
    scaler: &dyn Scaler,
    model: &dyn Classifier,
) -> Result<PredictionResult, InferenceError> {
    let row = vector.to_row();

    let scaled = scaler.transform(row.view())?;
    check_shape(scaled.nrows(), scaled.ncols(), 1, FEATURE_COUNT)?;

    let (labels, proba) = model.predict_with_proba(scaled.view())?;
    check_shape(proba.nrows(), proba.ncols(), 1, 2)?;

    let label = labels
        .first()
        .copied()
        .ok_or_else(|| InferenceError::MalformedOutput("no label returned".to_string()))?;
    if label > 1 {
        return Err(InferenceError::MalformedOutput(format!(
            "label {label} is not binary"
        )));
    }

    let (negative, positive) = (proba[[0, 0]], proba[[0, 1]]);
    for p in [negative, positive] {
        if !(0.0..=1.0).contains(&p) {
            return Err(InferenceError::MalformedOutput(format!(
                "probability {p} outside [0, 1]"
            )));
        }
    }
    if ((negative + positive) - 1.0).abs() > PROBABILITY_TOLERANCE {
        return Err(InferenceError::MalformedOutput(format!(
            "probabilities sum to {}",
            negative + positive
        )));
    }

    debug!(
        label = label,
        probability_of_positive = positive,
        "Inference complete"
    );

    Ok(PredictionResult {
        label,
        probability_of_negative: negative,
        probability_of_positive: positive,
    })
}

fn check_shape(
    rows: usize,
    cols: usize,
    expected_rows: usize,
    expected_cols: usize,
) -> Result<(), InferenceError> {
    if rows != expected_rows || cols != expected_cols {
        return Err(InferenceError::ShapeMismatch {
            expected_rows,
            expected_cols,
            rows,
            cols,
        });
    }
    Ok(())
}
