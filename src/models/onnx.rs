//! ONNX Runtime classifier backend for `.onnx` model artifacts

use crate::error::InferenceError;
use crate::models::check_columns;
use crate::models::classifier::Classifier;
use crate::types::patient::FEATURE_COUNT;
use anyhow::{anyhow, Context, Result};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use ort::memory::Allocator;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::{DynMapValueType, DynSequenceValueType, DynValue, Tensor};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// A binary classifier exported to ONNX.
///
/// The probability output may be a `[1, 2]` float tensor or the
/// `seq(map(int64, float))` form written by the default ZipMap exporter.
/// The label output is optional; without it the label is the argmax of the
/// probabilities, ties going to class 0.
pub struct OnnxClassifier {
    session: Mutex<Session>,
    input_name: String,
    label_output: Option<String>,
    proba_output: String,
}

impl OnnxClassifier {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        ort::init().commit()?;

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(1)?
            .commit_from_file(path)
            .with_context(|| format!("Failed to open ONNX classifier {}", path.display()))?;

        let input_name = match session.inputs.as_slice() {
            [input] => input.name.clone(),
            inputs => return Err(anyhow!("expected one feature input, found {}", inputs.len())),
        };
        let output_named = |needle: &str| {
            session
                .outputs
                .iter()
                .find(|o| o.name.contains(needle))
                .map(|o| o.name.clone())
        };
        let proba_output = output_named("prob").context("no probability output")?;
        let label_output = output_named("label");

        info!(
            path = %path.display(),
            input = %input_name,
            probabilities = %proba_output,
            label = ?label_output,
            "ONNX classifier loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            label_output,
            proba_output,
        })
    }

    /// Score one scaled row with a single session run
    fn score_row(&self, row: ArrayView1<'_, f64>) -> Result<(u8, [f64; 2]), InferenceError> {
        let features: Vec<f32> = row.iter().map(|&v| v as f32).collect();
        let input = Tensor::from_array((vec![1_i64, features.len() as i64], features))
            .map_err(|e| InferenceError::Backend(e.to_string()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| InferenceError::Backend(format!("session lock poisoned: {e}")))?;
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input])
            .map_err(|e| InferenceError::Backend(e.to_string()))?;

        let proba_value = outputs.get(&self.proba_output).ok_or_else(|| {
            InferenceError::MalformedOutput(format!("missing output '{}'", self.proba_output))
        })?;
        let proba = extract_proba(proba_value)?;

        let raw_label = match &self.label_output {
            Some(name) => {
                let value = outputs.get(name).ok_or_else(|| {
                    InferenceError::MalformedOutput(format!("missing output '{name}'"))
                })?;
                let (_, labels) = value
                    .try_extract_tensor::<i64>()
                    .map_err(|e| InferenceError::MalformedOutput(e.to_string()))?;
                labels.first().copied()
            }
            None => None,
        };
        let label = resolve_label(raw_label, proba)?;

        debug!(label = label, p1 = proba[1], "ONNX row scored");
        Ok((label, proba))
    }
}

fn extract_proba(value: &DynValue) -> Result<[f64; 2], InferenceError> {
    if let Ok((_, data)) = value.try_extract_tensor::<f32>() {
        return proba_from_tensor(data);
    }

    let malformed = |e: ort::Error| InferenceError::MalformedOutput(e.to_string());
    let sequence = value
        .downcast_ref::<DynSequenceValueType>()
        .map_err(malformed)?;
    let maps = sequence
        .try_extract_sequence::<DynMapValueType>(&Allocator::default())
        .map_err(malformed)?;
    let first = maps
        .first()
        .ok_or_else(|| InferenceError::MalformedOutput("empty probability sequence".to_string()))?;
    let pairs = first.try_extract_key_values::<i64, f32>().map_err(malformed)?;
    proba_from_class_map(&pairs)
}

/// `[p0, p1]` from a single-row probability tensor
fn proba_from_tensor(data: &[f32]) -> Result<[f64; 2], InferenceError> {
    match data {
        [p0, p1] => Ok([f64::from(*p0), f64::from(*p1)]),
        other => Err(InferenceError::MalformedOutput(format!(
            "expected 2 class probabilities, got {}",
            other.len()
        ))),
    }
}

/// `[p0, p1]` from one ZipMap entry keyed by class id
fn proba_from_class_map(pairs: &[(i64, f32)]) -> Result<[f64; 2], InferenceError> {
    let class = |id: i64| {
        pairs
            .iter()
            .find(|(class_id, _)| *class_id == id)
            .map(|(_, p)| f64::from(*p))
    };
    if let Some((id, _)) = pairs.iter().find(|(id, _)| !(0..=1).contains(id)) {
        return Err(InferenceError::MalformedOutput(format!(
            "unexpected class id {id}"
        )));
    }
    match (class(0), class(1)) {
        (Some(p0), Some(p1)) => Ok([p0, p1]),
        (Some(p0), None) => Ok([p0, 1.0 - p0]),
        (None, Some(p1)) => Ok([1.0 - p1, p1]),
        (None, None) => Err(InferenceError::MalformedOutput(
            "no class probabilities".to_string(),
        )),
    }
}

fn resolve_label(raw: Option<i64>, proba: [f64; 2]) -> Result<u8, InferenceError> {
    match raw {
        Some(label @ 0..=1) => Ok(label as u8),
        Some(label) => Err(InferenceError::MalformedOutput(format!(
            "label {label} is not binary"
        ))),
        None => Ok(u8::from(proba[1] > proba[0])),
    }
}

impl Classifier for OnnxClassifier {
    fn n_features(&self) -> usize {
        FEATURE_COUNT
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<u8>, InferenceError> {
        self.predict_with_proba(x).map(|(labels, _)| labels)
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, InferenceError> {
        self.predict_with_proba(x).map(|(_, proba)| proba)
    }

    fn predict_with_proba(
        &self,
        x: ArrayView2<'_, f64>,
    ) -> Result<(Array1<u8>, Array2<f64>), InferenceError> {
        check_columns(x, self.n_features())?;
        let mut labels = Array1::zeros(x.nrows());
        let mut proba = Array2::zeros((x.nrows(), 2));
        for (idx, row) in x.rows().into_iter().enumerate() {
            let (label, [p0, p1]) = self.score_row(row)?;
            labels[idx] = label;
            proba[[idx, 0]] = p0;
            proba[[idx, 1]] = p1;
        }
        Ok((labels, proba))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tensor_probabilities() {
        assert_eq!(proba_from_tensor(&[0.25, 0.75]).unwrap(), [0.25, 0.75]);
        assert!(matches!(
            proba_from_tensor(&[1.0]),
            Err(InferenceError::MalformedOutput(_))
        ));
    }

    #[test]
    fn test_zipmap_probabilities() {
        assert_eq!(
            proba_from_class_map(&[(1, 0.75), (0, 0.25)]).unwrap(),
            [0.25, 0.75]
        );
        assert_eq!(proba_from_class_map(&[(1, 0.5)]).unwrap(), [0.5, 0.5]);
        assert!(proba_from_class_map(&[]).is_err());
        assert!(proba_from_class_map(&[(0, 0.4), (2, 0.6)]).is_err());
    }

    #[test]
    fn test_label_resolution() {
        assert_eq!(resolve_label(Some(1), [0.9, 0.1]).unwrap(), 1);
        assert_eq!(resolve_label(None, [0.3, 0.7]).unwrap(), 1);
        assert_eq!(resolve_label(None, [0.5, 0.5]).unwrap(), 0);
        assert!(resolve_label(Some(3), [0.5, 0.5]).is_err());
    }
}
