//! Fitted model artifacts and the inference pipeline over them

pub mod classifier;
pub mod inference;
pub mod loader;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod scaler;

pub use classifier::{Classifier, ClassifierArtifact};
pub use inference::infer;
pub use loader::{ArtifactLoader, ArtifactSlot, LoadedArtifacts};
pub use scaler::{Scaler, ScalerArtifact};

use crate::error::InferenceError;
use ndarray::ArrayView2;

/// Input matrices must have exactly the columns a fitted artifact expects
pub(crate) fn check_columns(x: ArrayView2<'_, f64>, width: usize) -> Result<(), InferenceError> {
    if x.ncols() != width {
        return Err(InferenceError::ShapeMismatch {
            expected_rows: x.nrows(),
            expected_cols: width,
            rows: x.nrows(),
            cols: x.ncols(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_check_columns() {
        let x = Array2::<f64>::zeros((1, 7));
        assert!(check_columns(x.view(), 7).is_ok());
        assert!(matches!(
            check_columns(x.view(), 8),
            Err(InferenceError::ShapeMismatch { expected_cols: 8, cols: 7, .. })
        ));
    }
}
