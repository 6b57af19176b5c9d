//! Artifact loader for the fitted scaler, classifier and reference dataset

use crate::config::ArtifactsConfig;
use crate::dataset::ReferenceDataset;
use crate::error::{ArtifactKind, ArtifactMissing};
use crate::models::classifier::{Classifier, ClassifierArtifact};
use crate::models::scaler::{Scaler, ScalerArtifact};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Either a loaded artifact or the reason it is absent
#[derive(Debug, Clone)]
pub enum ArtifactSlot<T> {
    Loaded(T),
    Absent(ArtifactMissing),
}

impl<T> ArtifactSlot<T> {
    pub fn get(&self) -> Option<&T> {
        match self {
            ArtifactSlot::Loaded(value) => Some(value),
            ArtifactSlot::Absent(_) => None,
        }
    }

    pub fn missing(&self) -> Option<&ArtifactMissing> {
        match self {
            ArtifactSlot::Loaded(_) => None,
            ArtifactSlot::Absent(missing) => Some(missing),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, ArtifactSlot::Loaded(_))
    }

    fn from_result(result: Result<T, ArtifactMissing>) -> Self {
        match result {
            Ok(value) => ArtifactSlot::Loaded(value),
            Err(missing) => ArtifactSlot::Absent(missing),
        }
    }
}

/// Everything the loader produced, one independent slot per artifact
#[derive(Clone)]
pub struct LoadedArtifacts {
    pub scaler: ArtifactSlot<Arc<dyn Scaler>>,
    pub model: ArtifactSlot<Arc<dyn Classifier>>,
    pub dataset: ArtifactSlot<Arc<ReferenceDataset>>,
}

impl LoadedArtifacts {
    /// User-facing diagnostics, one per absent artifact
    pub fn diagnostics(&self) -> Vec<String> {
        [
            self.scaler.missing(),
            self.model.missing(),
            self.dataset.missing(),
        ]
        .into_iter()
        .flatten()
        .map(ToString::to_string)
        .collect()
    }

    /// Diagnostics for the artifacts inference needs, empty when it can run
    pub fn inference_blockers(&self) -> Vec<String> {
        [self.scaler.missing(), self.model.missing()]
            .into_iter()
            .flatten()
            .map(ToString::to_string)
            .collect()
    }
}

/// Loader for the artifacts produced by the offline training job
pub struct ArtifactLoader {
    config: ArtifactsConfig,
}

impl ArtifactLoader {
    pub fn new(config: &ArtifactsConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Load every artifact. Each failure is isolated to its own slot and
    /// never stops the others from being attempted.
    pub fn load(&self) -> LoadedArtifacts {
        let scaler = ArtifactSlot::from_result(self.load_scaler(&self.config.scaler_path));
        let model = ArtifactSlot::from_result(self.load_model(&self.config.model_path));
        let dataset = match &self.config.dataset_path {
            Some(path) => ArtifactSlot::from_result(self.load_dataset(path)),
            None => ArtifactSlot::Absent(ArtifactMissing::new(
                ArtifactKind::Dataset,
                "",
                "no dataset path configured",
            )),
        };

        let artifacts = LoadedArtifacts {
            scaler,
            model,
            dataset,
        };

        for diagnostic in artifacts.diagnostics() {
            warn!(diagnostic = %diagnostic, "Artifact unavailable");
        }
        info!(
            scaler = artifacts.scaler.is_loaded(),
            model = artifacts.model.is_loaded(),
            dataset = artifacts.dataset.is_loaded(),
            "Artifact loading finished"
        );

        artifacts
    }

    /// Load a fitted scaler
    pub fn load_scaler(&self, path: &Path) -> Result<Arc<dyn Scaler>, ArtifactMissing> {
        let scaler: ScalerArtifact = read_json(ArtifactKind::Scaler, path)?;
        scaler
            .validate()
            .map_err(|reason| ArtifactMissing::new(ArtifactKind::Scaler, path, reason))?;

        info!(path = %path.display(), kind = scaler.name(), "Scaler loaded");
        Ok(Arc::new(scaler))
    }

    /// Load a fitted classifier, dispatching on the file extension
    pub fn load_model(&self, path: &Path) -> Result<Arc<dyn Classifier>, ArtifactMissing> {
        if path.extension().is_some_and(|ext| ext == "onnx") {
            return load_onnx(path);
        }

        let model: ClassifierArtifact = read_json(ArtifactKind::Model, path)?;
        model
            .validate()
            .map_err(|reason| ArtifactMissing::new(ArtifactKind::Model, path, reason))?;

        info!(path = %path.display(), kind = model.name(), "Classifier loaded");
        Ok(Arc::new(model))
    }

    /// Load the reference dataset
    pub fn load_dataset(&self, path: &Path) -> Result<Arc<ReferenceDataset>, ArtifactMissing> {
        let dataset = ReferenceDataset::from_csv(path)
            .map_err(|reason| ArtifactMissing::new(ArtifactKind::Dataset, path, reason))?;

        info!(path = %path.display(), rows = dataset.len(), "Reference dataset loaded");
        Ok(Arc::new(dataset))
    }
}

fn read_json<T: DeserializeOwned>(kind: ArtifactKind, path: &Path) -> Result<T, ArtifactMissing> {
    let bytes = std::fs::read(path).map_err(|e| ArtifactMissing::new(kind, path, e))?;
    serde_json::from_slice(&bytes).map_err(|e| ArtifactMissing::new(kind, path, e))
}

#[cfg(feature = "onnx")]
fn load_onnx(path: &Path) -> Result<Arc<dyn Classifier>, ArtifactMissing> {
    crate::models::onnx::OnnxClassifier::load(path)
        .map(|model| Arc::new(model) as Arc<dyn Classifier>)
        .map_err(|e| ArtifactMissing::new(ArtifactKind::Model, path, format!("{e:#}")))
}

#[cfg(not(feature = "onnx"))]
fn load_onnx(path: &Path) -> Result<Arc<dyn Classifier>, ArtifactMissing> {
    Err(ArtifactMissing::new(
        ArtifactKind::Model,
        path,
        "ONNX models need the `onnx` feature",
    ))
}
