//! Read-only application context built once at startup

use crate::assets::SupportingAssets;
use crate::config::AppConfig;
use crate::error::{PredictError, ValidationError};
use crate::feature_assembler::FeatureAssembler;
use crate::metrics::PredictionMetrics;
use crate::models::inference::infer;
use crate::models::loader::{ArtifactLoader, LoadedArtifacts};
use crate::types::patient::PatientInput;
use crate::types::prediction::RiskAssessment;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Everything request handlers need, loaded once and shared by reference.
///
/// Artifacts are never reloaded; a restart picks up changed files.
pub struct AppContext {
    pub config: AppConfig,
    pub artifacts: LoadedArtifacts,
    pub assets: SupportingAssets,
    pub assembler: FeatureAssembler,
    pub metrics: Arc<PredictionMetrics>,
}

impl AppContext {
    /// Load artifacts and assets described by `config`.
    ///
    /// Never fails: absent artifacts leave the dashboard running degraded.
    pub fn load(config: AppConfig) -> Self {
        let artifacts = ArtifactLoader::new(&config.artifacts).load();
        let assets = SupportingAssets::load(&config.assets);
        Self::from_parts(config, artifacts, assets)
    }

    pub fn from_parts(
        config: AppConfig,
        artifacts: LoadedArtifacts,
        assets: SupportingAssets,
    ) -> Self {
        let assembler = FeatureAssembler::new(config.validation.zero_policy);
        info!(
            zero_policy = ?assembler.zero_policy(),
            inference_available = artifacts.inference_blockers().is_empty(),
            "Application context ready"
        );

        Self {
            config,
            artifacts,
            assets,
            assembler,
            metrics: Arc::new(PredictionMetrics::new()),
        }
    }

    /// Whether both the scaler and the classifier are loaded
    pub fn inference_available(&self) -> bool {
        self.artifacts.scaler.is_loaded() && self.artifacts.model.is_loaded()
    }

    /// Validate one submission and score it.
    ///
    /// Validation runs first so bad input is reported even when the
    /// artifacts are absent; the pipeline only runs with both present.
    pub fn assess(&self, input: &PatientInput) -> Result<RiskAssessment, PredictError> {
        let start = Instant::now();

        let vector = self.assembler.assemble(input).map_err(|e| {
            self.metrics.record_rejection();
            debug!(field = ?e.field(), error = %e, "Submission rejected");
            PredictError::from(e)
        })?;

        let (Some(scaler), Some(model)) =
            (self.artifacts.scaler.get(), self.artifacts.model.get())
        else {
            self.metrics.record_unavailable();
            return Err(PredictError::Unavailable {
                missing: self.artifacts.inference_blockers(),
            });
        };

        let prediction = infer(&vector, scaler.as_ref(), model.as_ref()).map_err(|e| {
            self.metrics.record_inference_failure();
            warn!(error = %e, "Inference failed");
            PredictError::from(e)
        })?;

        let processing_time = start.elapsed();
        self.metrics.record_prediction(processing_time, &prediction);

        let assessment = RiskAssessment::new(vector, prediction);
        info!(
            assessment_id = %assessment.assessment_id,
            label = prediction.label,
            probability_of_positive = prediction.probability_of_positive,
            processing_time_us = processing_time.as_micros(),
            "Risk assessed"
        );
        Ok(assessment)
    }

    /// Convenience for callers holding only a validation outcome
    pub fn reject(&self, error: ValidationError) -> PredictError {
        self.metrics.record_rejection();
        PredictError::Validation(error)
    }
}
