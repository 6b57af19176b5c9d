//! HTTP request handlers

use crate::context::AppContext;
use crate::dashboard::form::PatientForm;
use crate::dashboard::render::{self, Tab};
use crate::error::{PredictError, ValidationError};
use crate::metrics::MetricsSnapshot;
use crate::models::loader::ArtifactSlot;
use crate::types::patient::PatientInput;
use crate::types::prediction::RiskAssessment;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

// ============================================================================
// Dashboard pages
// ============================================================================

pub async fn index() -> Redirect {
    Redirect::to("/predict")
}

pub async fn predict_form(State(context): State<Arc<AppContext>>) -> Html<String> {
    let body = render::prediction_form(&[None; 8], context.assembler.zero_policy());
    Html(render::page(
        Tab::Predict,
        &context.artifacts.inference_blockers(),
        &body,
    ))
}

pub async fn predict_submit(
    State(context): State<Arc<AppContext>>,
    Form(form): Form<PatientForm>,
) -> Html<String> {
    let outcome = form
        .to_input()
        .map_err(|e| context.reject(e))
        .and_then(|input| context.assess(&input));

    let mut body = render::prediction_form(&form.raw_values(), context.assembler.zero_policy());
    match &outcome {
        Ok(assessment) => body.push_str(&render::assessment(assessment)),
        Err(e) => body.push_str(&render::predict_error(e)),
    }

    Html(render::page(
        Tab::Predict,
        &context.artifacts.inference_blockers(),
        &body,
    ))
}

pub async fn eda(State(context): State<Arc<AppContext>>) -> Html<String> {
    let summary = context.artifacts.dataset.get().map(|d| d.summary());
    let body = render::eda(summary.as_ref(), &context.assets);
    Html(render::page(Tab::Eda, &context.artifacts.diagnostics(), &body))
}

pub async fn clusters(State(context): State<Arc<AppContext>>) -> Html<String> {
    let body = render::clusters(&context.assets);
    Html(render::page(
        Tab::Clusters,
        &context.artifacts.diagnostics(),
        &body,
    ))
}

pub async fn report(State(context): State<Arc<AppContext>>) -> Html<String> {
    let body = render::report(&context.assets);
    Html(render::page(
        Tab::Report,
        &context.artifacts.diagnostics(),
        &body,
    ))
}

/// Serve a display asset by plain file name
pub async fn asset(
    State(context): State<Arc<AppContext>>,
    Path(name): Path<String>,
) -> Response {
    let Some(path) = context.assets.resolve(&name) else {
        warn!(name = %name, "Rejected asset request");
        return (StatusCode::BAD_REQUEST, "invalid asset name").into_response();
    };

    match tokio::fs::read(&path).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, content_type(&name))], bytes).into_response(),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Asset not served");
            (StatusCode::NOT_FOUND, "asset not found").into_response()
        }
    }
}

fn content_type(name: &str) -> &'static str {
    let ext = name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("svg") => "image/svg+xml",
        Some("csv") => "text/csv; charset=utf-8",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

// ============================================================================
// JSON API
// ============================================================================

/// Error body returned by the JSON API
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,
}

impl From<PredictError> for ApiError {
    fn from(error: PredictError) -> Self {
        let message = error.to_string();
        match error {
            PredictError::Unavailable { missing } => ApiError {
                status: StatusCode::SERVICE_UNAVAILABLE,
                error: "unavailable",
                message,
                field: None,
                missing,
            },
            PredictError::Validation(e) => ApiError {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                error: "validation",
                message,
                field: e.field(),
                missing: Vec::new(),
            },
            PredictError::Inference(_) => ApiError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: "inference",
                message,
                field: None,
                missing: Vec::new(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Score a JSON submission.
///
/// The body is read as a plain JSON value so that wrongly typed fields are
/// reported, and counted, like any other validation failure.
pub async fn api_predict(
    State(context): State<Arc<AppContext>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<RiskAssessment>, ApiError> {
    let input = match body {
        Ok(Json(value)) => PatientInput::from_json(&value),
        Err(rejection) => Err(ValidationError::MalformedBody {
            reason: rejection.body_text(),
        }),
    }
    .map_err(|e| context.reject(e))?;

    Ok(Json(context.assess(&input)?))
}

/// Load status of one artifact or asset
#[derive(Debug, Serialize)]
pub struct SlotStatus {
    pub loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SlotStatus {
    fn of_slot<T>(slot: &ArtifactSlot<T>) -> Self {
        Self {
            loaded: slot.is_loaded(),
            error: slot.missing().map(ToString::to_string),
        }
    }

    fn of_result<T, E: ToString>(result: &Result<T, E>) -> Self {
        Self {
            loaded: result.is_ok(),
            error: result.as_ref().err().map(ToString::to_string),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub inference_available: bool,
    pub scaler: SlotStatus,
    pub model: SlotStatus,
    pub dataset: SlotStatus,
    pub cluster_summary: SlotStatus,
    pub evaluation_report: SlotStatus,
}

pub async fn api_health(State(context): State<Arc<AppContext>>) -> Json<HealthResponse> {
    let artifacts = &context.artifacts;
    Json(HealthResponse {
        inference_available: context.inference_available(),
        scaler: SlotStatus::of_slot(&artifacts.scaler),
        model: SlotStatus::of_slot(&artifacts.model),
        dataset: SlotStatus::of_slot(&artifacts.dataset),
        cluster_summary: SlotStatus::of_result(&context.assets.cluster_summary),
        evaluation_report: SlotStatus::of_result(&context.assets.evaluation_report),
    })
}

pub async fn api_metrics(State(context): State<Arc<AppContext>>) -> Json<MetricsSnapshot> {
    Json(context.metrics.snapshot())
}
