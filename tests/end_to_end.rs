//! End-to-end tests over the shipped fixture artifacts

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
};
use diabetes_risk::{
    config::AppConfig,
    dashboard,
    error::{PredictError, ValidationError},
    types::{PatientInput, RiskLevel},
    AppContext,
};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt;

fn fixture_config() -> AppConfig {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"));
    let mut config = AppConfig::default();
    config.artifacts.scaler_path = root.join("fixtures/scaler.json");
    config.artifacts.model_path = root.join("fixtures/model.json");
    config.artifacts.dataset_path = Some(root.join("fixtures/diabetes.csv"));
    config.assets.dir = root.join("fixtures/assets");
    config
}

fn without_scaler() -> AppConfig {
    let mut config = fixture_config();
    config.artifacts.scaler_path = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/absent.json");
    config
}

async fn get(context: Arc<AppContext>, uri: &str) -> (StatusCode, String) {
    let response = dashboard::router(context)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8_lossy(&bytes).into_owned())
}

async fn post(
    context: Arc<AppContext>,
    uri: &str,
    content_type: &str,
    body: String,
) -> (StatusCode, Option<String>, String) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", content_type)
        .body(Body::from(body))
        .unwrap();
    let response = dashboard::router(context).oneshot(request).await.unwrap();
    let status = response.status();
    let response_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, response_type, String::from_utf8_lossy(&bytes).into_owned())
}

async fn post_json(context: Arc<AppContext>, body: Value) -> (StatusCode, Value) {
    let (status, _, text) =
        post(context, "/api/predict", "application/json", body.to_string()).await;
    (status, serde_json::from_str(&text).unwrap())
}

async fn post_form(context: Arc<AppContext>, body: &str) -> (StatusCode, String) {
    let (status, _, html) = post(
        context,
        "/predict",
        "application/x-www-form-urlencoded",
        body.to_string(),
    )
    .await;
    (status, html)
}

const SCENARIO_A_FORM: &str = "pregnancies=1&glucose=120&blood_pressure=70&skin_thickness=20\
&insulin=80&bmi=30&diabetes_pedigree_function=0.470&age=30";

#[test]
fn typical_patient_is_low_risk() {
    let context = AppContext::load(fixture_config());
    let input = PatientInput::from_values([1.0, 120.0, 70.0, 20.0, 80.0, 30.0, 0.470, 30.0]);

    let assessment = context.assess(&input).unwrap();
    assert_eq!(assessment.prediction.label, 0);
    assert_eq!(assessment.risk_level, RiskLevel::Low);
    assert!((assessment.prediction.probability_of_positive - 0.188_181_918_929_689_8).abs() < 1e-12);
    assert!(
        (assessment.prediction.probability_of_negative
            + assessment.prediction.probability_of_positive
            - 1.0)
            .abs()
            < 1e-9
    );
}

#[test]
fn all_zero_submission_is_scored_without_error() {
    let context = AppContext::load(fixture_config());
    let assessment = context.assess(&PatientInput::from_values([0.0; 8])).unwrap();

    assert_eq!(assessment.prediction.label, 0);
    assert!(assessment.prediction.probability_of_positive < 0.001);
}

#[test]
fn missing_scaler_blocks_prediction_only() {
    let context = AppContext::load(without_scaler());
    assert!(!context.inference_available());
    assert!(context.artifacts.model.is_loaded());
    assert!(context.assets.evaluation_report.is_ok());

    let input = PatientInput::from_values([1.0, 120.0, 70.0, 20.0, 80.0, 30.0, 0.470, 30.0]);
    match context.assess(&input) {
        Err(PredictError::Unavailable { missing }) => {
            assert_eq!(missing.len(), 1);
            assert!(missing[0].contains("absent.json"));
        }
        other => panic!("expected unavailable, got {other:?}"),
    }
}

#[test]
fn forest_model_loads_and_scores() {
    let mut config = fixture_config();
    config.artifacts.model_path = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/forest.json");
    let context = AppContext::load(config);

    let input = PatientInput::from_values([6.0, 148.0, 72.0, 35.0, 0.0, 33.6, 0.627, 50.0]);
    let assessment = context.assess(&input).unwrap();
    let p = assessment.prediction;
    assert!((p.probability_of_negative + p.probability_of_positive - 1.0).abs() < 1e-9);
    assert_eq!(p.label == 1, p.probability_of_positive > p.probability_of_negative);
}

#[tokio::test]
async fn report_tab_renders_without_scaler() {
    let context = Arc::new(AppContext::load(without_scaler()));

    let (status, html) = get(context.clone(), "/report").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("precision"));
    assert!(html.contains("absent.json"));

    let (status, html) = get(context, "/predict").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("absent.json"));
}

#[tokio::test]
async fn dashboard_tabs_render() {
    let context = Arc::new(AppContext::load(fixture_config()));

    let (status, html) = get(context.clone(), "/eda").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("20 patients"));
    assert!(html.contains("/assets/outcome_distribution.png"));
    assert!(!html.contains("class=\"warning\""));

    let (status, html) = get(context.clone(), "/clusters").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("/assets/clusters.png"));
    assert!(html.contains("62.4%"));

    let response = dashboard::router(context)
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(response.status().is_redirection());
}

#[tokio::test]
async fn form_submission_shows_result() {
    let context = Arc::new(AppContext::load(fixture_config()));
    let (status, html) = post_form(context, SCENARIO_A_FORM).await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Low risk of diabetes"));
    assert!(html.contains("18.8%"));
}

#[tokio::test]
async fn form_rejections_render_as_warnings() {
    let context = Arc::new(AppContext::load(fixture_config()));

    let negative = SCENARIO_A_FORM.replace("glucose=120", "glucose=-5");
    let (status, html) = post_form(context.clone(), &negative).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("class=\"warning\">Invalid input"));
    assert!(html.contains("must not be negative"));
    assert!(!html.contains("class=\"success\""));

    let unparseable = SCENARIO_A_FORM.replace("bmi=30", "bmi=heavy");
    let (status, html) = post_form(context.clone(), &unparseable).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("is not a number"));
    // The submitted text is kept in the form
    assert!(html.contains("value=\"heavy\""));

    assert_eq!(context.metrics.snapshot().validation_rejections, 2);
    assert_eq!(context.metrics.snapshot().predictions_served, 0);
}

#[tokio::test]
async fn form_submission_without_scaler_warns() {
    let context = Arc::new(AppContext::load(without_scaler()));
    let (status, html) = post_form(context.clone(), SCENARIO_A_FORM).await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("not loaded"));
    assert!(!html.contains("class=\"success\""));
    assert_eq!(context.metrics.snapshot().unavailable_requests, 1);
}

#[tokio::test]
async fn api_predict_statuses() {
    let context = Arc::new(AppContext::load(fixture_config()));
    let patient = json!({
        "Pregnancies": 1, "Glucose": 120, "BloodPressure": 70, "SkinThickness": 20,
        "Insulin": 80, "BMI": 30, "DiabetesPedigreeFunction": 0.47, "Age": 30
    });

    let (status, body) = post_json(context.clone(), patient.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"]["label"], 0);
    assert_eq!(body["risk_level"], "low");

    let mut negative = patient.clone();
    negative["Age"] = json!(-1);
    let (status, body) = post_json(context.clone(), negative).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation");
    assert_eq!(body["field"], "age");

    let degraded = Arc::new(AppContext::load(without_scaler()));
    let (status, body) = post_json(degraded, patient).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "unavailable");
    assert_eq!(body["missing"].as_array().map(Vec::len), Some(1));

    let snapshot = context.metrics.snapshot();
    assert_eq!(snapshot.predictions_served, 1);
    assert_eq!(snapshot.validation_rejections, 1);
}

#[tokio::test]
async fn api_wrongly_typed_field_is_a_validation_error() {
    let context = Arc::new(AppContext::load(fixture_config()));
    let body = json!({
        "Pregnancies": 1, "Glucose": "high", "BloodPressure": 70, "SkinThickness": 20,
        "Insulin": 80, "BMI": 30, "DiabetesPedigreeFunction": 0.47, "Age": 30
    });

    let (status, content_type, text) =
        post(context.clone(), "/api/predict", "application/json", body.to_string()).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    let error: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(error["error"], "validation");
    assert_eq!(error["field"], "glucose");

    let (status, _, text) = post(
        context.clone(),
        "/api/predict",
        "application/json",
        "{\"Glucose\": 120,".to_string(),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let error: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(error["error"], "validation");
    assert!(error.get("field").is_none());

    assert_eq!(context.metrics.snapshot().validation_rejections, 2);
}

#[tokio::test]
async fn api_metrics_reports_counters() {
    let context = Arc::new(AppContext::load(fixture_config()));
    post_form(context.clone(), SCENARIO_A_FORM).await;
    post_form(context.clone(), "glucose=oops").await;

    let (status, body) = get(context, "/api/metrics").await;
    assert_eq!(status, StatusCode::OK);

    let metrics: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(metrics["predictions_served"], 1);
    assert_eq!(metrics["elevated_results"], 0);
    assert_eq!(metrics["validation_rejections"], 1);
    assert_eq!(metrics["processing"]["count"], 1);
    assert_eq!(metrics["probability_distribution"][1], 1);
}

#[tokio::test]
async fn api_health_reports_slots() {
    let context = Arc::new(AppContext::load(without_scaler()));
    let (status, body) = get(context, "/api/health").await;
    assert_eq!(status, StatusCode::OK);

    let health: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(health["inference_available"], false);
    assert_eq!(health["scaler"]["loaded"], false);
    assert_eq!(health["model"]["loaded"], true);
    assert_eq!(health["evaluation_report"]["loaded"], true);
}

#[tokio::test]
async fn assets_are_served_by_plain_name_only() {
    let context = Arc::new(AppContext::load(fixture_config()));

    let (status, _) = get(context.clone(), "/assets/cluster_summary.csv").await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = get(context.clone(), "/assets/..%2Fscaler.json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(context, "/assets/nope.png").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[test]
fn validation_error_names_field() {
    let context = AppContext::load(fixture_config());
    let mut input = PatientInput::from_values([1.0; 8]);
    input.bmi = None;

    assert!(matches!(
        context.assess(&input),
        Err(PredictError::Validation(ValidationError::Missing { field: "bmi" }))
    ));
}
