//! HTTP routes and handlers

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::metrics;
use crate::predictor::PredictOptions;
use crate::state::AppState;
use urlguard_core::{parse_request, Error, PredictionResult};
use urlguard_reasoning::GEMINI_SUPPORTED;

/// Header carrying a per-request Gemini API key
pub const API_KEY_HEADER: &str = "x-gemini-api-key";

/// Header echoing the id assigned to a prediction request
pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/health", get(health_check))
        .route("/metrics", get(render_metrics))
        .route("/model/reload", post(reload_model))
        .fallback(fallback)
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
struct PredictParams {
    #[serde(default)]
    use_gemini: bool,
}

#[derive(Debug, Serialize)]
struct PredictResponse {
    url: String,

    #[serde(flatten)]
    result: PredictionResult,
}

async fn predict(
    State(state): State<AppState>,
    query: Result<Query<PredictParams>, QueryRejection>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let request_id = Uuid::new_v4();
    let use_gemini = query.as_ref().map_or(false, |Query(params)| params.use_gemini);
    let span = info_span!("predict", %request_id, use_gemini);

    let result = async move {
        let Query(params) =
            query.map_err(|rejection| AppError::Validation(rejection.body_text()))?;
        let Json(body) = payload.map_err(|rejection| AppError::Validation(rejection.body_text()))?;

        let prompt_template = body
            .get("prompt_template")
            .and_then(Value::as_str)
            .map(str::to_string);
        let request = parse_request(body)?;

        let api_key = headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.trim().is_empty());

        let options = PredictOptions {
            use_external: params.use_gemini,
            api_key,
            prompt_template: prompt_template.as_deref(),
            model_handle: None,
        };

        let classification = state.predictor.classify(&request, options).await?;
        info!(
            url = %classification.url,
            decision = %classification.result.decision,
            source = %classification.result.source,
            "prediction served"
        );

        Ok::<_, AppError>(Json(PredictResponse {
            url: classification.url,
            result: classification.result,
        }))
    }
    .instrument(span)
    .await;

    // Failed predictions carry the id too
    let mut response = result.into_response();
    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "model_loaded": state.predictor.models().is_loaded(),
        "gemini_available": GEMINI_SUPPORTED,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn render_metrics(State(state): State<AppState>) -> String {
    state.metrics_handle.render()
}

async fn reload_model(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let handle = state.predictor.reload_model().await?;
    Ok(Json(json!({
        "status": "reloaded",
        "model": handle.name(),
        "capability": handle.capability().as_str(),
    })))
}

async fn fallback() -> AppError {
    AppError::NotFound
}

/// Error handling
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    Configuration(String),
    ModelUnavailable(String),
    NotFound,
    Internal(String),
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        match err {
            Error::RequestValidation(msg) => AppError::Validation(msg),
            Error::Config(_) => AppError::Configuration(err.to_string()),
            Error::ModelLoad(_) => AppError::ModelUnavailable(err.to_string()),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            AppError::Validation(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "validation_error", msg)
            }
            AppError::Configuration(msg) => (StatusCode::BAD_REQUEST, "configuration_error", msg),
            AppError::ModelUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "model_unavailable", msg)
            }
            AppError::NotFound => (StatusCode::NOT_FOUND, "not_found", "Not found".to_string()),
            AppError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg)
            }
        };

        if status.is_server_error() {
            warn!(status = status.as_u16(), error = %message, "request failed");
        }
        if status == StatusCode::UNPROCESSABLE_ENTITY {
            metrics::record_error("validation");
        }

        let body = json!({
            "error": {
                "message": message,
                "type": kind,
            }
        });

        (status, Json(body)).into_response()
    }
}
