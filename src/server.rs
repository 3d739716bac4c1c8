use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    response::Html,
    routing::{get, post},
};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::{
    config::AppConfig,
    error::ServiceError,
    gateway::GenerationGateway,
    inference::{GenerateBody, GenerateResponse, InferenceParameters},
    retry::RetryPolicy,
};

pub const EMPTY_PROMPT_MESSAGE: &str = "Please enter a prompt!";

const INDEX_HTML: &str = include_str!("../static/index.html");

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub gateway: Arc<GenerationGateway>,
}

#[derive(Serialize)]
struct MetadataResponse {
    model: String,
    parameters: InferenceParameters,
    retry: RetryPolicy,
    default_timeout_secs: u64,
    min_timeout_secs: u64,
    max_timeout_secs: u64,
}

pub fn build_router(config: Arc<AppConfig>, gateway: Arc<GenerationGateway>) -> Router {
    let state = AppState { config, gateway };

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/metadata", get(metadata))
        .route("/generate", post(generate))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> &'static str {
    "ok"
}

async fn metadata(State(state): State<AppState>) -> Json<MetadataResponse> {
    Json(MetadataResponse {
        model: state.gateway.model_id().to_string(),
        parameters: state.gateway.parameters(),
        retry: state.gateway.retry_policy(),
        default_timeout_secs: state.config.default_timeout_secs,
        min_timeout_secs: state.config.min_timeout_secs,
        max_timeout_secs: state.config.max_timeout_secs,
    })
}

async fn generate(
    State(state): State<AppState>,
    Json(body): Json<GenerateBody>,
) -> Result<Json<GenerateResponse>, ServiceError> {
    if body.prompt.trim().is_empty() {
        warn!("rejecting empty prompt");
        return Err(ServiceError::BadRequest(EMPTY_PROMPT_MESSAGE.into()));
    }

    let timeout_secs = body
        .timeout_seconds
        .unwrap_or(state.config.default_timeout_secs);
    if !state.config.timeout_in_range(timeout_secs) {
        return Err(ServiceError::BadRequest(format!(
            "timeout_seconds must be between {} and {}",
            state.config.min_timeout_secs, state.config.max_timeout_secs
        )));
    }

    info!(timeout_secs, "generating image");
    let image = state.gateway.generate(&body.prompt, timeout_secs).await?;

    let (image, data_url) = tokio::task::spawn_blocking(move || {
        let url = image.to_data_url();
        (image, url)
    })
    .await
    .map_err(|err| ServiceError::Other(format!("encoding task failed: {err}")))?;
    let data_url =
        data_url.map_err(|err| ServiceError::Other(format!("failed to encode image: {err}")))?;

    Ok(Json(GenerateResponse {
        image: data_url,
        width: image.width(),
        height: image.height(),
        model: image.metadata.model.clone(),
        attempts: image.metadata.attempts,
        elapsed_ms: image.metadata.elapsed_ms,
    }))
}
