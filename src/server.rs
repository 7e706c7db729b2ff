use axum::{
    Router,
    extract::State,
    response::Json,
    routing::{get, post},
};
use metrics::counter;
use std::sync::Arc;

use crate::engine::SentimentEngine;
use crate::error::ApiError;
use crate::types::{BatchSentimentRequest, SentimentRequest, SentimentResponse};

/// Minimum number of characters, after trimming whitespace, for a text to be
/// worth scoring.
pub const MIN_TEXT_CHARS: usize = 3;

#[derive(Clone)]
pub struct AppState {
    engine: Arc<dyn SentimentEngine>,
}

impl AppState {
    pub fn new(engine: Arc<dyn SentimentEngine>) -> Self {
        Self { engine }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/analyze/", post(analyze_handler))
        .route("/analyze/batch/", post(analyze_batch_handler))
        .with_state(state)
}

async fn root_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Welcome to the Sentiment Analysis API. Use /analyze/ endpoint to analyze text sentiment."
    }))
}

#[tracing::instrument(skip(state, request), fields(text_len = request.text.len()))]
async fn analyze_handler(
    State(state): State<AppState>,
    Json(request): Json<SentimentRequest>,
) -> Result<Json<SentimentResponse>, ApiError> {
    counter!("analyze_requests_total").increment(1);

    if request.text.trim().chars().count() < MIN_TEXT_CHARS {
        return Err(ApiError::invalid_input(
            "text is too short for sentiment analysis",
        ));
    }

    let mut results = state
        .engine
        .analyze(vec![request.text], request.return_all_scores)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Sentiment analysis failed");
            ApiError::inference(e.to_string())
        })?;

    let response = results
        .pop()
        .ok_or_else(|| ApiError::inference("model returned no prediction"))?;

    tracing::info!(label = %response.label, "Sentiment analysis completed");
    Ok(Json(response))
}

#[tracing::instrument(skip(state, request), fields(text_count = request.texts.len()))]
async fn analyze_batch_handler(
    State(state): State<AppState>,
    Json(request): Json<BatchSentimentRequest>,
) -> Result<Json<Vec<SentimentResponse>>, ApiError> {
    counter!("analyze_batch_requests_total").increment(1);

    if request.texts.is_empty() {
        return Err(ApiError::invalid_input("no texts provided for analysis"));
    }

    let results = state
        .engine
        .analyze(request.texts, request.return_all_scores)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Batch sentiment analysis failed");
            ApiError::inference(e.to_string())
        })?;

    tracing::info!(response_count = results.len(), "Batch analysis completed");
    Ok(Json(results))
}
