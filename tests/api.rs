//! HTTP endpoint tests driven through the Router with a stub engine, so no
//! model download is needed.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use tower::ServiceExt;

use sentimeter::engine::SentimentEngine;
use sentimeter::server::{AppState, router};
use sentimeter::types::{LabelScore, SentimentResponse};

/// Stub engine that labels every text POSITIVE with a fixed score.
struct StubEngine;

#[async_trait]
impl SentimentEngine for StubEngine {
    async fn analyze(
        &self,
        texts: Vec<String>,
        return_all_scores: bool,
    ) -> Result<Vec<SentimentResponse>> {
        Ok(texts
            .iter()
            .map(|_| SentimentResponse {
                label: "POSITIVE".to_string(),
                score: 0.98,
                all_scores: return_all_scores.then(|| {
                    vec![
                        LabelScore {
                            label: "NEGATIVE".to_string(),
                            score: 0.02,
                        },
                        LabelScore {
                            label: "POSITIVE".to_string(),
                            score: 0.98,
                        },
                    ]
                }),
            })
            .collect())
    }
}

/// Stub engine that always fails, for exercising the 500 path.
struct FailingEngine;

#[async_trait]
impl SentimentEngine for FailingEngine {
    async fn analyze(
        &self,
        _texts: Vec<String>,
        _return_all_scores: bool,
    ) -> Result<Vec<SentimentResponse>> {
        anyhow::bail!("model exploded")
    }
}

fn test_app() -> Router {
    router(AppState::new(Arc::new(StubEngine)))
}

fn post_json(uri: &str, payload: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("body should be valid json")
}

#[tokio::test]
async fn root_returns_welcome_message() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("request should succeed");

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert!(
        json["message"]
            .as_str()
            .expect("message should be a string")
            .contains("Sentiment Analysis")
    );
}

#[tokio::test]
async fn analyze_valid_text_returns_label_and_score() {
    let payload = serde_json::json!({ "text": "I love this product!" });
    let response = test_app()
        .oneshot(post_json("/analyze/", payload))
        .await
        .expect("request should succeed");

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["label"], "POSITIVE");
    assert!(json["score"].as_f64().unwrap() > 0.0);
    assert!(json.get("all_scores").is_none());
}

#[tokio::test]
async fn analyze_with_all_scores_returns_every_label() {
    let payload = serde_json::json!({ "text": "I love this product!", "return_all_scores": true });
    let response = test_app()
        .oneshot(post_json("/analyze/", payload))
        .await
        .expect("request should succeed");

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let all_scores = json["all_scores"].as_array().expect("all_scores present");
    assert_eq!(all_scores.len(), 2);
    assert_eq!(all_scores[0]["label"], "NEGATIVE");
    assert_eq!(all_scores[1]["label"], "POSITIVE");
}

#[tokio::test]
async fn analyze_short_text_returns_400() {
    let payload = serde_json::json!({ "text": "ok" });
    let response = test_app()
        .oneshot(post_json("/analyze/", payload))
        .await
        .expect("request should succeed");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "invalid_input");
}

#[tokio::test]
async fn analyze_whitespace_padded_short_text_returns_400() {
    // Trimmed length is what counts, not raw length.
    let payload = serde_json::json!({ "text": "   a    " });
    let response = test_app()
        .oneshot(post_json("/analyze/", payload))
        .await
        .expect("request should succeed");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn analyze_invalid_json_returns_client_error() {
    let request = Request::builder()
        .method("POST")
        .uri("/analyze/")
        .header("content-type", "application/json")
        .body(Body::from("{ invalid json"))
        .unwrap();

    let response = test_app()
        .oneshot(request)
        .await
        .expect("request should succeed");

    assert!(
        response.status().is_client_error(),
        "expected 4xx, got: {}",
        response.status()
    );
}

#[tokio::test]
async fn analyze_inference_failure_returns_500() {
    let app = router(AppState::new(Arc::new(FailingEngine)));

    let payload = serde_json::json!({ "text": "this will not go well" });
    let response = app
        .oneshot(post_json("/analyze/", payload))
        .await
        .expect("request should succeed");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "inference_error");
    assert!(
        json["error"]["message"]
            .as_str()
            .unwrap()
            .contains("model exploded")
    );
}

#[tokio::test]
async fn batch_returns_one_response_per_text() {
    let payload = serde_json::json!({ "texts": ["Great!", "Terrible.", "Fine I guess."] });
    let response = test_app()
        .oneshot(post_json("/analyze/batch/", payload))
        .await
        .expect("request should succeed");

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let responses = json.as_array().expect("batch response is a list");
    assert_eq!(responses.len(), 3);
    for entry in responses {
        assert_eq!(entry["label"], "POSITIVE");
        assert!(entry.get("all_scores").is_none());
    }
}

#[tokio::test]
async fn batch_with_all_scores_populates_every_entry() {
    let payload = serde_json::json!({ "texts": ["Great!", "Terrible."], "return_all_scores": true });
    let response = test_app()
        .oneshot(post_json("/analyze/batch/", payload))
        .await
        .expect("request should succeed");

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    for entry in json.as_array().expect("batch response is a list") {
        assert_eq!(entry["all_scores"].as_array().unwrap().len(), 2);
    }
}

#[tokio::test]
async fn batch_empty_list_returns_400() {
    let payload = serde_json::json!({ "texts": [] });
    let response = test_app()
        .oneshot(post_json("/analyze/batch/", payload))
        .await
        .expect("request should succeed");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "invalid_input");
}

#[tokio::test]
async fn batch_inference_failure_returns_500() {
    let app = router(AppState::new(Arc::new(FailingEngine)));

    let payload = serde_json::json!({ "texts": ["boom"] });
    let response = app
        .oneshot(post_json("/analyze/batch/", payload))
        .await
        .expect("request should succeed");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
