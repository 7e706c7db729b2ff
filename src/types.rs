use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct SentimentRequest {
    pub text: String,
    #[serde(default)]
    pub return_all_scores: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchSentimentRequest {
    pub texts: Vec<String>,
    #[serde(default)]
    pub return_all_scores: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SentimentResponse {
    pub label: String,
    pub score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_scores: Option<Vec<LabelScore>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f32,
}
