use crate::types::SentimentResponse;
use anyhow::Result;
use async_trait::async_trait;

/// Seam between the HTTP layer and the loaded model. Returns one response per
/// input text, in input order.
#[async_trait]
pub trait SentimentEngine: Send + Sync {
    async fn analyze(
        &self,
        texts: Vec<String>,
        return_all_scores: bool,
    ) -> Result<Vec<SentimentResponse>>;
}
