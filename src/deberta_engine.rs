use anyhow::{Result, bail};
use async_trait::async_trait;
use candle_core::utils::{cuda_is_available, metal_is_available};
use candle_core::{Device, Tensor};
use candle_nn::VarBuilder;
use candle_nn::ops::softmax;
use candle_transformers::models::debertav2::{
    Config as DebertaV2Config, DTYPE, DebertaV2SeqClassificationModel, Id2Label,
};
use hf_hub::{Repo, RepoType, api::tokio::Api};
use std::collections::HashMap;
use std::path::PathBuf;
use tokenizers::{PaddingParams, Tokenizer, TruncationParams};

use crate::engine::SentimentEngine;
use crate::types::{LabelScore, SentimentResponse};

#[derive(Debug, Clone)]
pub struct DebertaConfig {
    pub model_id: Option<String>,
    pub model_path: Option<PathBuf>,
    pub revision: String,
    pub use_pth: bool,
    pub cpu: bool,
    pub max_sequence_length: usize,
    pub id2label: Option<HashMap<u32, String>>,
}

impl Default for DebertaConfig {
    fn default() -> Self {
        Self {
            model_id: None,
            model_path: None,
            revision: "main".to_string(),
            use_pth: false,
            cpu: false,
            max_sequence_length: 512,
            id2label: None,
        }
    }
}

/// Sentiment classifier backed by a DeBERTa-v2 sequence-classification
/// checkpoint. Loaded once at startup and shared read-only across requests.
pub struct DebertaSentimentEngine {
    model: DebertaV2SeqClassificationModel,
    tokenizer: Tokenizer,
    device: Device,
    id2label: Id2Label,
}

impl DebertaSentimentEngine {
    fn device(cpu: bool) -> Result<Device> {
        if cpu {
            Ok(Device::Cpu)
        } else if metal_is_available() {
            tracing::info!("Using metal acceleration");
            Ok(Device::new_metal(0)?)
        } else if cuda_is_available() {
            tracing::info!("Using CUDA GPU acceleration");
            Ok(Device::new_cuda(0)?)
        } else {
            tracing::info!(
                "CUDA not available, running on CPU. To run on GPU, build with `--features cuda`"
            );
            Ok(Device::Cpu)
        }
    }

    /// Resolves config.json, tokenizer.json, and the weights file either from
    /// a local model directory or from the Hugging Face Hub.
    async fn resolve_files(config: &DebertaConfig) -> Result<(PathBuf, PathBuf, PathBuf)> {
        if let Some(base_path) = &config.model_path {
            if !base_path.is_dir() {
                bail!("Model path {} is not a directory.", base_path.display());
            }

            let weights_file = if config.use_pth {
                base_path.join("pytorch_model.bin")
            } else {
                base_path.join("model.safetensors")
            };
            return Ok((
                base_path.join("config.json"),
                base_path.join("tokenizer.json"),
                weights_file,
            ));
        }

        let Some(model_id) = &config.model_id else {
            bail!("Either model_id or model_path must be specified");
        };

        let repo = Repo::with_revision(
            model_id.clone(),
            RepoType::Model,
            config.revision.clone(),
        );
        let api = Api::new()?.repo(repo);
        let config_file = api.get("config.json").await?;
        let tokenizer_file = api.get("tokenizer.json").await?;
        let weights_file = if config.use_pth {
            api.get("pytorch_model.bin").await?
        } else {
            api.get("model.safetensors").await?
        };
        Ok((config_file, tokenizer_file, weights_file))
    }

    #[tracing::instrument(skip(config), fields(model_id = ?config.model_id, cpu = config.cpu))]
    pub async fn new(config: DebertaConfig) -> Result<Self> {
        let device = Self::device(config.cpu)?;
        let (config_file, tokenizer_file, weights_file) = Self::resolve_files(&config).await?;

        let model_config: DebertaV2Config =
            serde_json::from_str(&std::fs::read_to_string(config_file)?)?;

        // An explicit id2label takes precedence over the checkpoint's mapping.
        let id2label = match (config.id2label, &model_config.id2label) {
            (Some(id2label), _) => id2label,
            (None, Some(id2label)) => id2label.clone(),
            (None, None) => {
                bail!("Id2Label not found in the model configuration nor specified as a parameter")
            }
        };

        let mut tokenizer = Tokenizer::from_file(tokenizer_file)
            .map_err(|e| anyhow::anyhow!("Tokenizer error: {e}"))?;
        tokenizer.with_padding(Some(PaddingParams::default()));
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: config.max_sequence_length,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("Tokenizer truncation error: {e}"))?;

        let vb = if config.use_pth {
            VarBuilder::from_pth(&weights_file, DTYPE, &device)?
        } else {
            unsafe { VarBuilder::from_mmaped_safetensors(&[weights_file], DTYPE, &device)? }
        };

        let vb = vb.set_prefix("deberta");
        let model =
            DebertaV2SeqClassificationModel::load(vb, &model_config, Some(id2label.clone()))?;

        Ok(Self {
            model,
            tokenizer,
            device,
            id2label,
        })
    }

    fn label_for(&self, class_id: u32) -> String {
        self.id2label
            .get(&class_id)
            .cloned()
            .unwrap_or_else(|| format!("LABEL_{class_id}"))
    }
}

#[async_trait]
impl SentimentEngine for DebertaSentimentEngine {
    #[tracing::instrument(skip(self, texts), fields(text_count = texts.len()))]
    async fn analyze(
        &self,
        texts: Vec<String>,
        return_all_scores: bool,
    ) -> Result<Vec<SentimentResponse>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        // Tokenization is CPU-bound, keep it off the async worker.
        let tokenizer = self.tokenizer.clone();
        let encodings = tokio::task::spawn_blocking(move || {
            tokenizer
                .encode_batch(texts, true)
                .map_err(|e| anyhow::anyhow!("Tokenization error: {e}"))
        })
        .await??;

        let mut input_ids = Vec::with_capacity(encodings.len());
        let mut attention_mask = Vec::with_capacity(encodings.len());
        let mut token_type_ids = Vec::with_capacity(encodings.len());
        for encoding in &encodings {
            input_ids.push(Tensor::new(encoding.get_ids(), &self.device)?);
            attention_mask.push(Tensor::new(encoding.get_attention_mask(), &self.device)?);
            token_type_ids.push(Tensor::new(encoding.get_type_ids(), &self.device)?);
        }

        let input_ids = Tensor::stack(&input_ids, 0)?;
        let attention_mask = Tensor::stack(&attention_mask, 0)?;
        let token_type_ids = Tensor::stack(&token_type_ids, 0)?;

        let logits = self
            .model
            .forward(&input_ids, Some(token_type_ids), Some(attention_mask))?;
        let predictions = logits.argmax(1)?.to_vec1::<u32>()?;
        let probabilities = softmax(&logits, 1)?.to_vec2::<f32>()?;

        let responses = predictions
            .iter()
            .zip(probabilities.iter())
            .map(|(&class_id, class_probs)| {
                let score = class_probs
                    .get(class_id as usize)
                    .copied()
                    .unwrap_or_default();
                let all_scores = return_all_scores.then(|| {
                    class_probs
                        .iter()
                        .enumerate()
                        .map(|(id, &score)| LabelScore {
                            label: self.label_for(id as u32),
                            score,
                        })
                        .collect()
                });

                SentimentResponse {
                    label: self.label_for(class_id),
                    score,
                    all_scores,
                }
            })
            .collect();

        Ok(responses)
    }
}
