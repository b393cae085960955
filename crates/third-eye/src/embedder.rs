//! Local sentence embeddings for scoring final positions.
//!
//! Runs all-MiniLM-L6-v2 through candle on CPU: tokenize the batch, mean
//! pool the hidden states over the attention mask, L2 normalize. No network
//! dependency; deterministic for identical input text.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use candle_core::{Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config, DTYPE};
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer};
use tracing::info;

/// Where to find the local sentence-embedding model.
#[derive(Debug, Clone)]
pub struct EmbedderConfig {
    /// Directory holding config.json, tokenizer.json and model.safetensors
    pub model_dir: PathBuf,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models/all-MiniLM-L6-v2"),
        }
    }
}

/// Sentence embedder over a local BERT checkpoint.
pub struct Embedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
}

impl std::fmt::Debug for Embedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Embedder").finish_non_exhaustive()
    }
}

impl Embedder {
    /// Load the model from disk. Missing files are a configuration error,
    /// surfaced before any seed is processed.
    pub fn load(config: &EmbedderConfig) -> Result<Self> {
        let model_dir = config.model_dir.as_path();
        if !model_dir.is_dir() {
            bail!(
                "embedding model directory {} does not exist",
                model_dir.display()
            );
        }

        let device = Device::Cpu;

        let config_path = model_dir.join("config.json");
        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read model config {}", config_path.display()))?;
        let bert_config: Config =
            serde_json::from_str(&config_str).context("Failed to parse model config")?;

        let tokenizer_path = model_dir.join("tokenizer.json");
        let mut tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            anyhow::anyhow!("Failed to load tokenizer {}: {}", tokenizer_path.display(), e)
        })?;
        // Pad every batch to its longest sequence.
        if let Some(padding) = tokenizer.get_padding_mut() {
            padding.strategy = PaddingStrategy::BatchLongest;
        } else {
            tokenizer.with_padding(Some(PaddingParams {
                strategy: PaddingStrategy::BatchLongest,
                ..Default::default()
            }));
        }

        let weights_path = model_dir.join("model.safetensors");
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[&weights_path], DTYPE, &device) }
            .with_context(|| format!("Failed to map model weights {}", weights_path.display()))?;
        let model = BertModel::load(vb, &bert_config).context("Failed to load BERT model")?;

        info!(model_dir = %model_dir.display(), "embedding model loaded");

        Ok(Self {
            model,
            tokenizer,
            device,
        })
    }

    /// Embed a batch of texts: one L2-normalized vector per input, order
    /// preserved.
    pub fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow::anyhow!("Failed to tokenize batch: {}", e))?;

        let token_ids = encodings
            .iter()
            .map(|encoding| Ok(Tensor::new(encoding.get_ids(), &self.device)?))
            .collect::<Result<Vec<_>>>()?;
        let attention_mask = encodings
            .iter()
            .map(|encoding| Ok(Tensor::new(encoding.get_attention_mask(), &self.device)?))
            .collect::<Result<Vec<_>>>()?;

        let token_ids = Tensor::stack(&token_ids, 0)?;
        let attention_mask = Tensor::stack(&attention_mask, 0)?;
        let token_type_ids = token_ids.zeros_like()?;

        let hidden = self
            .model
            .forward(&token_ids, &token_type_ids, Some(&attention_mask))?;

        // Mean pool over real tokens only, then L2 normalize.
        let mask = attention_mask.to_dtype(DTYPE)?.unsqueeze(2)?;
        let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
        let counts = mask.sum(1)?;
        let pooled = summed.broadcast_div(&counts)?;
        let normalized = normalize_l2(&pooled)?;

        Ok(normalized.to_vec2::<f32>()?)
    }
}

fn normalize_l2(v: &Tensor) -> Result<Tensor> {
    Ok(v.broadcast_div(&v.sqr()?.sum_keepdim(1)?.sqrt()?)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::cosine_similarity;

    #[test]
    fn test_default_model_dir() {
        let config = EmbedderConfig::default();
        assert_eq!(config.model_dir, PathBuf::from("models/all-MiniLM-L6-v2"));
    }

    #[test]
    fn test_load_rejects_missing_directory() {
        let config = EmbedderConfig {
            model_dir: PathBuf::from("models/does-not-exist"),
        };
        let error = Embedder::load(&config).unwrap_err();
        assert!(error.to_string().contains("does not exist"));
    }

    #[test]
    #[ignore = "requires local all-MiniLM-L6-v2 model files under models/"]
    fn test_embeddings_are_unit_length() {
        let embedder = Embedder::load(&EmbedderConfig::default()).unwrap();
        let texts = vec![
            "The recipe is just a recipe.".to_string(),
            "The poem is about devotion.".to_string(),
        ];

        let embeddings = embedder.embed(&texts).unwrap();
        assert_eq!(embeddings.len(), 2);
        for embedding in &embeddings {
            assert_eq!(embedding.len(), 384);
            let norm: f64 = embedding
                .iter()
                .map(|&x| f64::from(x) * f64::from(x))
                .sum::<f64>()
                .sqrt();
            assert!((norm - 1.0).abs() < 1e-4, "norm was {}", norm);
        }
    }

    #[test]
    #[ignore = "requires local all-MiniLM-L6-v2 model files under models/"]
    fn test_identical_texts_embed_identically() {
        let embedder = Embedder::load(&EmbedderConfig::default()).unwrap();
        let texts = vec!["Same sentence.".to_string(), "Same sentence.".to_string()];

        let embeddings = embedder.embed(&texts).unwrap();
        let similarity = cosine_similarity(&embeddings[0], &embeddings[1]);
        assert!((similarity - 1.0).abs() < 1e-6, "similarity was {}", similarity);
    }
}
