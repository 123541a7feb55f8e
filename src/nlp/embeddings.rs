//! Embedding capability backed by Model2Vec static embeddings

use crate::error::{Result, ResumeRankerError};
use log::info;
use model2vec_rs::model::StaticModel;
use std::path::Path;
use std::time::Instant;

/// Text to fixed-dimension dense vector. Identical input must give identical output.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

pub struct Model2VecEmbedder {
    model: StaticModel,
    model_name: String,
}

impl Model2VecEmbedder {
    /// Load from a local model directory (tokenizer.json, model.safetensors, config.json).
    pub fn load(model_path: &Path) -> Result<Self> {
        let start_time = Instant::now();

        let model = StaticModel::from_pretrained(
            model_path,
            None, // token
            None, // normalize
            None, // subfolder
        )
        .map_err(|e| {
            ResumeRankerError::ModelLoad(format!(
                "Failed to load embedding model from {}: {}",
                model_path.display(),
                e
            ))
        })?;

        info!(
            "Loaded embedding model from {} in {:.2?}",
            model_path.display(),
            start_time.elapsed()
        );

        Ok(Self {
            model,
            model_name: model_path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

impl Embedder for Model2VecEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embedding = self.model.encode_single(text);
        if embedding.is_empty() {
            return Err(ResumeRankerError::Inference(format!(
                "{} returned an empty embedding",
                self.model_name
            )));
        }
        Ok(embedding)
    }
}
