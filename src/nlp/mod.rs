//! NLP capabilities: embeddings, entity recognition, summarization
//!
//! Models are loaded once into an `NlpContext` at start-up and only read afterwards.

pub mod embeddings;
pub mod entities;
pub mod model_manager;
pub mod summarizer;

use crate::config::{Config, EntityBackend, SummarizerBackend};
use crate::error::{Result, ResumeRankerError};
use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use embeddings::{Embedder, Model2VecEmbedder};
use entities::{BertEntityRecognizer, EntityRecognizer, PatternEntityRecognizer};
use log::{info, warn};
use model_manager::{shard_files, ModelKind, ModelManager};
use std::path::Path;
use summarizer::{ExtractiveSummarizer, LlmSummarizer, Summarizer};

/// Shared, read-only model handles passed into every pipeline and ranking call.
pub struct NlpContext {
    pub entities: Box<dyn EntityRecognizer>,
    pub embedder: Box<dyn Embedder>,
    pub summarizer: Option<Box<dyn Summarizer>>,
}

impl NlpContext {
    pub fn new(
        entities: Box<dyn EntityRecognizer>,
        embedder: Box<dyn Embedder>,
        summarizer: Option<Box<dyn Summarizer>>,
    ) -> Self {
        Self {
            entities,
            embedder,
            summarizer,
        }
    }

    /// Resolve (downloading if needed) and load every configured model. Any failure is a
    /// `ModelLoad` error: nothing downstream can run without these.
    pub async fn from_config(config: &Config, with_summarizer: bool) -> Result<Self> {
        let mut manager = ModelManager::new(config.models_dir().clone()).await?;
        let device = select_device()?;

        let embedding_dir = manager
            .ensure_model_available(&config.models.embedding_model, ModelKind::Embedding)
            .await?;
        let embedder = Model2VecEmbedder::load(&embedding_dir)?;

        let entities: Box<dyn EntityRecognizer> = match config.models.entity_backend {
            EntityBackend::Bert => {
                let dir = manager
                    .ensure_model_available(&config.models.entity_model, ModelKind::Entity)
                    .await?;
                Box::new(BertEntityRecognizer::load(&dir, &device)?)
            }
            EntityBackend::Pattern => Box::new(PatternEntityRecognizer::new()?),
        };

        let summarizer: Option<Box<dyn Summarizer>> = match (with_summarizer, config.models.summarizer) {
            (false, _) | (_, SummarizerBackend::Disabled) => None,
            (true, SummarizerBackend::Extractive) => Some(Box::new(ExtractiveSummarizer)),
            (true, SummarizerBackend::Llm) => {
                let dir = manager
                    .ensure_model_available(&config.models.summarizer_model, ModelKind::Summarizer)
                    .await?;
                Some(Box::new(LlmSummarizer::load(&dir, &device)?))
            }
        };

        Ok(Self::new(entities, Box::new(embedder), summarizer))
    }
}

/// GPU when compiled in and available, CPU otherwise. `RESUME_RANKER_DEVICE=cpu|cuda|metal`
/// overrides the detection.
pub fn select_device() -> Result<Device> {
    if let Ok(preference) = std::env::var("RESUME_RANKER_DEVICE") {
        match preference.to_lowercase().as_str() {
            "cpu" => return Ok(Device::Cpu),
            "cuda" => {
                return Device::new_cuda(0)
                    .map_err(|e| ResumeRankerError::ModelLoad(format!("Failed to initialize CUDA: {}", e)))
            }
            "metal" => {
                return Device::new_metal(0)
                    .map_err(|e| ResumeRankerError::ModelLoad(format!("Failed to initialize Metal: {}", e)))
            }
            other => warn!("Unknown device '{}', falling back to auto-detection", other),
        }
    }

    #[cfg(feature = "cuda")]
    {
        if let Ok(device) = Device::new_cuda(0) {
            info!("Using CUDA GPU");
            return Ok(device);
        }
    }

    #[cfg(feature = "metal")]
    {
        if let Ok(device) = Device::new_metal(0) {
            info!("Using Metal GPU");
            return Ok(device);
        }
    }

    info!("Using CPU for model inference");
    Ok(Device::Cpu)
}

/// Weights of a local model directory: sharded safetensors, single safetensors, or a
/// PyTorch checkpoint, in that order.
pub(crate) fn var_builder(model_path: &Path, dtype: DType, device: &Device) -> Result<VarBuilder<'static>> {
    let index_path = model_path.join("model.safetensors.index.json");
    let single_path = model_path.join("model.safetensors");
    let pth_path = model_path.join("pytorch_model.bin");

    let load_err = |e: candle_core::Error| ResumeRankerError::ModelLoad(format!("Failed to load weights: {}", e));

    if index_path.exists() {
        let index_content = std::fs::read_to_string(&index_path)?;
        let shards: Vec<_> = shard_files(&index_content)?
            .into_iter()
            .map(|shard| model_path.join(shard))
            .collect();
        // Safety: the shards are not modified while mapped
        return unsafe { VarBuilder::from_mmaped_safetensors(&shards, dtype, device) }.map_err(load_err);
    }

    if single_path.exists() {
        // Safety: see above
        return unsafe { VarBuilder::from_mmaped_safetensors(&[single_path], dtype, device) }.map_err(load_err);
    }

    if pth_path.exists() {
        return VarBuilder::from_pth(&pth_path, dtype, device).map_err(load_err);
    }

    Err(ResumeRankerError::ModelLoad(format!(
        "No model weights found in {}",
        model_path.display()
    )))
}
