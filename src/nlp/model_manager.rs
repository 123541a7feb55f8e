//! Model management: resolving, downloading and listing Hugging Face models

use crate::error::{Result, ResumeRankerError};
use hf_hub::api::tokio::{Api, ApiRepo};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Which capability a model serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelKind {
    Embedding,
    Entity,
    Summarizer,
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelKind::Embedding => write!(f, "embedding"),
            ModelKind::Entity => write!(f, "entity recognition"),
            ModelKind::Summarizer => write!(f, "summarization"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub repo_id: String,
    pub size_mb: u64,
    pub description: String,
    pub kind: ModelKind,
}

pub struct ModelManager {
    models_dir: PathBuf,
    available_models: BTreeMap<String, ModelInfo>,
    downloaded_models: HashSet<String>,
    api: Api,
}

impl ModelManager {
    pub async fn new(models_dir: PathBuf) -> Result<Self> {
        if !models_dir.exists() {
            fs::create_dir_all(&models_dir).await.map_err(|e| {
                ResumeRankerError::ModelLoad(format!("Failed to create models directory: {}", e))
            })?;
        }

        let api = Api::new()
            .map_err(|e| ResumeRankerError::ModelLoad(format!("Failed to initialize HF API: {}", e)))?;

        let mut manager = Self {
            models_dir,
            available_models: BTreeMap::new(),
            downloaded_models: HashSet::new(),
            api,
        };

        manager.init_available_models();
        manager.scan_downloaded_models().await?;

        Ok(manager)
    }

    fn init_available_models(&mut self) {
        let catalog = [
            (
                "potion-base-8M",
                "Potion Base 8M",
                "minishlab/potion-base-8M",
                33,
                "Model2Vec static embeddings, 256 dimensions",
                ModelKind::Embedding,
            ),
            (
                "m2v-base",
                "Model2Vec Base",
                "minishlab/M2V_base_output",
                90,
                "Legacy Model2Vec base embeddings",
                ModelKind::Embedding,
            ),
            (
                "bert-base-ner",
                "BERT base NER",
                "dslim/bert-base-NER",
                430,
                "BERT token classifier for PER/ORG/LOC/MISC (CoNLL-2003)",
                ModelKind::Entity,
            ),
            (
                "phi-3-mini",
                "Phi-3-mini-4k-instruct",
                "microsoft/Phi-3-mini-4k-instruct",
                7600,
                "Instruction-tuned causal LM used for abstractive summaries",
                ModelKind::Summarizer,
            ),
        ];

        for (id, name, repo_id, size_mb, description, kind) in catalog {
            self.available_models.insert(
                id.to_string(),
                ModelInfo {
                    name: name.to_string(),
                    repo_id: repo_id.to_string(),
                    size_mb,
                    description: description.to_string(),
                    kind,
                },
            );
        }
    }

    async fn scan_downloaded_models(&mut self) -> Result<()> {
        let ids: Vec<String> = self.available_models.keys().cloned().collect();
        for id in ids {
            if is_valid_model_directory(&self.models_dir.join(&id)).await {
                self.downloaded_models.insert(id);
            }
        }
        Ok(())
    }

    /// Resolve a catalog id, a repo id, or a display name to a catalog id.
    pub fn resolve_model_id(&self, input: &str) -> Option<String> {
        if self.available_models.contains_key(input) {
            return Some(input.to_string());
        }

        let input_lower = input.to_lowercase();
        self.available_models
            .iter()
            .find(|(_, info)| info.repo_id == input || info.name.to_lowercase() == input_lower)
            .map(|(id, _)| id.clone())
    }

    /// Local directory for `model`, downloading it first when needed. `model` may be a local
    /// directory, a catalog id, or any Hugging Face repo id.
    pub async fn ensure_model_available(&mut self, model: &str, kind: ModelKind) -> Result<PathBuf> {
        let local = Path::new(model);
        if local.is_dir() {
            return Ok(local.to_path_buf());
        }

        let id = match self.resolve_model_id(model) {
            Some(id) => id,
            None if model.contains('/') => self.register_repo(model, kind),
            None => {
                return Err(ResumeRankerError::ModelLoad(format!(
                    "Unknown model '{}': not a directory, catalog id or repo id",
                    model
                )))
            }
        };

        if let Some(info) = self.available_models.get(&id) {
            if info.kind != kind {
                return Err(ResumeRankerError::ModelLoad(format!(
                    "'{}' is a {} model, expected a {} model",
                    model, info.kind, kind
                )));
            }
        }

        self.download_model(&id, false).await
    }

    fn register_repo(&mut self, repo_id: &str, kind: ModelKind) -> String {
        let id = repo_id.replace('/', "--");
        self.available_models.entry(id.clone()).or_insert_with(|| ModelInfo {
            name: repo_id.to_string(),
            repo_id: repo_id.to_string(),
            size_mb: 0,
            description: "Custom model".to_string(),
            kind,
        });
        id
    }

    pub async fn download_model(&mut self, model_id: &str, force: bool) -> Result<PathBuf> {
        let model_info = self
            .available_models
            .get(model_id)
            .cloned()
            .ok_or_else(|| ResumeRankerError::ModelLoad(format!("Unknown model: {}", model_id)))?;

        let model_dir = self.models_dir.join(model_id);
        if !force && self.downloaded_models.contains(model_id) {
            return Ok(model_dir);
        }

        info!(
            "Downloading {} model {} ({} MB) from {}",
            model_info.kind, model_info.name, model_info.size_mb, model_info.repo_id
        );

        fs::create_dir_all(&model_dir).await.map_err(|e| {
            ResumeRankerError::ModelLoad(format!("Failed to create model directory: {}", e))
        })?;

        let repo = self.api.model(model_info.repo_id.clone());

        let (required, optional): (&[&str], &[&str]) = match model_info.kind {
            ModelKind::Embedding => (&["tokenizer.json", "config.json"], &[]),
            ModelKind::Entity => (&["config.json"], &["tokenizer.json", "vocab.txt", "tokenizer_config.json"]),
            ModelKind::Summarizer => (&["config.json", "tokenizer.json"], &["tokenizer_config.json", "generation_config.json"]),
        };

        for file in required {
            fetch(&repo, file, &model_dir).await?;
        }
        for file in optional {
            if let Err(e) = fetch(&repo, file, &model_dir).await {
                warn!("Optional file {} not fetched: {}", file, e);
            }
        }

        download_weights(&repo, &model_dir).await?;

        self.downloaded_models.insert(model_id.to_string());
        info!("Model {} ready in {}", model_info.name, model_dir.display());
        Ok(model_dir)
    }

    pub fn list_available_models(&self) -> Vec<(&String, &ModelInfo)> {
        self.available_models.iter().collect()
    }

    pub fn get_model_info(&self, model_id: &str) -> Option<&ModelInfo> {
        self.available_models.get(model_id)
    }

    pub fn is_model_downloaded(&self, model_id: &str) -> bool {
        self.downloaded_models.contains(model_id)
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }
}

async fn fetch(repo: &ApiRepo, file: &str, model_dir: &Path) -> Result<PathBuf> {
    let cached = repo
        .get(file)
        .await
        .map_err(|e| ResumeRankerError::ModelLoad(format!("Failed to download {}: {}", file, e)))?;

    let dest = model_dir.join(file);
    fs::copy(&cached, &dest)
        .await
        .map_err(|e| ResumeRankerError::ModelLoad(format!("Failed to copy {}: {}", file, e)))?;
    info!("  Downloaded: {}", file);
    Ok(dest)
}

/// Sharded safetensors (via the index), then a single safetensors file, then `pytorch_model.bin`.
async fn download_weights(repo: &ApiRepo, model_dir: &Path) -> Result<()> {
    if let Ok(index_path) = fetch(repo, "model.safetensors.index.json", model_dir).await {
        let index_content = fs::read_to_string(&index_path).await?;
        for shard in shard_files(&index_content)? {
            fetch(repo, &shard, model_dir).await?;
        }
        return Ok(());
    }

    if fetch(repo, "model.safetensors", model_dir).await.is_ok() {
        return Ok(());
    }

    fetch(repo, "pytorch_model.bin", model_dir).await.map(|_| ())
}

/// Unique shard file names listed in a `model.safetensors.index.json`, sorted.
pub fn shard_files(index_content: &str) -> Result<Vec<String>> {
    let index_json: serde_json::Value = serde_json::from_str(index_content)
        .map_err(|e| ResumeRankerError::ModelLoad(format!("Failed to parse safetensors index: {}", e)))?;

    let weight_map = index_json
        .get("weight_map")
        .and_then(|v| v.as_object())
        .ok_or_else(|| ResumeRankerError::ModelLoad("Invalid safetensors index: missing weight_map".to_string()))?;

    let mut shards: Vec<String> = weight_map
        .values()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    shards.sort();
    Ok(shards)
}

async fn is_valid_model_directory(path: &Path) -> bool {
    if fs::metadata(path.join("config.json")).await.is_err() {
        return false;
    }

    ["model.safetensors", "model.safetensors.index.json", "pytorch_model.bin"]
        .iter()
        .any(|f| path.join(f).exists())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_model_manager_creation() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ModelManager::new(temp_dir.path().to_path_buf()).await.unwrap();

        assert!(!manager.list_available_models().is_empty());
        assert!(!manager.is_model_downloaded("potion-base-8M"));
    }

    #[tokio::test]
    async fn test_resolve_model_id() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ModelManager::new(temp_dir.path().to_path_buf()).await.unwrap();

        assert_eq!(manager.resolve_model_id("potion-base-8M"), Some("potion-base-8M".to_string()));
        assert_eq!(manager.resolve_model_id("dslim/bert-base-NER"), Some("bert-base-ner".to_string()));
        assert_eq!(manager.resolve_model_id("Phi-3-mini-4k-instruct"), Some("phi-3-mini".to_string()));
        assert_eq!(manager.resolve_model_id("nope"), None);
    }

    #[tokio::test]
    async fn test_existing_model_directory_is_detected() {
        let temp_dir = TempDir::new().unwrap();
        let model_dir = temp_dir.path().join("bert-base-ner");
        std::fs::create_dir_all(&model_dir).unwrap();
        std::fs::write(model_dir.join("config.json"), "{}").unwrap();
        std::fs::write(model_dir.join("model.safetensors"), b"").unwrap();

        let mut manager = ModelManager::new(temp_dir.path().to_path_buf()).await.unwrap();
        assert!(manager.is_model_downloaded("bert-base-ner"));

        let path = manager
            .ensure_model_available("dslim/bert-base-NER", ModelKind::Entity)
            .await
            .unwrap();
        assert_eq!(path, model_dir);
    }

    #[tokio::test]
    async fn test_kind_mismatch_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = ModelManager::new(temp_dir.path().to_path_buf()).await.unwrap();

        let result = manager.ensure_model_available("potion-base-8M", ModelKind::Summarizer).await;
        assert!(matches!(result, Err(ResumeRankerError::ModelLoad(_))));
    }

    #[test]
    fn test_shard_files_are_unique_and_sorted() {
        let index = r#"{"weight_map": {
            "a": "model-00002-of-00002.safetensors",
            "b": "model-00001-of-00002.safetensors",
            "c": "model-00001-of-00002.safetensors"
        }}"#;
        assert_eq!(
            shard_files(index).unwrap(),
            vec!["model-00001-of-00002.safetensors", "model-00002-of-00002.safetensors"]
        );
    }
}
