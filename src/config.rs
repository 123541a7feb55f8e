//! Configuration management for the resume ranker

use crate::error::{Result, ResumeRankerError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub models: ModelConfig,
    pub extraction: ExtractionConfig,
    pub sections: SectionConfig,
    pub skills: SkillConfig,
    pub summary: SummaryConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub models_dir: PathBuf,
    pub embedding_model: String,
    pub entity_backend: EntityBackend,
    pub entity_model: String,
    pub summarizer: SummarizerBackend,
    pub summarizer_model: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityBackend {
    Bert,
    Pattern,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummarizerBackend {
    Extractive,
    Llm,
    Disabled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    pub ocr_enabled: bool,
    pub ocr_dpi: u32,
    pub ocr_language: String,
    pub layout_name_heuristic: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionConfig {
    pub policy: SegmentationPolicy,
}

/// How section boundaries are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentationPolicy {
    /// One left-to-right pass over every header; each slice runs to the next header.
    Boundary,
    /// Each label scans on its own and stops at the first header of any other label.
    Independent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillConfig {
    pub vocabulary: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryConfig {
    pub max_length: usize,
    pub min_length: usize,
    pub placeholder: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub color_output: bool,
    pub csv_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let models_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".resume-ranker")
            .join("models");

        Self {
            models: ModelConfig {
                models_dir,
                embedding_model: "minishlab/potion-base-8M".to_string(),
                entity_backend: EntityBackend::Pattern,
                entity_model: "dslim/bert-base-NER".to_string(),
                summarizer: SummarizerBackend::Extractive,
                summarizer_model: "microsoft/Phi-3-mini-4k-instruct".to_string(),
            },
            extraction: ExtractionConfig {
                ocr_enabled: true,
                ocr_dpi: 300,
                ocr_language: "eng".to_string(),
                layout_name_heuristic: true,
            },
            sections: SectionConfig {
                policy: SegmentationPolicy::Boundary,
            },
            skills: SkillConfig {
                vocabulary: default_skill_vocabulary(),
            },
            summary: SummaryConfig {
                max_length: 130,
                min_length: 30,
                placeholder: "Summary not available.".to_string(),
            },
            output: OutputConfig {
                color_output: true,
                csv_path: PathBuf::from("resumes.csv"),
            },
        }
    }
}

/// Canonical skill vocabulary, in scan order.
pub fn default_skill_vocabulary() -> Vec<String> {
    [
        "Python", "Java", "Machine Learning", "SQL", "Data Analysis", "TensorFlow", "PyTorch", "NLP",
        "Deep Learning", "Computer Vision", "Rust", "C++", "C#", "JavaScript", "TypeScript",
        "React", "Node.js", "Docker", "Kubernetes", "AWS", "Azure", "GCP", "Spark", "Hadoop",
        "Pandas", "NumPy", "Scikit-learn", "Tableau", "Excel", "Git", "Linux", "Agile", "Scrum",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Config {
    /// Load from the default location, writing defaults on first use.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load from an explicit path, writing defaults there if the file is missing.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = toml::from_str(&content)
                .map_err(|e| ResumeRankerError::Configuration(format!("Failed to parse config: {}", e)))?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to(config_path)?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ResumeRankerError::Configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("resume-ranker")
            .join("config.toml")
    }

    pub fn models_dir(&self) -> &PathBuf {
        &self.models.models_dir
    }

    fn validate(&self) -> Result<()> {
        if self.summary.min_length > self.summary.max_length {
            return Err(ResumeRankerError::Configuration(format!(
                "summary.min_length ({}) exceeds summary.max_length ({})",
                self.summary.min_length, self.summary.max_length
            )));
        }
        if self.skills.vocabulary.iter().any(|s| s.trim().is_empty()) {
            return Err(ResumeRankerError::Configuration(
                "skills.vocabulary contains an empty entry".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let config = Config::default();
        let content = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&content).unwrap();

        assert_eq!(parsed.sections.policy, SegmentationPolicy::Boundary);
        assert_eq!(parsed.skills.vocabulary, config.skills.vocabulary);
        assert_eq!(parsed.summary.max_length, 130);
    }

    #[test]
    fn test_load_from_missing_path_writes_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.models.entity_backend, EntityBackend::Pattern);
    }

    #[test]
    fn test_invalid_summary_lengths_are_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        let mut config = Config::default();
        config.summary.min_length = 200;
        config.save_to(&path).unwrap();

        assert!(matches!(Config::load_from(&path), Err(ResumeRankerError::Configuration(_))));
    }

    #[test]
    fn test_default_vocabulary_starts_with_canonical_skills() {
        let vocabulary = default_skill_vocabulary();
        assert_eq!(&vocabulary[..4], &["Python", "Java", "Machine Learning", "SQL"]);
    }
}
