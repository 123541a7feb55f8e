//! Summarization capability
//!
//! `ExtractiveSummarizer` keeps the leading sentences of the resume within the length budget.
//! `LlmSummarizer` runs a local Phi-3 model through candle with greedy decoding.

use crate::error::{Result, ResumeRankerError};
use crate::nlp::var_builder;
use candle_core::{DType, Device, Tensor};
use candle_transformers::generation::LogitsProcessor;
use candle_transformers::models::phi3;
use log::{debug, info};
use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;
use tokenizers::Tokenizer;
use unicode_segmentation::UnicodeSegmentation;

/// `(text, max_length, min_length)` to a shorter text. Lengths count words for the
/// extractive backend and generated tokens for the model backend.
pub trait Summarizer: Send + Sync {
    fn summarize(&self, text: &str, max_length: usize, min_length: usize) -> Result<String>;
}

pub struct ExtractiveSummarizer;

impl Summarizer for ExtractiveSummarizer {
    fn summarize(&self, text: &str, max_length: usize, min_length: usize) -> Result<String> {
        let mut picked = Vec::new();
        let mut words = 0;

        for sentence in text.unicode_sentences().map(str::trim).filter(|s| !s.is_empty()) {
            let count = sentence.unicode_words().count();
            // The first sentence is always taken, then capped below
            if !picked.is_empty() && words + count > max_length && words >= min_length {
                break;
            }
            picked.push(sentence);
            words += count;
            if words >= max_length {
                break;
            }
        }

        if picked.is_empty() {
            return Err(ResumeRankerError::Inference("Nothing to summarize".to_string()));
        }

        let summary = picked.join(" ");
        if words <= max_length {
            return Ok(summary);
        }
        Ok(summary.split_whitespace().take(max_length).collect::<Vec<_>>().join(" "))
    }
}

/// Upper bound on resume words fed into the prompt, to stay inside a 4k context.
const MAX_PROMPT_WORDS: usize = 1500;

pub struct LlmSummarizer {
    model: Mutex<phi3::Model>,
    tokenizer: Tokenizer,
    eos_tokens: Vec<u32>,
    device: Device,
}

impl LlmSummarizer {
    pub fn load(model_path: &Path, device: &Device) -> Result<Self> {
        let start_time = Instant::now();

        let tokenizer = Tokenizer::from_file(model_path.join("tokenizer.json"))
            .map_err(|e| ResumeRankerError::ModelLoad(format!("Failed to load tokenizer: {}", e)))?;

        let config_content = std::fs::read_to_string(model_path.join("config.json"))
            .map_err(|e| ResumeRankerError::ModelLoad(format!("Failed to read model config: {}", e)))?;
        let config: phi3::Config = serde_json::from_str(&config_content)
            .map_err(|e| ResumeRankerError::ModelLoad(format!("Failed to parse Phi-3 config: {}", e)))?;

        let vb = var_builder(model_path, DType::F32, device)?;
        let model = phi3::Model::new(&config, vb)
            .map_err(|e| ResumeRankerError::ModelLoad(format!("Failed to load Phi-3 model: {}", e)))?;

        let eos_tokens: Vec<u32> = ["<|end|>", "<|endoftext|>"]
            .iter()
            .filter_map(|t| tokenizer.token_to_id(t))
            .collect();
        if eos_tokens.is_empty() {
            return Err(ResumeRankerError::ModelLoad(
                "Tokenizer defines no end-of-turn token".to_string(),
            ));
        }

        info!(
            "Loaded summarization model from {} in {:.2?}",
            model_path.display(),
            start_time.elapsed()
        );

        Ok(Self {
            model: Mutex::new(model),
            tokenizer,
            eos_tokens,
            device: device.clone(),
        })
    }

    fn prompt(text: &str) -> String {
        let excerpt: Vec<&str> = text.split_whitespace().take(MAX_PROMPT_WORDS).collect();
        format!(
            "<|user|>\nSummarize the following resume in a short paragraph. \
             Mention the candidate's main skills and experience.\n\n{}\n<|end|>\n<|assistant|>\n",
            excerpt.join(" ")
        )
    }
}

impl Summarizer for LlmSummarizer {
    fn summarize(&self, text: &str, max_length: usize, min_length: usize) -> Result<String> {
        let mut model = self
            .model
            .lock()
            .map_err(|_| ResumeRankerError::Inference("Summarization model lock poisoned".to_string()))?;
        model.clear_kv_cache();

        let encoding = self
            .tokenizer
            .encode(Self::prompt(text).as_str(), true)
            .map_err(|e| ResumeRankerError::Inference(format!("Failed to tokenize input: {}", e)))?;
        let prompt_tokens = encoding.get_ids().to_vec();

        // Greedy decoding: no temperature, no sampling
        let mut logits_processor = LogitsProcessor::new(0, None, None);
        let mut generated: Vec<u32> = Vec::new();
        let mut input = prompt_tokens.clone();
        let mut position = 0;

        while generated.len() < max_length {
            let input_tensor = Tensor::new(input.as_slice(), &self.device)?.unsqueeze(0)?;
            let logits = model
                .forward(&input_tensor, position)?
                .squeeze(0)?
                .squeeze(0)?
                .to_dtype(DType::F32)?;
            position += input.len();

            let next_token = logits_processor.sample(&logits)?;
            if self.eos_tokens.contains(&next_token) {
                if generated.len() >= min_length {
                    break;
                }
                // Too short yet: take the best non-terminal token instead
                let mut scores = logits.to_vec1::<f32>()?;
                for &eos in &self.eos_tokens {
                    if let Some(score) = scores.get_mut(eos as usize) {
                        *score = f32::NEG_INFINITY;
                    }
                }
                let fallback = Tensor::new(scores.as_slice(), &self.device)?;
                let token = logits_processor.sample(&fallback)?;
                generated.push(token);
                input = vec![token];
                continue;
            }

            generated.push(next_token);
            input = vec![next_token];
        }

        debug!("Generated {} summary tokens from {} prompt tokens", generated.len(), prompt_tokens.len());

        let summary = self
            .tokenizer
            .decode(&generated, true)
            .map_err(|e| ResumeRankerError::Inference(format!("Failed to decode summary: {}", e)))?;

        let summary = summary.trim().to_string();
        if summary.is_empty() {
            return Err(ResumeRankerError::Inference("Model produced an empty summary".to_string()));
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extractive_keeps_leading_sentences_within_budget() {
        let text = "Data scientist with five years of experience. Built ranking models. Enjoys hiking on weekends.";
        let summary = ExtractiveSummarizer.summarize(text, 10, 2).unwrap();
        assert_eq!(summary, "Data scientist with five years of experience. Built ranking models.");
    }

    #[test]
    fn test_extractive_reaches_min_length_then_caps_at_max() {
        let text = "Short. This second sentence is rather long and keeps on going for a while.";
        let summary = ExtractiveSummarizer.summarize(text, 5, 3).unwrap();
        assert_eq!(summary.split_whitespace().count(), 5);
        assert!(summary.starts_with("Short."));
    }

    #[test]
    fn test_extractive_long_first_sentence_with_zero_minimum() {
        let summary = ExtractiveSummarizer.summarize("a b c d e f. g", 3, 0).unwrap();
        assert_eq!(summary, "a b c");
    }

    #[test]
    fn test_extractive_empty_text_fails() {
        assert!(ExtractiveSummarizer.summarize("   ", 130, 30).is_err());
    }

    #[test]
    fn test_prompt_is_bounded() {
        let long_text = "word ".repeat(MAX_PROMPT_WORDS * 2);
        let prompt = LlmSummarizer::prompt(&long_text);
        assert_eq!(prompt.matches("word").count(), MAX_PROMPT_WORDS);
        assert!(prompt.starts_with("<|user|>"));
    }
}
