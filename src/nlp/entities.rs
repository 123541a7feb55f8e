//! Entity-recognition capability
//!
//! Two backends: a BERT token classifier run through candle (CoNLL-style BIO tags), and a
//! pattern recognizer that needs no model files.

use crate::error::{Result, ResumeRankerError};
use crate::nlp::var_builder;
use candle_core::{Device, Module, Tensor, D};
use candle_nn::Linear;
use candle_transformers::models::bert::{self, BertModel};
use log::info;
use regex::Regex;
use std::path::Path;
use std::time::Instant;
use tokenizers::Tokenizer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityLabel {
    Person,
    Email,
    Organization,
    Location,
    Other(String),
}

impl EntityLabel {
    /// Map a tag type (the part after `B-`/`I-`) to a label.
    pub fn from_tag(kind: &str) -> Self {
        match kind.to_uppercase().as_str() {
            "PER" | "PERSON" => EntityLabel::Person,
            "EMAIL" => EntityLabel::Email,
            "ORG" => EntityLabel::Organization,
            "LOC" | "GPE" => EntityLabel::Location,
            other => EntityLabel::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub text: String,
    pub label: EntityLabel,
    /// Byte offset of the span in the recognized text.
    pub start: usize,
}

/// Text to ordered `(span, label)` list, in document order.
pub trait EntityRecognizer: Send + Sync {
    fn recognize(&self, text: &str) -> Result<Vec<Entity>>;
}

pub struct BertEntityRecognizer {
    model: BertModel,
    classifier: Linear,
    tokenizer: Tokenizer,
    id2label: Vec<String>,
    cls_id: u32,
    sep_id: u32,
    window: usize,
    device: Device,
}

impl BertEntityRecognizer {
    pub fn load(model_path: &Path, device: &Device) -> Result<Self> {
        let start_time = Instant::now();

        let config_content = std::fs::read_to_string(model_path.join("config.json"))
            .map_err(|e| ResumeRankerError::ModelLoad(format!("Failed to read model config: {}", e)))?;
        let raw_config: serde_json::Value = serde_json::from_str(&config_content)
            .map_err(|e| ResumeRankerError::ModelLoad(format!("Failed to parse model config: {}", e)))?;
        let config: bert::Config = serde_json::from_value(raw_config.clone())
            .map_err(|e| ResumeRankerError::ModelLoad(format!("Not a BERT config: {}", e)))?;

        let id2label = parse_id2label(&raw_config)?;
        let hidden_size = raw_config["hidden_size"].as_u64().unwrap_or(768) as usize;
        let max_positions = raw_config["max_position_embeddings"].as_u64().unwrap_or(512) as usize;

        let tokenizer = load_wordpiece_tokenizer(model_path)?;
        let special_id = |token: &str| {
            tokenizer
                .token_to_id(token)
                .ok_or_else(|| ResumeRankerError::ModelLoad(format!("Tokenizer has no {} token", token)))
        };
        let cls_id = special_id("[CLS]")?;
        let sep_id = special_id("[SEP]")?;

        let vb = var_builder(model_path, bert::DTYPE, device)?;
        let model = BertModel::load(vb.clone(), &config)
            .map_err(|e| ResumeRankerError::ModelLoad(format!("Failed to load BERT encoder: {}", e)))?;
        let classifier = candle_nn::linear(hidden_size, id2label.len(), vb.pp("classifier"))
            .map_err(|e| ResumeRankerError::ModelLoad(format!("Failed to load classifier head: {}", e)))?;

        info!(
            "Loaded entity model from {} ({} labels) in {:.2?}",
            model_path.display(),
            id2label.len(),
            start_time.elapsed()
        );

        Ok(Self {
            model,
            classifier,
            tokenizer,
            id2label,
            cls_id,
            sep_id,
            window: max_positions.saturating_sub(2).max(1),
            device: device.clone(),
        })
    }

    fn tag_window(&self, ids: &[u32]) -> Result<Vec<usize>> {
        let mut input = Vec::with_capacity(ids.len() + 2);
        input.push(self.cls_id);
        input.extend_from_slice(ids);
        input.push(self.sep_id);

        let input_ids = Tensor::new(input.as_slice(), &self.device)?.unsqueeze(0)?;
        let token_type_ids = input_ids.zeros_like()?;
        let attention_mask = input_ids.ones_like()?;

        let hidden = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let predictions = self
            .classifier
            .forward(&hidden)?
            .argmax(D::Minus1)?
            .squeeze(0)?
            .to_vec1::<u32>()?;

        // Drop the [CLS]/[SEP] positions
        Ok(predictions[1..predictions.len() - 1].iter().map(|&p| p as usize).collect())
    }
}

impl EntityRecognizer for BertEntityRecognizer {
    fn recognize(&self, text: &str) -> Result<Vec<Entity>> {
        let encoding = self
            .tokenizer
            .encode(text, false)
            .map_err(|e| ResumeRankerError::Inference(format!("Failed to tokenize input: {}", e)))?;

        let mut tags = Vec::with_capacity(encoding.len());
        for chunk in encoding.get_ids().chunks(self.window) {
            for id in self.tag_window(chunk)? {
                tags.push(self.id2label.get(id).map(String::as_str).unwrap_or("O"));
            }
        }

        Ok(decode_bio(text, encoding.get_offsets(), &tags))
    }
}

fn parse_id2label(config: &serde_json::Value) -> Result<Vec<String>> {
    let map = config["id2label"]
        .as_object()
        .ok_or_else(|| ResumeRankerError::ModelLoad("config.json has no id2label map".to_string()))?;

    let mut labels: Vec<(usize, String)> = map
        .iter()
        .filter_map(|(id, label)| Some((id.parse().ok()?, label.as_str()?.to_string())))
        .collect();
    labels.sort_by_key(|(id, _)| *id);

    if labels.is_empty() || labels.iter().enumerate().any(|(i, (id, _))| i != *id) {
        return Err(ResumeRankerError::ModelLoad("id2label ids are not contiguous".to_string()));
    }

    Ok(labels.into_iter().map(|(_, label)| label).collect())
}

/// `tokenizer.json` when the repository ships one; otherwise a WordPiece tokenizer is
/// assembled from `vocab.txt` and `tokenizer_config.json`.
fn load_wordpiece_tokenizer(model_path: &Path) -> Result<Tokenizer> {
    let tokenizer_json = model_path.join("tokenizer.json");
    if tokenizer_json.exists() {
        return Tokenizer::from_file(&tokenizer_json)
            .map_err(|e| ResumeRankerError::ModelLoad(format!("Failed to load tokenizer: {}", e)));
    }

    let vocab_text = std::fs::read_to_string(model_path.join("vocab.txt")).map_err(|e| {
        ResumeRankerError::ModelLoad(format!("Model has neither tokenizer.json nor vocab.txt: {}", e))
    })?;
    let lowercase = std::fs::read_to_string(model_path.join("tokenizer_config.json"))
        .ok()
        .and_then(|s| serde_json::from_str::<serde_json::Value>(&s).ok())
        .and_then(|v| v["do_lower_case"].as_bool())
        .unwrap_or(false);

    let vocab: serde_json::Map<String, serde_json::Value> = vocab_text
        .lines()
        .enumerate()
        .map(|(id, token)| (token.to_string(), serde_json::Value::from(id)))
        .collect();

    let spec = serde_json::json!({
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [],
        "normalizer": {
            "type": "BertNormalizer",
            "clean_text": true,
            "handle_chinese_chars": true,
            "strip_accents": null,
            "lowercase": lowercase
        },
        "pre_tokenizer": { "type": "BertPreTokenizer" },
        "post_processor": null,
        "decoder": { "type": "WordPiece", "prefix": "##", "cleanup": true },
        "model": {
            "type": "WordPiece",
            "unk_token": "[UNK]",
            "continuing_subword_prefix": "##",
            "max_input_chars_per_word": 100,
            "vocab": vocab
        }
    });

    spec.to_string()
        .parse::<Tokenizer>()
        .map_err(|e| ResumeRankerError::ModelLoad(format!("Failed to build tokenizer from vocab.txt: {}", e)))
}

/// Group BIO-tagged tokens into entity spans. A `B-` tag that starts exactly where the
/// previous token of the same type ended is a word piece and extends the span.
pub fn decode_bio(text: &str, offsets: &[(usize, usize)], tags: &[&str]) -> Vec<Entity> {
    let mut entities = Vec::new();
    let mut current: Option<(&str, usize, usize)> = None;

    let flush = |span: Option<(&str, usize, usize)>, entities: &mut Vec<Entity>| {
        if let Some((kind, start, end)) = span {
            if let Some(slice) = text.get(start..end) {
                entities.push(Entity {
                    text: slice.to_string(),
                    label: EntityLabel::from_tag(kind),
                    start,
                });
            }
        }
    };

    for (&(start, end), tag) in offsets.iter().zip(tags) {
        let (prefix, kind) = tag.split_once('-').unwrap_or((*tag, ""));

        if prefix != "B" && prefix != "I" {
            flush(current.take(), &mut entities);
            continue;
        }

        let extends = matches!(
            current,
            Some((open_kind, _, open_end)) if open_kind == kind && (prefix == "I" || start == open_end)
        );

        if extends {
            if let Some(span) = current.as_mut() {
                span.2 = end;
            }
        } else {
            flush(current.take(), &mut entities);
            current = Some((kind, start, end));
        }
    }
    flush(current.take(), &mut entities);

    entities
}

/// Model-free recognizer: a leading line of two to four capitalised words is taken as the
/// person name, and every `local@domain.tld` shape is an email.
pub struct PatternEntityRecognizer {
    email: Regex,
    name_line: Regex,
}

impl PatternEntityRecognizer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            email: Regex::new(r"[\w.+-]+@[\w-]+(?:\.[\w-]+)+")?,
            name_line: Regex::new(r"^\p{Lu}[\p{L}'.-]+(?: \p{Lu}[\p{L}'.-]+){1,3}$")?,
        })
    }

    fn leading_name(&self, text: &str) -> Option<Entity> {
        let mut offset = 0;
        for line in text.split('\n') {
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                if !self.name_line.is_match(trimmed) {
                    return None;
                }
                return Some(Entity {
                    text: trimmed.to_string(),
                    label: EntityLabel::Person,
                    start: offset + (line.len() - line.trim_start().len()),
                });
            }
            offset += line.len() + 1;
        }
        None
    }
}

impl EntityRecognizer for PatternEntityRecognizer {
    fn recognize(&self, text: &str) -> Result<Vec<Entity>> {
        let mut entities: Vec<Entity> = self.leading_name(text).into_iter().collect();

        entities.extend(self.email.find_iter(text).map(|m| Entity {
            text: m.as_str().to_string(),
            label: EntityLabel::Email,
            start: m.start(),
        }));

        entities.sort_by_key(|e| e.start);
        Ok(entities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_bio_groups_spans() {
        let text = "Jane Doe works at Acme Corp";
        let offsets = [(0, 4), (5, 8), (9, 14), (15, 17), (18, 22), (23, 27)];
        let tags = ["B-PER", "I-PER", "O", "O", "B-ORG", "I-ORG"];

        let entities = decode_bio(text, &offsets, &tags);
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].text, "Jane Doe");
        assert_eq!(entities[0].label, EntityLabel::Person);
        assert_eq!(entities[1].text, "Acme Corp");
        assert_eq!(entities[1].label, EntityLabel::Organization);
    }

    #[test]
    fn test_decode_bio_merges_word_pieces() {
        let text = "Kowalczyk";
        // "Kowal" "##czyk" both tagged B-PER
        let entities = decode_bio(text, &[(0, 5), (5, 9)], &["B-PER", "B-PER"]);
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].text, "Kowalczyk");
    }

    #[test]
    fn test_decode_bio_splits_adjacent_people() {
        let text = "Ann Bob";
        let entities = decode_bio(text, &[(0, 3), (4, 7)], &["B-PER", "B-PER"]);
        assert_eq!(entities.len(), 2);
    }

    #[test]
    fn test_parse_id2label_orders_by_id() {
        let config = serde_json::json!({"id2label": {"1": "B-PER", "0": "O", "2": "I-PER"}});
        assert_eq!(parse_id2label(&config).unwrap(), vec!["O", "B-PER", "I-PER"]);

        let broken = serde_json::json!({"id2label": {"0": "O", "5": "B-PER"}});
        assert!(parse_id2label(&broken).is_err());
    }

    #[test]
    fn test_pattern_recognizer_finds_name_and_email() {
        let recognizer = PatternEntityRecognizer::new().unwrap();
        let text = "\n  Jane Q. Doe\njane.doe@example.com | 555-123-4567\nEDUCATION";

        let entities = recognizer.recognize(text).unwrap();
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].label, EntityLabel::Person);
        assert_eq!(entities[0].text, "Jane Q. Doe");
        assert_eq!(&text[entities[0].start..entities[0].start + 11], "Jane Q. Doe");
        assert_eq!(entities[1].label, EntityLabel::Email);
        assert_eq!(entities[1].text, "jane.doe@example.com");
    }

    #[test]
    fn test_pattern_recognizer_ignores_non_name_first_line() {
        let recognizer = PatternEntityRecognizer::new().unwrap();
        let entities = recognizer.recognize("CURRICULUM VITAE 2024\nJane Doe").unwrap();
        assert!(entities.iter().all(|e| e.label != EntityLabel::Person));
    }
}
