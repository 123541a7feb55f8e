//! Structured candidate records

use crate::processing::sections::SectionLabel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Placeholder for any field the document did not yield.
pub const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeRecord {
    pub source: PathBuf,
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Always holds every `SectionLabel`; absent sections map to `UNKNOWN`.
    pub sections: BTreeMap<SectionLabel, String>,
    /// First-seen casing, vocabulary order, no case-insensitive duplicates.
    pub skills: Vec<String>,
    pub summary: Option<String>,
    /// Set by the ranking engine only.
    pub score: Option<f32>,
}

impl ResumeRecord {
    /// A record with every field at the sentinel.
    pub fn empty(source: PathBuf) -> Self {
        Self {
            source,
            name: UNKNOWN.to_string(),
            email: UNKNOWN.to_string(),
            phone: UNKNOWN.to_string(),
            sections: SectionLabel::ALL
                .iter()
                .map(|&label| (label, UNKNOWN.to_string()))
                .collect(),
            skills: Vec::new(),
            summary: None,
            score: None,
        }
    }

    pub fn section(&self, label: SectionLabel) -> &str {
        self.sections.get(&label).map(String::as_str).unwrap_or(UNKNOWN)
    }

    /// The text embedded for ranking.
    pub fn skills_text(&self) -> String {
        self.skills.join(" ")
    }

    pub fn summary_text(&self) -> &str {
        self.summary.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }

    /// Display name for the record: the extracted name, or the file name when none was found.
    pub fn label(&self) -> String {
        if self.name != UNKNOWN {
            return self.name.clone();
        }
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| UNKNOWN.to_string())
    }
}

/// Free-text job description a batch is ranked against.
#[derive(Debug, Clone, PartialEq)]
pub struct JobDescription {
    text: String,
}

impl JobDescription {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_record_has_every_field() {
        let record = ResumeRecord::empty(PathBuf::from("cv.pdf"));
        assert_eq!(record.name, UNKNOWN);
        assert_eq!(record.sections.len(), SectionLabel::ALL.len());
        assert_eq!(record.section(SectionLabel::Awards), UNKNOWN);
        assert_eq!(record.summary_text(), UNKNOWN);
        assert!(record.score.is_none());
    }

    #[test]
    fn test_skills_text_joins_with_single_spaces() {
        let mut record = ResumeRecord::empty(PathBuf::from("cv.pdf"));
        record.skills = vec!["Python".into(), "Machine Learning".into(), "SQL".into()];
        assert_eq!(record.skills_text(), "Python Machine Learning SQL");
    }

    #[test]
    fn test_label_falls_back_to_file_name() {
        let mut record = ResumeRecord::empty(PathBuf::from("/tmp/jane.docx"));
        assert_eq!(record.label(), "jane.docx");
        record.name = "Jane Doe".into();
        assert_eq!(record.label(), "Jane Doe");
    }
}
