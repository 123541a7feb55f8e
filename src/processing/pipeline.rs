//! Per-document pipeline and batch policy

use crate::config::Config;
use crate::error::{FailureScope, Result};
use crate::input::{ExtractedDocument, InputManager};
use crate::nlp::NlpContext;
use crate::processing::fields::FieldExtractor;
use crate::processing::normalizer::TextNormalizer;
use crate::processing::record::ResumeRecord;
use crate::processing::sections::SectionSegmenter;
use crate::processing::skills::SkillMatcher;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

/// A document that could not be turned into a record, and why.
#[derive(Debug, Clone)]
pub struct DocumentFailure {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub records: Vec<ResumeRecord>,
    pub failures: Vec<DocumentFailure>,
}

pub struct ResumePipeline {
    normalizer: TextNormalizer,
    segmenter: SectionSegmenter,
    fields: FieldExtractor,
    skills: SkillMatcher,
    summary_max: usize,
    summary_min: usize,
    summary_placeholder: String,
    summarize: bool,
}

impl ResumePipeline {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            normalizer: TextNormalizer::new()?,
            segmenter: SectionSegmenter::new(config.sections.policy)?,
            fields: FieldExtractor::new(config.extraction.layout_name_heuristic)?,
            skills: SkillMatcher::new(&config.skills.vocabulary),
            summary_max: config.summary.max_length,
            summary_min: config.summary.min_length,
            summary_placeholder: config.summary.placeholder.clone(),
            summarize: true,
        })
    }

    pub fn without_summary(mut self) -> Self {
        self.summarize = false;
        self
    }

    /// Build the record for one extracted document. Field-level misses become the sentinel;
    /// a failing entity recognizer or summarizer degrades instead of failing the document.
    pub fn build_record(&self, document: &ExtractedDocument, nlp: &NlpContext) -> ResumeRecord {
        let normalized = self.normalizer.normalize(&document.text);

        let entities = nlp.entities.recognize(&document.text).unwrap_or_else(|e| {
            warn!("Entity recognition failed for {}: {}", document.source.display(), e);
            Vec::new()
        });
        let contact = self.fields.extract(&document.text, &entities, &document.pages);

        let mut record = ResumeRecord::empty(document.source.clone());
        record.name = contact.name;
        record.email = contact.email;
        record.phone = contact.phone;
        record.sections = self.segmenter.segment(&normalized);
        record.skills = self.skills.match_skills(&normalized);
        record.summary = self.summary(&normalized, document, nlp);

        debug!(
            "{}: name={}, {} skill(s), ocr={}",
            document.source.display(),
            record.name,
            record.skills.len(),
            document.ocr_used
        );

        record
    }

    fn summary(&self, text: &str, document: &ExtractedDocument, nlp: &NlpContext) -> Option<String> {
        if !self.summarize {
            return None;
        }
        let summarizer = nlp.summarizer.as_ref()?;

        match summarizer.summarize(text, self.summary_max, self.summary_min) {
            Ok(summary) => Some(summary),
            Err(e) => {
                warn!(
                    "Summarization failed for {}, using placeholder: {}",
                    document.source.display(),
                    e
                );
                Some(self.summary_placeholder.clone())
            }
        }
    }

    pub async fn process_file(
        &self,
        input: &mut InputManager,
        path: &Path,
        nlp: &NlpContext,
    ) -> Result<ResumeRecord> {
        let document = input.extract(path).await?;
        Ok(self.build_record(&document, nlp))
    }

    /// Process every path in order. Per-document failures are recorded and skipped;
    /// a batch-scope failure aborts the whole batch. `on_progress` runs after each path.
    pub async fn process_batch<F>(
        &self,
        input: &mut InputManager,
        paths: &[PathBuf],
        nlp: &NlpContext,
        mut on_progress: F,
    ) -> Result<BatchOutcome>
    where
        F: FnMut(&Path),
    {
        let mut outcome = BatchOutcome::default();

        for path in paths {
            match self.process_file(input, path, nlp).await {
                Ok(record) => outcome.records.push(record),
                Err(e) if e.scope() == FailureScope::Document => {
                    warn!("Skipping {}: {}", path.display(), e);
                    outcome.failures.push(DocumentFailure {
                        path: path.clone(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
            on_progress(path);
        }

        info!(
            "Processed {} document(s): {} record(s), {} skipped",
            paths.len(),
            outcome.records.len(),
            outcome.failures.len()
        );
        Ok(outcome)
    }
}
