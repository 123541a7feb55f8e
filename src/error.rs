//! Error handling for the resume ranker

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResumeRankerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Text extraction error: {0}")]
    Extraction(String),

    #[error("File format not supported: {0}")]
    UnsupportedFormat(String),

    #[error("Model loading error: {0}")]
    ModelLoad(String),

    #[error("Model inference error: {0}")]
    Inference(String),

    #[error("Ranking error: {0}")]
    Ranking(String),

    #[error("OCR error: {0}")]
    Ocr(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Output formatting error: {0}")]
    OutputFormatting(String),
}

pub type Result<T> = std::result::Result<T, ResumeRankerError>;

/// How far a failure reaches when processing a batch of documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureScope {
    /// Only the current document is lost; the batch continues without it.
    Document,
    /// The whole run (or the whole ranking step) cannot continue.
    Batch,
}

impl ResumeRankerError {
    pub fn scope(&self) -> FailureScope {
        match self {
            ResumeRankerError::Io(_)
            | ResumeRankerError::Extraction(_)
            | ResumeRankerError::UnsupportedFormat(_)
            | ResumeRankerError::Ocr(_)
            | ResumeRankerError::InvalidInput(_) => FailureScope::Document,
            _ => FailureScope::Batch,
        }
    }

    pub fn is_document_failure(&self) -> bool {
        self.scope() == FailureScope::Document
    }
}

/// Convert anyhow errors (model2vec) to our custom error type
impl From<anyhow::Error> for ResumeRankerError {
    fn from(err: anyhow::Error) -> Self {
        ResumeRankerError::Inference(err.to_string())
    }
}

/// Patterns are compiled from literals or configured vocabulary
impl From<regex::Error> for ResumeRankerError {
    fn from(err: regex::Error) -> Self {
        ResumeRankerError::Configuration(format!("Invalid pattern: {}", err))
    }
}

/// Convert candle core errors to our custom error type
impl From<candle_core::Error> for ResumeRankerError {
    fn from(err: candle_core::Error) -> Self {
        ResumeRankerError::Inference(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_level_failures_are_skippable() {
        assert!(ResumeRankerError::Extraction("empty".into()).is_document_failure());
        assert!(ResumeRankerError::UnsupportedFormat("x.txt".into()).is_document_failure());
        assert!(ResumeRankerError::Ocr("tesseract missing".into()).is_document_failure());
    }

    #[test]
    fn test_model_and_ranking_failures_are_batch_fatal() {
        assert_eq!(ResumeRankerError::ModelLoad("no weights".into()).scope(), FailureScope::Batch);
        assert_eq!(ResumeRankerError::Ranking("empty".into()).scope(), FailureScope::Batch);
    }
}
