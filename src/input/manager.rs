//! Input manager: routes a resume file to the reader for its format

use crate::config::ExtractionConfig;
use crate::error::{Result, ResumeRankerError};
use crate::input::file_detector::FileType;
use crate::input::layout::{LayoutReader, PdftotextLayout};
use crate::input::ocr::OcrFallback;
use crate::input::text_extractor::{DocxExtractor, ExtractedDocument, OcrSetting, PdfExtractor, TextExtractor};
use log::{info, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub struct InputManager {
    pdf: PdfExtractor,
    docx: DocxExtractor,
    cache: HashMap<PathBuf, ExtractedDocument>,
    enable_cache: bool,
}

impl InputManager {
    pub fn new(pdf: PdfExtractor) -> Self {
        Self {
            pdf,
            docx: DocxExtractor,
            cache: HashMap::new(),
            enable_cache: true,
        }
    }

    /// Wire the PDF reader from configuration, probing for the external poppler and
    /// tesseract tools once.
    pub fn from_config(config: &ExtractionConfig) -> Self {
        let ocr = if !config.ocr_enabled {
            OcrSetting::Disabled
        } else if OcrFallback::tools_available() {
            OcrSetting::Ready(OcrFallback::tesseract(config.ocr_dpi, &config.ocr_language))
        } else {
            warn!("OCR is enabled but pdftoppm/tesseract were not found; scanned PDFs will be skipped");
            OcrSetting::Unavailable
        };

        let layout: Option<Box<dyn LayoutReader>> =
            if config.layout_name_heuristic && PdftotextLayout::is_available() {
                Some(Box::new(PdftotextLayout))
            } else {
                None
            };

        Self::new(PdfExtractor::new(ocr, layout))
    }

    pub fn with_cache(mut self, enable: bool) -> Self {
        self.enable_cache = enable;
        self
    }

    pub async fn extract(&mut self, path: &Path) -> Result<ExtractedDocument> {
        if self.enable_cache {
            if let Some(cached) = self.cache.get(path) {
                info!("Using cached text for: {}", path.display());
                return Ok(cached.clone());
            }
        }

        if !path.exists() {
            return Err(ResumeRankerError::InvalidInput(format!(
                "File does not exist: {}",
                path.display()
            )));
        }

        let document = match FileType::from_path(path) {
            FileType::Pdf => {
                info!("Extracting text from PDF: {}", path.display());
                self.pdf.extract(path).await?
            }
            FileType::Docx => {
                info!("Extracting text from DOCX: {}", path.display());
                self.docx.extract(path).await?
            }
            FileType::Unknown => {
                return Err(ResumeRankerError::UnsupportedFormat(format!(
                    "{} (expected .pdf or .docx)",
                    path.display()
                )));
            }
        };

        if self.enable_cache {
            self.cache.insert(path.to_path_buf(), document.clone());
        }

        Ok(document)
    }

    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manager() -> InputManager {
        InputManager::new(PdfExtractor::new(OcrSetting::Disabled, None))
    }

    #[tokio::test]
    async fn test_unknown_extension_is_unsupported() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("resume.txt");
        std::fs::write(&path, "Jane Doe").unwrap();

        let result = manager().extract(&path).await;
        assert!(matches!(result, Err(ResumeRankerError::UnsupportedFormat(_))));
    }

    #[tokio::test]
    async fn test_missing_file_is_invalid_input() {
        let result = manager().extract(Path::new("/nonexistent/resume.pdf")).await;
        assert!(matches!(result, Err(ResumeRankerError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_failed_extraction_is_not_cached() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.docx");
        std::fs::write(&path, "not a zip").unwrap();

        let mut manager = manager();
        assert!(manager.extract(&path).await.is_err());
        assert_eq!(manager.cache_size(), 0);
    }
}
