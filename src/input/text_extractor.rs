//! Text extraction from resume documents

use crate::error::{Result, ResumeRankerError};
use crate::input::file_detector::FileType;
use crate::input::layout::{LayoutReader, PageLayout};
use crate::input::ocr::OcrFallback;
use log::{debug, info, warn};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::Read;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Full text of one document plus whatever layout the reader could recover.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub source: PathBuf,
    pub format: FileType,
    pub text: String,
    /// Word layout per page. Empty for DOCX and for PDFs whose layout could not be read.
    pub pages: Vec<PageLayout>,
    pub ocr_used: bool,
}

pub trait TextExtractor {
    fn extract(&self, path: &Path) -> impl std::future::Future<Output = Result<ExtractedDocument>> + Send;
}

/// What the PDF reader may do when a file has no text layer.
pub enum OcrSetting {
    Disabled,
    /// Enabled in configuration but `pdftoppm`/`tesseract` were not found.
    Unavailable,
    Ready(OcrFallback),
}

pub struct PdfExtractor {
    ocr: OcrSetting,
    layout: Option<Box<dyn LayoutReader>>,
}

impl PdfExtractor {
    pub fn new(ocr: OcrSetting, layout: Option<Box<dyn LayoutReader>>) -> Self {
        Self { ocr, layout }
    }

    fn ocr_text(&self, path: &Path) -> Result<String> {
        match &self.ocr {
            OcrSetting::Ready(fallback) => {
                info!("No text layer in {}, falling back to OCR", path.display());
                fallback.recognize(path)
            }
            OcrSetting::Unavailable => Err(ResumeRankerError::Ocr(format!(
                "'{}' has no text layer and pdftoppm/tesseract are not installed",
                path.display()
            ))),
            OcrSetting::Disabled => Err(ResumeRankerError::Extraction(format!(
                "'{}' has no text layer and OCR is disabled",
                path.display()
            ))),
        }
    }

    fn read_layout(&self, path: &Path) -> Vec<PageLayout> {
        let Some(reader) = &self.layout else {
            return Vec::new();
        };
        match reader.read_layout(path) {
            Ok(pages) => pages,
            Err(e) => {
                warn!("Could not read word layout of {}: {}", path.display(), e);
                Vec::new()
            }
        }
    }
}

impl TextExtractor for PdfExtractor {
    async fn extract(&self, path: &Path) -> Result<ExtractedDocument> {
        let bytes = fs::read(path).await?;

        let text = text_layer(&bytes).unwrap_or_else(|reason| {
            warn!("pdf text layer unreadable for {}: {}", path.display(), reason);
            String::new()
        });

        let (text, ocr_used) = if text.trim().is_empty() {
            (self.ocr_text(path)?, true)
        } else {
            (text, false)
        };

        if text.trim().is_empty() {
            return Err(ResumeRankerError::Extraction(format!(
                "No text could be extracted from '{}'",
                path.display()
            )));
        }

        let pages = self.read_layout(path);
        debug!("{}: {} chars, {} layout page(s)", path.display(), text.len(), pages.len());

        Ok(ExtractedDocument {
            source: path.to_path_buf(),
            format: FileType::Pdf,
            text,
            pages,
            ocr_used,
        })
    }
}

/// The embedded text layer of a PDF. pdf-extract panics on some documents it can open
/// but not interpret (undefined fonts, pages without resources); those are reported as
/// unreadable like any other parse error.
fn text_layer(bytes: &[u8]) -> std::result::Result<String, String> {
    match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes)) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(e.to_string()),
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown cause".to_string());
            Err(format!("pdf parser panicked: {}", message))
        }
    }
}

pub struct DocxExtractor;

impl TextExtractor for DocxExtractor {
    async fn extract(&self, path: &Path) -> Result<ExtractedDocument> {
        let bytes = fs::read(path).await?;

        let paragraphs = docx_paragraphs(&bytes).map_err(|e| match e {
            ResumeRankerError::Extraction(msg) => {
                ResumeRankerError::Extraction(format!("'{}': {}", path.display(), msg))
            }
            other => other,
        })?;
        let text = paragraphs.join("\n");

        if text.trim().is_empty() {
            return Err(ResumeRankerError::Extraction(format!(
                "'{}' contains no paragraph text",
                path.display()
            )));
        }

        Ok(ExtractedDocument {
            source: path.to_path_buf(),
            format: FileType::Docx,
            text,
            pages: Vec::new(),
            ocr_used: false,
        })
    }
}

/// Paragraph texts of a DOCX package, in body order. Tabs and line breaks inside a
/// paragraph are kept as `\t` and `\n`.
pub fn docx_paragraphs(bytes: &[u8]) -> Result<Vec<String>> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| ResumeRankerError::Extraction(format!("not a DOCX package: {}", e)))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| ResumeRankerError::Extraction(format!("missing word/document.xml: {}", e)))?
        .read_to_string(&mut xml)?;

    let mut reader = Reader::from_str(&xml);
    let mut buf = Vec::new();

    let mut paragraphs = Vec::new();
    // Open paragraphs, innermost last; text boxes nest a paragraph inside another
    let mut open: Vec<String> = Vec::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"p" => open.push(String::new()),
                b"t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"p" => paragraphs.push(String::new()),
                b"tab" => push_to(&mut open, "\t"),
                b"br" | b"cr" => push_to(&mut open, "\n"),
                _ => {}
            },
            Ok(Event::Text(e)) if in_text => {
                let text = e
                    .unescape()
                    .map_err(|e| ResumeRankerError::Extraction(format!("bad text run: {}", e)))?;
                push_to(&mut open, &text);
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => paragraphs.extend(open.pop()),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ResumeRankerError::Extraction(format!("malformed document.xml: {}", e)));
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs)
}

fn push_to(open: &mut [String], text: &str) {
    if let Some(paragraph) = open.last_mut() {
        paragraph.push_str(text);
    }
}
