//! Per-page word layout records for PDF documents
//!
//! The name heuristic needs the rendered height of every word, which plain text
//! extraction throws away. Layout is read with `pdftotext -bbox` (poppler-utils),
//! whose XHTML output carries one `<word>` element per word with its bounding box.

use crate::error::{Result, ResumeRankerError};
use log::debug;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Command;

/// A single word as laid out on the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordBox {
    pub text: String,
    pub height: f64,
}

/// All words of one page, in reading order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    pub page_number: usize,
    pub words: Vec<WordBox>,
}

impl PageLayout {
    /// Words whose height equals the page maximum exactly.
    pub fn tallest_words(&self) -> Vec<&str> {
        let max_height = self
            .words
            .iter()
            .map(|w| w.height)
            .fold(f64::NEG_INFINITY, f64::max);

        self.words
            .iter()
            .filter(|w| w.height == max_height)
            .map(|w| w.text.as_str())
            .collect()
    }
}

/// Source of word layout records for a PDF file.
pub trait LayoutReader: Send + Sync {
    fn read_layout(&self, path: &Path) -> Result<Vec<PageLayout>>;
}

/// Layout reader backed by poppler's `pdftotext -bbox`.
pub struct PdftotextLayout;

impl PdftotextLayout {
    pub fn is_available() -> bool {
        let available = Command::new("pdftotext").arg("-v").output().is_ok();
        if !available {
            debug!("pdftotext not found - install poppler-utils for layout-based name detection");
        }
        available
    }
}

impl LayoutReader for PdftotextLayout {
    fn read_layout(&self, path: &Path) -> Result<Vec<PageLayout>> {
        let output = Command::new("pdftotext")
            .arg("-bbox")
            .arg(path)
            .arg("-")
            .output()
            .map_err(|e| ResumeRankerError::Extraction(format!("Failed to run pdftotext: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ResumeRankerError::Extraction(format!("pdftotext failed: {}", stderr.trim())));
        }

        parse_bbox_xhtml(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Parse the XHTML document produced by `pdftotext -bbox`.
pub fn parse_bbox_xhtml(xml: &str) -> Result<Vec<PageLayout>> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    let mut pages = Vec::new();
    let mut current_page: Option<PageLayout> = None;
    let mut current_word: Option<WordBox> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"page" => {
                    current_page = Some(PageLayout {
                        page_number: pages.len() + 1,
                        words: Vec::new(),
                    });
                }
                b"word" => {
                    current_word = Some(WordBox {
                        text: String::new(),
                        height: word_height(e),
                    });
                }
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if let Some(word) = current_word.as_mut() {
                    word.text.push_str(&e.unescape().unwrap_or_default());
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"word" => {
                    if let (Some(word), Some(page)) = (current_word.take(), current_page.as_mut()) {
                        let text = word.text.trim().to_string();
                        if !text.is_empty() {
                            page.words.push(WordBox { text, height: word.height });
                        }
                    }
                }
                b"page" => {
                    if let Some(page) = current_page.take() {
                        pages.push(page);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ResumeRankerError::Extraction(format!("Malformed layout output: {}", e)));
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(pages)
}

fn word_height(e: &BytesStart) -> f64 {
    let y_min = get_attribute(e, "yMin").and_then(|v| v.parse::<f64>().ok());
    let y_max = get_attribute(e, "yMax").and_then(|v| v.parse::<f64>().ok());
    match (y_min, y_max) {
        (Some(min), Some(max)) => max - min,
        _ => 0.0,
    }
}

fn get_attribute(e: &BytesStart, name: &str) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.local_name().as_ref() == name.as_bytes() {
            return Some(String::from_utf8_lossy(&attr.value).to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Transitional//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd">
<html xmlns="http://www.w3.org/1999/xhtml">
<head><title></title></head>
<body>
<doc>
  <page width="612.000000" height="792.000000">
    <word xMin="72.0" yMin="60.0" xMax="130.0" yMax="78.0">JOHN</word>
    <word xMin="135.0" yMin="60.0" xMax="200.0" yMax="78.0">SMITH</word>
    <word xMin="72.0" yMin="90.0" xMax="110.0" yMax="100.0">Data</word>
    <word xMin="115.0" yMin="90.0" xMax="160.0" yMax="100.0">Scientist</word>
  </page>
  <page width="612.000000" height="792.000000">
    <word xMin="72.0" yMin="60.0" xMax="120.0" yMax="72.0">R&amp;D</word>
  </page>
</doc>
</body>
</html>"#;

    #[test]
    fn test_parse_bbox_pages_and_heights() {
        let pages = parse_bbox_xhtml(SAMPLE).unwrap();

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].words.len(), 4);
        assert_eq!(pages[0].words[0].height, 18.0);
        assert_eq!(pages[0].words[2].height, 10.0);
        assert_eq!(pages[1].words[0].text, "R&D");
    }

    #[test]
    fn test_tallest_words_use_exact_height() {
        let pages = parse_bbox_xhtml(SAMPLE).unwrap();
        assert_eq!(pages[0].tallest_words(), vec!["JOHN", "SMITH"]);
    }

    #[test]
    fn test_empty_page_has_no_tallest_words() {
        let page = PageLayout::default();
        assert!(page.tallest_words().is_empty());
    }
}
