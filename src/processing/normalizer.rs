//! Whitespace normalization

use crate::error::Result;
use regex::Regex;

pub struct TextNormalizer {
    whitespace: Regex,
}

impl TextNormalizer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            whitespace: Regex::new(r"\s+")?,
        })
    }

    /// Collapse every run of whitespace (spaces, tabs, newlines) to a single space.
    /// Section headers often sit on their own line, so the segmenter needs one flat line.
    pub fn normalize(&self, text: &str) -> String {
        self.whitespace.replace_all(text, " ").trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_mixed_whitespace() {
        let normalizer = TextNormalizer::new().unwrap();
        assert_eq!(
            normalizer.normalize("EDUCATION\n\n  BS CS\t2020\r\nEXPERIENCE"),
            "EDUCATION BS CS 2020 EXPERIENCE"
        );
    }

    #[test]
    fn test_keeps_tokens_apart_and_intact() {
        let normalizer = TextNormalizer::new().unwrap();
        let normalized = normalizer.normalize("C++\nRust\tNode.js");
        assert_eq!(normalized.split(' ').collect::<Vec<_>>(), vec!["C++", "Rust", "Node.js"]);
    }

    #[test]
    fn test_empty_and_blank_input() {
        let normalizer = TextNormalizer::new().unwrap();
        assert_eq!(normalizer.normalize(""), "");
        assert_eq!(normalizer.normalize(" \n\t "), "");
    }
}
