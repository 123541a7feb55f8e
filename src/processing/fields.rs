//! Contact field extraction: name, email and phone

use crate::error::Result;
use crate::input::layout::PageLayout;
use crate::nlp::entities::{Entity, EntityLabel};
use crate::processing::record::UNKNOWN;
use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactFields {
    pub name: String,
    pub email: String,
    pub phone: String,
}

pub struct FieldExtractor {
    email_regex: Regex,
    phone_regex: Regex,
    use_layout: bool,
}

impl FieldExtractor {
    pub fn new(use_layout: bool) -> Result<Self> {
        Ok(Self {
            email_regex: Regex::new(r"[\w.-]+@[\w.-]+")?,
            phone_regex: Regex::new(r"\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}")?,
            use_layout,
        })
    }

    /// Resolve every field from the raw text, its recognized entities, and the page layout.
    pub fn extract(&self, text: &str, entities: &[Entity], pages: &[PageLayout]) -> ContactFields {
        let layout_name = if self.use_layout { layout_name(pages) } else { None };

        ContactFields {
            name: layout_name
                .or_else(|| first_entity(entities, &EntityLabel::Person))
                .unwrap_or_else(|| UNKNOWN.to_string()),
            email: self.email(text, entities),
            phone: self.phone(text),
        }
    }

    pub fn email(&self, text: &str, entities: &[Entity]) -> String {
        first_entity(entities, &EntityLabel::Email)
            .or_else(|| self.email_regex.find(text).map(|m| m.as_str().to_string()))
            .unwrap_or_else(|| UNKNOWN.to_string())
    }

    pub fn phone(&self, text: &str) -> String {
        self.phone_regex
            .find(text)
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| UNKNOWN.to_string())
    }
}

fn first_entity(entities: &[Entity], label: &EntityLabel) -> Option<String> {
    entities
        .iter()
        .find(|e| &e.label == label)
        .map(|e| e.text.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// The words set in the largest font on each page, joined across pages. Headers are
/// usually rendered biggest, which on a resume is the candidate's name.
pub fn layout_name(pages: &[PageLayout]) -> Option<String> {
    let name = pages
        .iter()
        .map(|page| page.tallest_words().join(" "))
        .filter(|words| !words.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let name = name.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
