//! Section segmentation of normalized resume text
//!
//! Headers are located with a single case-insensitive Aho-Corasick automaton built over
//! every alias of every label. A header only counts when it stands on word boundaries,
//! so "EXPERIENCED" or "SKILLSET" never open a section. This is stricter than plain
//! substring search, which would treat both as headers.

use crate::config::SegmentationPolicy;
use crate::error::{Result, ResumeRankerError};
use crate::processing::record::UNKNOWN;
use aho_corasick::{AhoCorasick, MatchKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SectionLabel {
    Education,
    Experience,
    Skills,
    Certifications,
    Awards,
    Projects,
    Languages,
}

impl SectionLabel {
    pub const ALL: [SectionLabel; 7] = [
        SectionLabel::Education,
        SectionLabel::Experience,
        SectionLabel::Skills,
        SectionLabel::Certifications,
        SectionLabel::Awards,
        SectionLabel::Projects,
        SectionLabel::Languages,
    ];

    /// Header strings that open this section, matched case-insensitively.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            SectionLabel::Education => &["EDUCATION", "ACADEMIC BACKGROUND"],
            SectionLabel::Experience => &["WORK EXPERIENCE", "PROFESSIONAL EXPERIENCE", "EXPERIENCE"],
            SectionLabel::Skills => &["TECHNICAL SKILLS", "SKILLS"],
            SectionLabel::Certifications => &["CERTIFICATIONS", "CERTIFICATION"],
            SectionLabel::Awards => &["AWARDS", "AWARD"],
            SectionLabel::Projects => &["PROJECTS"],
            SectionLabel::Languages => &["LANGUAGES"],
        }
    }
}

impl fmt::Display for SectionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SectionLabel::Education => "Education",
            SectionLabel::Experience => "Experience",
            SectionLabel::Skills => "Skills",
            SectionLabel::Certifications => "Certifications",
            SectionLabel::Awards => "Awards",
            SectionLabel::Projects => "Projects",
            SectionLabel::Languages => "Languages",
        };
        write!(f, "{}", name)
    }
}

/// One header occurrence in the text. `end` is the byte offset just past the alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderHit {
    pub label: SectionLabel,
    pub start: usize,
    pub end: usize,
}

pub struct SectionSegmenter {
    matcher: AhoCorasick,
    pattern_labels: Vec<SectionLabel>,
    policy: SegmentationPolicy,
}

impl SectionSegmenter {
    pub fn new(policy: SegmentationPolicy) -> Result<Self> {
        let mut patterns = Vec::new();
        let mut pattern_labels = Vec::new();
        for label in SectionLabel::ALL {
            for alias in label.aliases() {
                patterns.push(*alias);
                pattern_labels.push(label);
            }
        }

        let matcher = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::Standard)
            .build(&patterns)
            .map_err(|e| ResumeRankerError::Configuration(format!("Failed to build header matcher: {}", e)))?;

        Ok(Self {
            matcher,
            pattern_labels,
            policy,
        })
    }

    pub fn policy(&self) -> SegmentationPolicy {
        self.policy
    }

    /// All header occurrences in text order. Overlapping candidates resolve leftmost-longest,
    /// so "WORK EXPERIENCE" wins over the "EXPERIENCE" inside it.
    pub fn headers(&self, text: &str) -> Vec<HeaderHit> {
        let mut candidates: Vec<HeaderHit> = self
            .matcher
            .find_overlapping_iter(text)
            .filter(|m| on_word_boundaries(text, m.start(), m.end()))
            .map(|m| HeaderHit {
                label: self.pattern_labels[m.pattern().as_usize()],
                start: m.start(),
                end: m.end(),
            })
            .collect();

        candidates.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

        let mut hits = Vec::with_capacity(candidates.len());
        let mut covered_until = 0;
        for hit in candidates {
            if hit.start >= covered_until {
                covered_until = hit.end;
                hits.push(hit);
            }
        }
        hits
    }

    /// Map every label to its captured body, or the sentinel when the label has no header.
    pub fn segment(&self, text: &str) -> BTreeMap<SectionLabel, String> {
        let hits = self.headers(text);

        SectionLabel::ALL
            .iter()
            .map(|&label| {
                let body = hits
                    .iter()
                    .position(|h| h.label == label)
                    .map(|i| self.capture(text, &hits, i))
                    .filter(|body| !body.is_empty())
                    .unwrap_or(UNKNOWN);
                (label, body.to_string())
            })
            .collect()
    }

    fn capture<'t>(&self, text: &'t str, hits: &[HeaderHit], index: usize) -> &'t str {
        let opening = hits[index];
        let rest = &hits[index + 1..];

        let terminator = match self.policy {
            SegmentationPolicy::Boundary => rest.first(),
            SegmentationPolicy::Independent => rest.iter().find(|h| h.label != opening.label),
        };
        let end = terminator.map(|h| h.start).unwrap_or(text.len());

        text[opening.end..end]
            .trim_start_matches(|c: char| c.is_whitespace() || c == ':')
            .trim_end()
    }
}

fn on_word_boundaries(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.map(char::is_alphanumeric).unwrap_or(false) && !after.map(char::is_alphanumeric).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(policy: SegmentationPolicy, text: &str) -> BTreeMap<SectionLabel, String> {
        SectionSegmenter::new(policy).unwrap().segment(text)
    }

    #[test]
    fn test_education_runs_to_next_header() {
        for policy in [SegmentationPolicy::Boundary, SegmentationPolicy::Independent] {
            let sections = segment(policy, "Jane Doe EDUCATION: BS CS 2020 EXPERIENCE: Acme Corp 2021");
            assert_eq!(sections[&SectionLabel::Education], "BS CS 2020");
            assert_eq!(sections[&SectionLabel::Experience], "Acme Corp 2021");
        }
    }

    #[test]
    fn test_missing_headers_are_unknown() {
        let sections = segment(SegmentationPolicy::Boundary, "EDUCATION: BS CS 2020");
        assert_eq!(sections.len(), SectionLabel::ALL.len());
        assert_eq!(sections[&SectionLabel::Projects], UNKNOWN);
        assert_eq!(sections[&SectionLabel::Languages], UNKNOWN);
    }

    #[test]
    fn test_headers_match_case_insensitively_and_keep_body_casing() {
        let sections = segment(SegmentationPolicy::Boundary, "Technical Skills: Rust, Go Languages: English");
        assert_eq!(sections[&SectionLabel::Skills], "Rust, Go");
        assert_eq!(sections[&SectionLabel::Languages], "English");
    }

    #[test]
    fn test_longest_alias_wins() {
        let segmenter = SectionSegmenter::new(SegmentationPolicy::Boundary).unwrap();
        let hits = segmenter.headers("PROFESSIONAL EXPERIENCE Acme");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].label, SectionLabel::Experience);
        assert_eq!(hits[0].start, 0);
    }

    #[test]
    fn test_alias_inside_a_word_is_not_a_header() {
        let sections = segment(
            SegmentationPolicy::Boundary,
            "EDUCATION MIT, experienced in Rust. SKILLSET: none",
        );
        assert_eq!(sections[&SectionLabel::Education], "MIT, experienced in Rust. SKILLSET: none");
        assert_eq!(sections[&SectionLabel::Experience], UNKNOWN);
        assert_eq!(sections[&SectionLabel::Skills], UNKNOWN);
    }

    #[test]
    fn test_policies_differ_on_repeated_header() {
        let text = "SKILLS Rust SKILLS Go EDUCATION MIT";

        let boundary = segment(SegmentationPolicy::Boundary, text);
        assert_eq!(boundary[&SectionLabel::Skills], "Rust");

        // A label's own repeated header is not a terminator for its own scan
        let independent = segment(SegmentationPolicy::Independent, text);
        assert_eq!(independent[&SectionLabel::Skills], "Rust SKILLS Go");
    }

    #[test]
    fn test_header_without_body_is_unknown() {
        let sections = segment(SegmentationPolicy::Boundary, "AWARDS: PROJECTS: Compiler");
        assert_eq!(sections[&SectionLabel::Awards], UNKNOWN);
        assert_eq!(sections[&SectionLabel::Projects], "Compiler");
    }

    #[test]
    fn test_segmentation_is_deterministic() {
        let text = "EXPERIENCE Acme EDUCATION MIT CERTIFICATION AWS AWARD Dean's list";
        let first = segment(SegmentationPolicy::Independent, text);
        let second = segment(SegmentationPolicy::Independent, text);
        assert_eq!(first, second);
        assert_eq!(first[&SectionLabel::Certifications], "AWS");
        assert_eq!(first[&SectionLabel::Awards], "Dean's list");
    }
}
