//! Console report for candidate records

use crate::processing::pipeline::DocumentFailure;
use crate::processing::ranking::RankingResult;
use crate::processing::record::{ResumeRecord, UNKNOWN};
use crate::processing::sections::SectionLabel;
use colored::{Color, Colorize};

/// Sections printed after the fixed fields, when present.
const EXTRA_SECTIONS: [SectionLabel; 5] = [
    SectionLabel::Skills,
    SectionLabel::Certifications,
    SectionLabel::Awards,
    SectionLabel::Projects,
    SectionLabel::Languages,
];

pub struct ConsoleFormatter {
    use_colors: bool,
}

impl ConsoleFormatter {
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn format_header(&self, title: &str) -> String {
        let rule = "=".repeat(title.chars().count().max(20));
        if self.use_colors {
            format!("\n{}\n{}\n", title.blue().bold(), rule.blue())
        } else {
            format!("\n{}\n{}\n", title, rule)
        }
    }

    fn format_field(&self, name: &str, value: &str) -> String {
        let value = if value == UNKNOWN {
            self.colorize(value, Color::BrightBlack)
        } else {
            value.to_string()
        };
        if self.use_colors {
            format!("{}: {}\n", name.bold(), value)
        } else {
            format!("{}: {}\n", name, value)
        }
    }

    /// Name, Email, Phone, Skills, Education, Experience, Summary, then any other
    /// section the document had.
    pub fn format_record(&self, record: &ResumeRecord) -> String {
        let mut output = String::new();

        output.push_str(&self.format_field("Name", &record.name));
        output.push_str(&self.format_field("Email", &record.email));
        output.push_str(&self.format_field("Phone", &record.phone));

        if record.skills.is_empty() {
            output.push_str(&self.format_field("Skills", UNKNOWN));
        } else {
            output.push_str(&self.format_field("Skills", ""));
            for skill in &record.skills {
                output.push_str(&format!("  • {}\n", self.colorize(skill, Color::Green)));
            }
        }

        output.push_str(&self.format_field("Education", record.section(SectionLabel::Education)));
        output.push_str(&self.format_field("Experience", record.section(SectionLabel::Experience)));
        output.push_str(&self.format_field("Summary", record.summary_text()));

        for label in EXTRA_SECTIONS {
            let body = record.section(label);
            if body != UNKNOWN {
                let name = match label {
                    SectionLabel::Skills => "Skills Section".to_string(),
                    other => other.to_string(),
                };
                output.push_str(&self.format_field(&name, body));
            }
        }

        output
    }

    pub fn format_records(&self, records: &[ResumeRecord]) -> String {
        let mut output = String::new();
        for record in records {
            output.push_str(&self.format_header(&format!("Resume: {}", record.source.display())));
            output.push_str(&self.format_record(record));
        }
        output
    }

    pub fn format_ranking(&self, ranking: &RankingResult) -> String {
        let mut output = self.format_header("Ranked Candidates");
        for (position, entry) in ranking.entries.iter().enumerate() {
            let title = format!("Rank {} (Score: {:.2})", position + 1, entry.score);
            output.push('\n');
            output.push_str(&self.colorize(&title, score_color(entry.score)));
            output.push_str(&format!(" {}\n", entry.record.source.display()));
            output.push_str(&self.format_record(&entry.record));
        }
        output
    }

    pub fn format_failures(&self, failures: &[DocumentFailure]) -> String {
        if failures.is_empty() {
            return String::new();
        }

        let mut output = self.format_header(&format!("Skipped {} document(s)", failures.len()));
        for failure in failures {
            output.push_str(&format!(
                "  {} {}: {}\n",
                self.colorize("✗", Color::Red),
                failure.path.display(),
                failure.reason
            ));
        }
        output
    }
}

fn score_color(score: f32) -> Color {
    match score {
        s if s >= 0.7 => Color::Green,
        s if s >= 0.4 => Color::Yellow,
        _ => Color::Red,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::ranking::RankedCandidate;
    use std::path::PathBuf;

    fn record() -> ResumeRecord {
        let mut record = ResumeRecord::empty(PathBuf::from("jane.pdf"));
        record.name = "Jane Doe".to_string();
        record.email = "jane@example.com".to_string();
        record.skills = vec!["Python".to_string(), "SQL".to_string()];
        record
            .sections
            .insert(SectionLabel::Education, "BS Computer Science 2020".to_string());
        record.sections.insert(SectionLabel::Awards, "Dean's list".to_string());
        record
    }

    #[test]
    fn test_fixed_field_order() {
        let output = ConsoleFormatter::new(false).format_record(&record());
        let position = |field: &str| output.find(&format!("{}:", field)).unwrap();

        let order = ["Name", "Email", "Phone", "Skills", "Education", "Experience", "Summary"];
        for pair in order.windows(2) {
            assert!(position(pair[0]) < position(pair[1]), "{} before {}", pair[0], pair[1]);
        }
        assert!(output.contains("  • Python\n  • SQL\n"));
        assert!(output.contains("Phone: unknown\n"));
    }

    #[test]
    fn test_extra_sections_only_when_present() {
        let output = ConsoleFormatter::new(false).format_record(&record());
        assert!(output.contains("Awards: Dean's list\n"));
        assert!(!output.contains("Projects:"));
        assert!(output.find("Awards:").unwrap() > output.find("Summary:").unwrap());
    }

    #[test]
    fn test_ranking_header() {
        let ranking = RankingResult {
            entries: vec![RankedCandidate {
                record: record().with_score(0.8765),
                score: 0.8765,
                original_index: 0,
            }],
        };
        let output = ConsoleFormatter::new(false).format_ranking(&ranking);
        assert!(output.contains("Rank 1 (Score: 0.88) jane.pdf"));
    }

    #[test]
    fn test_failure_summary() {
        let formatter = ConsoleFormatter::new(false);
        assert!(formatter.format_failures(&[]).is_empty());

        let output = formatter.format_failures(&[DocumentFailure {
            path: PathBuf::from("scan.pdf"),
            reason: "Text extraction failed: no text".to_string(),
        }]);
        assert!(output.contains("Skipped 1 document(s)"));
        assert!(output.contains("scan.pdf: Text extraction failed: no text"));
    }
}
