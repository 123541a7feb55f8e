//! Tabular export of candidate records

use crate::error::{Result, ResumeRankerError};
use crate::processing::record::{ResumeRecord, UNKNOWN};
use crate::processing::sections::SectionLabel;
use log::info;
use std::path::{Path, PathBuf};

pub const HEADERS: [&str; 7] = ["Name", "Email", "Phone", "Skills", "Education", "Experience", "Summary"];

const LIST_SEPARATOR: &str = ", ";

/// Write one row per record, in the order given. A skill containing `", "` cannot be
/// told apart from two skills when the file is read back.
pub fn write_csv(path: &Path, records: &[ResumeRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(HEADERS)?;

    for record in records {
        let skills = record.skills.join(LIST_SEPARATOR);
        writer.write_record([
            record.name.as_str(),
            record.email.as_str(),
            record.phone.as_str(),
            skills.as_str(),
            record.section(SectionLabel::Education),
            record.section(SectionLabel::Experience),
            record.summary_text(),
        ])?;
    }

    writer.flush()?;
    info!("Wrote {} record(s) to {}", records.len(), path.display());
    Ok(())
}

/// Read rows written by `write_csv` back into records. Columns the file does not carry
/// come back at the sentinel, and `source` is the CSV path itself.
pub fn read_csv(path: &Path) -> Result<Vec<ResumeRecord>> {
    let mut reader = csv::Reader::from_path(path)?;

    let headers = reader.headers()?.clone();
    if headers.iter().ne(HEADERS.iter().copied()) {
        return Err(ResumeRankerError::InvalidInput(format!(
            "Unexpected CSV header in {}: {:?}",
            path.display(),
            headers
        )));
    }

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let field = |i: usize| row.get(i).unwrap_or(UNKNOWN).to_string();

        let mut record = ResumeRecord::empty(PathBuf::from(path));
        record.name = field(0);
        record.email = field(1);
        record.phone = field(2);
        record.skills = split_list(&field(3));
        record.sections.insert(SectionLabel::Education, field(4));
        record.sections.insert(SectionLabel::Experience, field(5));
        let summary = field(6);
        record.summary = (summary != UNKNOWN).then_some(summary);
        records.push(record);
    }

    Ok(records)
}

fn split_list(value: &str) -> Vec<String> {
    if value.is_empty() {
        return Vec::new();
    }
    value.split(LIST_SEPARATOR).map(str::to_string).collect()
}
