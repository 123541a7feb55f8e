//! Resume processing: normalization, segmentation, field and skill extraction, ranking

pub mod fields;
pub mod normalizer;
pub mod pipeline;
pub mod ranking;
pub mod record;
pub mod sections;
pub mod skills;

pub use pipeline::{BatchOutcome, DocumentFailure, ResumePipeline};
pub use ranking::{RankedCandidate, RankingEngine, RankingResult};
pub use record::{JobDescription, ResumeRecord, UNKNOWN};
pub use sections::SectionLabel;
