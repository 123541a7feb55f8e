//! Similarity ranking of candidates against a job description

use crate::error::{Result, ResumeRankerError};
use crate::nlp::embeddings::Embedder;
use crate::processing::record::{JobDescription, ResumeRecord};
use log::{debug, info};

#[derive(Debug, Clone)]
pub struct RankedCandidate {
    /// The candidate's record, with `score` set.
    pub record: ResumeRecord,
    pub score: f32,
    /// Position of the record in the ranking input.
    pub original_index: usize,
}

#[derive(Debug, Clone)]
pub struct RankingResult {
    pub entries: Vec<RankedCandidate>,
}

impl RankingResult {
    pub fn records(&self) -> impl Iterator<Item = &ResumeRecord> {
        self.entries.iter().map(|e| &e.record)
    }
}

pub struct RankingEngine<'a> {
    embedder: &'a dyn Embedder,
}

impl<'a> RankingEngine<'a> {
    pub fn new(embedder: &'a dyn Embedder) -> Self {
        Self { embedder }
    }

    /// Score every record's skills text against the job description and order by
    /// descending similarity. All-or-nothing: one failed embedding fails the whole call,
    /// and the input records are left untouched for the caller.
    pub fn rank(&self, records: &[ResumeRecord], job: &JobDescription) -> Result<RankingResult> {
        if records.is_empty() {
            return Err(ResumeRankerError::Ranking("No candidates to rank".to_string()));
        }

        let job_embedding = self.embed(job.text(), "job description")?;

        let mut entries = Vec::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            let embedding = self.embed(&record.skills_text(), &record.label())?;
            let score = cosine_similarity(&embedding, &job_embedding)?;
            debug!("{}: similarity {:.4}", record.label(), score);

            entries.push(RankedCandidate {
                record: record.clone().with_score(score),
                score,
                original_index: index,
            });
        }

        // Stable: equal scores keep input order
        entries.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

        info!("Ranked {} candidate(s)", entries.len());
        Ok(RankingResult { entries })
    }

    fn embed(&self, text: &str, what: &str) -> Result<Vec<f32>> {
        self.embedder
            .embed(text)
            .map_err(|e| ResumeRankerError::Ranking(format!("Embedding failed for {}: {}", what, e)))
    }
}

/// Cosine similarity in [-1, 1]. A zero vector scores 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(ResumeRankerError::Ranking(format!(
            "Embedding dimensions don't match: {} vs {}",
            a.len(),
            b.len()
        )));
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    let score = dot_product / (norm_a * norm_b);
    if score.is_nan() {
        return Ok(0.0);
    }
    Ok(score.clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    /// Counts occurrences of a few fixed words, so overlap in vocabulary means similarity.
    struct BagOfWords;

    impl Embedder for BagOfWords {
        fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let lower = text.to_lowercase();
            Ok(["python", "sql", "java", "c++", "developer"]
                .iter()
                .map(|w| lower.split_whitespace().filter(|t| t == w).count() as f32)
                .collect())
        }
    }

    struct FailsOn(&'static str);

    impl Embedder for FailsOn {
        fn embed(&self, text: &str) -> Result<Vec<f32>> {
            if text.contains(self.0) {
                Err(ResumeRankerError::Inference("backend down".to_string()))
            } else {
                Ok(vec![1.0, 0.0])
            }
        }
    }

    fn record(name: &str, skills: &[&str]) -> ResumeRecord {
        let mut record = ResumeRecord::empty(PathBuf::from(format!("{}.pdf", name)));
        record.name = name.to_string();
        record.skills = skills.iter().map(|s| s.to_string()).collect();
        record
    }

    #[test]
    fn test_lexical_overlap_ranks_first() {
        let records = vec![record("B", &["Java", "C++"]), record("A", &["Python", "SQL"])];
        let result = RankingEngine::new(&BagOfWords)
            .rank(&records, &JobDescription::new("Seeking Python developer"))
            .unwrap();

        assert_eq!(result.entries[0].record.name, "A");
        assert_eq!(result.entries[0].original_index, 1);
        assert!(result.entries[0].score > result.entries[1].score);
        assert_eq!(result.entries[0].record.score, Some(result.entries[0].score));
    }

    #[test]
    fn test_ties_keep_input_order() {
        let records = vec![
            record("first", &["Java"]),
            record("second", &["Java"]),
            record("third", &["Java"]),
        ];
        let result = RankingEngine::new(&BagOfWords)
            .rank(&records, &JobDescription::new("Java"))
            .unwrap();

        let order: Vec<usize> = result.entries.iter().map(|e| e.original_index).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_empty_batch_is_a_ranking_error() {
        let result = RankingEngine::new(&BagOfWords).rank(&[], &JobDescription::new("Python"));
        assert!(matches!(result, Err(ResumeRankerError::Ranking(_))));
    }

    #[test]
    fn test_one_embedding_failure_aborts_ranking() {
        let records = vec![record("ok", &["Python"]), record("bad", &["Poison"])];
        let result = RankingEngine::new(&FailsOn("Poison")).rank(&records, &JobDescription::new("Python"));

        assert!(matches!(result, Err(ResumeRankerError::Ranking(_))));
        // Input records stay usable
        assert!(records.iter().all(|r| r.score.is_none()));
    }

    #[test]
    fn test_cosine_similarity_edges() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]).unwrap(), 1.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]).unwrap(), -1.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).unwrap(), 0.0);
        assert!(cosine_similarity(&[1.0], &[1.0, 0.0]).is_err());
    }
}
