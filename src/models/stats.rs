// src/models/stats.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::matching::classify::report_bucket;
use crate::models::matching::{ConfidenceBucket, MatchResult, Provenance};

/// Counters for one matching run, folded from the stream of `MatchResult`s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRunStats {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub oracle_enabled: bool,
    pub deals_processed: usize,
    pub high_confidence: usize,
    pub review_needed: usize,
    pub low_confidence: usize,
    pub no_match: usize,
    pub verification_used: usize,
    pub all_candidates_rejected: usize,
    pub substring_matches: usize,
    pub avg_confidence: f64,
}

impl MatchRunStats {
    pub fn new(oracle_enabled: bool) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            finished_at: None,
            oracle_enabled,
            deals_processed: 0,
            high_confidence: 0,
            review_needed: 0,
            low_confidence: 0,
            no_match: 0,
            verification_used: 0,
            all_candidates_rejected: 0,
            substring_matches: 0,
            avg_confidence: 0.0,
        }
    }

    pub fn record(&mut self, result: &MatchResult<'_>) {
        let previous_total = self.avg_confidence * self.deals_processed as f64;
        self.deals_processed += 1;
        self.avg_confidence =
            (previous_total + result.final_confidence()) / self.deals_processed as f64;

        match report_bucket(result) {
            None => {
                self.no_match += 1;
                return;
            }
            Some(ConfidenceBucket::High) => self.high_confidence += 1,
            Some(ConfidenceBucket::Review) => self.review_needed += 1,
            Some(ConfidenceBucket::Low) => self.low_confidence += 1,
        }
        if result.verification_used {
            self.verification_used += 1;
        }
        if result.all_candidates_rejected {
            self.all_candidates_rejected += 1;
        }
        if result.provenance() == Some(Provenance::SubstringMatch) {
            self.substring_matches += 1;
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::core::{Query, ReferenceEntity};
    use crate::models::matching::Candidate;

    #[test]
    fn test_record_counts_buckets_and_flags() {
        let entity = ReferenceEntity::new("1", "Carbone", None, "g", "Major Food");
        let q1 = Query::new("Carbone", "100");
        let q2 = Query::new("Something Else", "200");
        let q3 = Query::new("Nothing", "300");

        let mut stats = MatchRunStats::new(true);
        stats.record(&MatchResult::resolved(
            &q1,
            Candidate::new(&entity, 1.0, Provenance::RankedMatch),
            true,
            false,
            Vec::new(),
        ));
        stats.record(&MatchResult::resolved(
            &q2,
            Candidate::new(&entity, 0.5, Provenance::SubstringMatch),
            true,
            true,
            Vec::new(),
        ));
        stats.record(&MatchResult::no_match(&q3));

        assert_eq!(stats.deals_processed, 3);
        assert_eq!(stats.high_confidence, 1);
        assert_eq!(stats.low_confidence, 1);
        assert_eq!(stats.no_match, 1);
        assert_eq!(stats.verification_used, 2);
        assert_eq!(stats.all_candidates_rejected, 1);
        assert_eq!(stats.substring_matches, 1);
        assert!((stats.avg_confidence - 0.5).abs() < 1e-9);
    }
}
