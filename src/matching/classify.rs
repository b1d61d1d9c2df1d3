// src/matching/classify.rs - Confidence buckets for final matches
use crate::models::matching::{ConfidenceBucket, MatchResult};

/// Inclusive lower bound of the High bucket.
pub const HIGH_CONFIDENCE_THRESHOLD: f64 = 0.92;
/// Inclusive lower bound of the Review bucket.
pub const REVIEW_CONFIDENCE_THRESHOLD: f64 = 0.80;

impl ConfidenceBucket {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= HIGH_CONFIDENCE_THRESHOLD {
            ConfidenceBucket::High
        } else if confidence >= REVIEW_CONFIDENCE_THRESHOLD {
            ConfidenceBucket::Review
        } else {
            ConfidenceBucket::Low
        }
    }
}

/// Bucket a result is reported under. The no-match sentinel has none, so it
/// never lands in a bucket file or bucket count.
pub fn report_bucket(result: &MatchResult<'_>) -> Option<ConfidenceBucket> {
    if result.is_no_match() {
        None
    } else {
        Some(result.confidence_bucket)
    }
}
