// src/models/matching.rs
use log::warn;
use serde::{Deserialize, Serialize};

use crate::models::core::{Query, ReferenceEntity};

pub const NO_MATCH_NAME: &str = "NO_MATCH_FOUND";

/// Keeps every confidence inside [0, 1]; NaN collapses to 0.
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerificationState {
    Unverified,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provenance {
    /// Came out of the lexical ranking.
    RankedMatch,
    /// Found by the distinctive-phrase fallback after the ranked pool was rejected.
    SubstringMatch,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::RankedMatch => "ranked",
            Provenance::SubstringMatch => "substring",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfidenceBucket {
    High,
    Review,
    Low,
}

impl ConfidenceBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceBucket::High => "high",
            ConfidenceBucket::Review => "review",
            ConfidenceBucket::Low => "low",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            ConfidenceBucket::High => "✓",
            ConfidenceBucket::Review => "○",
            ConfidenceBucket::Low => "⚠",
        }
    }
}

/// A scored pairing of one query with one reference entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<'a> {
    pub entity: &'a ReferenceEntity,
    pub lexical_confidence: f64,
    pub adjusted_confidence: f64,
    pub verification_state: VerificationState,
    pub rationale: Option<String>,
    pub provenance: Provenance,
}

impl<'a> Candidate<'a> {
    pub fn new(entity: &'a ReferenceEntity, lexical_confidence: f64, provenance: Provenance) -> Self {
        let confidence = clamp_confidence(lexical_confidence);
        Self {
            entity,
            lexical_confidence: confidence,
            adjusted_confidence: confidence,
            verification_state: VerificationState::Unverified,
            rationale: None,
            provenance,
        }
    }

    pub fn apply_delta(&mut self, delta: f64) {
        self.adjusted_confidence = clamp_confidence(self.adjusted_confidence + delta);
    }

    /// Returns false when the candidate was already decided; the state is left untouched.
    pub fn accept(&mut self) -> bool {
        self.transition(VerificationState::Accepted)
    }

    pub fn reject(&mut self) -> bool {
        self.transition(VerificationState::Rejected)
    }

    pub fn is_rejected(&self) -> bool {
        self.verification_state == VerificationState::Rejected
    }

    fn transition(&mut self, next: VerificationState) -> bool {
        if self.verification_state != VerificationState::Unverified {
            warn!(
                "Ignoring {:?} -> {:?} for candidate '{}'",
                self.verification_state, next, self.entity.display_name
            );
            return false;
        }
        self.verification_state = next;
        true
    }
}

/// The single terminal outcome for one query.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult<'a> {
    pub query: &'a Query,
    /// `None` is the "no match" sentinel, produced only for an empty reference set.
    pub candidate: Option<Candidate<'a>>,
    pub confidence_bucket: ConfidenceBucket,
    pub verification_used: bool,
    pub all_candidates_rejected: bool,
    /// Every candidate the oracle actually judged, in the order it judged them.
    pub trail: Vec<Candidate<'a>>,
}

impl<'a> MatchResult<'a> {
    pub fn no_match(query: &'a Query) -> Self {
        Self {
            query,
            candidate: None,
            confidence_bucket: ConfidenceBucket::from_confidence(0.0),
            verification_used: false,
            all_candidates_rejected: false,
            trail: Vec::new(),
        }
    }

    pub fn resolved(
        query: &'a Query,
        candidate: Candidate<'a>,
        verification_used: bool,
        all_candidates_rejected: bool,
        trail: Vec<Candidate<'a>>,
    ) -> Self {
        Self {
            query,
            confidence_bucket: ConfidenceBucket::from_confidence(candidate.adjusted_confidence),
            candidate: Some(candidate),
            verification_used,
            all_candidates_rejected,
            trail,
        }
    }

    pub fn is_no_match(&self) -> bool {
        self.candidate.is_none()
    }

    pub fn final_confidence(&self) -> f64 {
        self.candidate
            .as_ref()
            .map(|c| c.adjusted_confidence)
            .unwrap_or(0.0)
    }

    pub fn provenance(&self) -> Option<Provenance> {
        self.candidate.as_ref().map(|c| c.provenance)
    }
}

/// Owned, flat view of a `MatchResult` as written to the output files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub deal_name: String,
    pub restaurant_name: String,
    pub location_name: String,
    pub match_confidence: String,
    pub verification_used: bool,
    pub all_candidates_rejected: bool,
    pub restaurant_id: String,
    pub restaurant_group_id: String,
    pub restaurant_group_name: String,
    pub fly_allocation: String,
    pub match_source: String,
    pub verification_note: String,
}

impl MatchRecord {
    pub fn from_result(result: &MatchResult<'_>) -> Self {
        let query = result.query;
        match &result.candidate {
            Some(candidate) => {
                let entity = candidate.entity;
                Self {
                    deal_name: query.label.clone(),
                    restaurant_name: entity.display_name.clone(),
                    location_name: entity.location_label.clone().unwrap_or_default(),
                    match_confidence: format_confidence(candidate.adjusted_confidence),
                    verification_used: result.verification_used,
                    all_candidates_rejected: result.all_candidates_rejected,
                    restaurant_id: entity.id.clone(),
                    restaurant_group_id: entity.group_id.clone(),
                    restaurant_group_name: entity.group_name.clone(),
                    fly_allocation: query.allocation_amount.clone(),
                    match_source: candidate.provenance.as_str().to_string(),
                    verification_note: candidate.rationale.clone().unwrap_or_default(),
                }
            }
            None => Self {
                deal_name: query.label.clone(),
                restaurant_name: NO_MATCH_NAME.to_string(),
                location_name: String::new(),
                match_confidence: format_confidence(0.0),
                verification_used: false,
                all_candidates_rejected: false,
                restaurant_id: String::new(),
                restaurant_group_id: String::new(),
                restaurant_group_name: String::new(),
                fly_allocation: query.allocation_amount.clone(),
                match_source: "none".to_string(),
                verification_note: String::new(),
            },
        }
    }
}

/// Percentage with one decimal, e.g. 0.8768 -> "87.7%".
pub fn format_confidence(confidence: f64) -> String {
    format!("{:.1}%", clamp_confidence(confidence) * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity() -> ReferenceEntity {
        ReferenceEntity::new("r-17", "Joe's Pizza", Some("Soho"), "g-3", "Joe's Pizza Group")
    }

    #[test]
    fn test_candidate_clamps_after_every_adjustment() {
        let e = entity();
        let mut candidate = Candidate::new(&e, 0.95, Provenance::RankedMatch);
        candidate.apply_delta(0.30);
        assert_eq!(candidate.adjusted_confidence, 1.0);
        candidate.apply_delta(-0.90);
        candidate.apply_delta(-0.90);
        assert_eq!(candidate.adjusted_confidence, 0.0);
        assert_eq!(candidate.lexical_confidence, 0.95);

        let over = Candidate::new(&e, 1.7, Provenance::RankedMatch);
        assert_eq!(over.lexical_confidence, 1.0);
    }

    #[test]
    fn test_verification_state_only_leaves_unverified_once() {
        let e = entity();
        let mut candidate = Candidate::new(&e, 0.5, Provenance::RankedMatch);
        assert!(candidate.reject());
        assert!(!candidate.accept());
        assert!(candidate.is_rejected());
    }

    #[test]
    fn test_record_for_matched_result() {
        let e = entity();
        let query = Query::new("Joe's Pizza Soho", "$1,200");
        let mut candidate = Candidate::new(&e, 0.8768, Provenance::SubstringMatch);
        candidate.rationale = Some("same storefront".to_string());
        let result = MatchResult::resolved(&query, candidate, true, false, Vec::new());

        let record = MatchRecord::from_result(&result);
        assert_eq!(record.restaurant_name, "Joe's Pizza");
        assert_eq!(record.location_name, "Soho");
        assert_eq!(record.match_confidence, "87.7%");
        assert_eq!(record.restaurant_group_id, "g-3");
        assert_eq!(record.fly_allocation, "$1,200");
        assert_eq!(record.match_source, "substring");
        assert_eq!(record.verification_note, "same storefront");
        assert!(record.verification_used);
    }

    #[test]
    fn test_record_for_no_match_sentinel() {
        let query = Query::new("Mystery Deal", "500");
        let result = MatchResult::no_match(&query);
        let record = MatchRecord::from_result(&result);
        assert_eq!(record.restaurant_name, NO_MATCH_NAME);
        assert_eq!(record.match_confidence, "0.0%");
        assert_eq!(record.match_source, "none");
        assert_eq!(result.confidence_bucket, ConfidenceBucket::Low);
    }
}
