// src/oracle/mod.rs - Semantic verification of candidate pairings
//
// The resolver only ever talks to `OracleAdapter`. Whatever sits behind
// `VerificationOracle` (a live model, a scripted stand-in) may fail in any way;
// the adapter turns every failure into "accept, no adjustment".
use anyhow::Result;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

pub mod client;
pub mod parse;

pub use client::AnthropicOracle;

pub const ACCEPT_HIGH_DELTA: f64 = 0.30;
pub const ACCEPT_MEDIUM_DELTA: f64 = 0.15;
pub const ACCEPT_LOW_DELTA: f64 = 0.05;
/// Large enough to veto any lexical score.
pub const REJECT_DELTA: f64 = -0.90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Accept,
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

/// What an oracle said about one (deal, restaurant) pairing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Judgment {
    pub decision: Decision,
    pub tier: Option<ConfidenceTier>,
    pub rationale: String,
}

impl Judgment {
    pub fn accept(tier: Option<ConfidenceTier>, rationale: impl Into<String>) -> Self {
        Self {
            decision: Decision::Accept,
            tier,
            rationale: rationale.into(),
        }
    }

    pub fn reject(tier: Option<ConfidenceTier>, rationale: impl Into<String>) -> Self {
        Self {
            decision: Decision::Reject,
            tier,
            rationale: rationale.into(),
        }
    }

    pub fn confidence_delta(&self) -> f64 {
        match (self.decision, self.tier) {
            (Decision::Reject, _) => REJECT_DELTA,
            (Decision::Accept, Some(ConfidenceTier::High)) => ACCEPT_HIGH_DELTA,
            (Decision::Accept, Some(ConfidenceTier::Medium)) => ACCEPT_MEDIUM_DELTA,
            (Decision::Accept, Some(ConfidenceTier::Low)) | (Decision::Accept, None) => {
                ACCEPT_LOW_DELTA
            }
        }
    }
}

/// External capability answering "do these denote the same real-world place?".
pub trait VerificationOracle {
    fn name(&self) -> &str;

    fn judge(
        &self,
        query_label: &str,
        candidate_name: &str,
        candidate_location: Option<&str>,
    ) -> Result<Judgment>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerdictSource {
    /// The oracle answered and the answer was understood.
    Oracle,
    /// The oracle was unreachable, errored or answered nonsense.
    FailOpen,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Verification {
    pub accepted: bool,
    pub confidence_delta: f64,
    pub rationale: Option<String>,
    pub source: VerdictSource,
}

impl Verification {
    fn fail_open() -> Self {
        Self {
            accepted: true,
            confidence_delta: 0.0,
            rationale: None,
            source: VerdictSource::FailOpen,
        }
    }

    pub fn is_fail_open(&self) -> bool {
        self.source == VerdictSource::FailOpen
    }
}

pub struct OracleAdapter<'o> {
    oracle: &'o dyn VerificationOracle,
}

impl<'o> OracleAdapter<'o> {
    pub fn new(oracle: &'o dyn VerificationOracle) -> Self {
        Self { oracle }
    }

    pub fn oracle_name(&self) -> &str {
        self.oracle.name()
    }

    /// Never fails: oracle errors come back as an accepting, zero-delta verdict.
    pub fn verify(
        &self,
        query_label: &str,
        candidate_name: &str,
        candidate_location: Option<&str>,
    ) -> Verification {
        match self
            .oracle
            .judge(query_label, candidate_name, candidate_location)
        {
            Ok(judgment) => {
                debug!(
                    "🤖 {} judged '{}' vs '{}': {:?} ({:?})",
                    self.oracle.name(),
                    query_label,
                    candidate_name,
                    judgment.decision,
                    judgment.tier
                );
                let rationale = judgment.rationale.trim();
                Verification {
                    accepted: judgment.decision == Decision::Accept,
                    confidence_delta: judgment.confidence_delta(),
                    rationale: (!rationale.is_empty()).then(|| rationale.to_string()),
                    source: VerdictSource::Oracle,
                }
            }
            Err(e) => {
                warn!(
                    "⚠️  {} unavailable for '{}' vs '{}', trusting lexical score: {:#}",
                    self.oracle.name(),
                    query_label,
                    candidate_name,
                    e
                );
                Verification::fail_open()
            }
        }
    }
}
