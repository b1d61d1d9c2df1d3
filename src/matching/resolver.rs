// src/matching/resolver.rs - Verification, retry and phrase fallback for one deal
//
// Resolution is a small state machine:
//
//   Ranking -> Verifying(0..K) -> SubstringSearch -> VerifyingSubstring(0..F) -> Exhausted -> Done
//
// Every path ends in `Done` with exactly one `MatchResult`. Oracle failures are
// absorbed by the adapter and never surface here.
use log::debug;

use crate::matching::name::{extract_terms, normalize_name};
use crate::matching::ranker::{rank_candidates, top_k};
use crate::models::core::{Query, ReferenceEntity};
use crate::models::matching::{Candidate, MatchResult, Provenance};
use crate::oracle::{OracleAdapter, Verification, VerificationOracle};
use crate::utils::config::MatcherConfig;

#[derive(Debug)]
enum ResolveState<'a> {
    Ranking,
    Verifying(usize),
    SubstringSearch,
    VerifyingSubstring(usize),
    Exhausted,
    Done(MatchResult<'a>),
}

/// Working set of one resolution run.
struct Resolution<'a> {
    query: &'a Query,
    ranked: Vec<Candidate<'a>>,
    fallback: Vec<Candidate<'a>>,
    trail: Vec<Candidate<'a>>,
    verification_used: bool,
}

impl<'a> Resolution<'a> {
    fn new(query: &'a Query) -> Self {
        Self {
            query,
            ranked: Vec::new(),
            fallback: Vec::new(),
            trail: Vec::new(),
            verification_used: false,
        }
    }

    fn was_rejected(&self, entity: &ReferenceEntity) -> bool {
        self.ranked
            .iter()
            .any(|c| c.is_rejected() && std::ptr::eq(c.entity, entity))
    }

    fn already_picked(&self, entity: &ReferenceEntity) -> bool {
        self.fallback.iter().any(|c| std::ptr::eq(c.entity, entity))
    }

    fn finish(&mut self, candidate: Candidate<'a>, all_rejected: bool) -> ResolveState<'a> {
        ResolveState::Done(MatchResult::resolved(
            self.query,
            candidate,
            self.verification_used,
            all_rejected,
            std::mem::take(&mut self.trail),
        ))
    }
}

/// Applies an oracle verdict to a candidate. Returns whether it was accepted.
fn apply_verification(candidate: &mut Candidate<'_>, verification: Verification) -> bool {
    candidate.apply_delta(verification.confidence_delta);
    candidate.rationale = verification.rationale;
    if verification.accepted {
        candidate.accept();
        true
    } else {
        candidate.reject();
        false
    }
}

pub struct MatchResolver<'o> {
    config: MatcherConfig,
    adapter: Option<OracleAdapter<'o>>,
}

impl<'o> MatchResolver<'o> {
    pub fn new(config: MatcherConfig, oracle: Option<&'o dyn VerificationOracle>) -> Self {
        Self {
            config,
            adapter: oracle.map(OracleAdapter::new),
        }
    }

    pub fn lexical_only(config: MatcherConfig) -> Self {
        Self::new(config, None)
    }

    pub fn has_oracle(&self) -> bool {
        self.adapter.is_some()
    }

    pub fn oracle_name(&self) -> Option<&str> {
        self.adapter.as_ref().map(|adapter| adapter.oracle_name())
    }

    /// Resolves one deal against the reference list. Never fails.
    pub fn resolve<'a>(&self, query: &'a Query, entities: &'a [ReferenceEntity]) -> MatchResult<'a> {
        let mut run = Resolution::new(query);
        let mut state = ResolveState::Ranking;

        loop {
            state = match state {
                ResolveState::Ranking => {
                    run.ranked = rank_candidates(query, entities);
                    if run.ranked.is_empty() {
                        debug!("No named restaurants to match '{}' against", query.label);
                        ResolveState::Done(MatchResult::no_match(query))
                    } else {
                        ResolveState::Verifying(0)
                    }
                }
                ResolveState::Verifying(i) => self.verify_ranked(&mut run, i),
                ResolveState::SubstringSearch => self.search_substrings(&mut run, entities),
                ResolveState::VerifyingSubstring(j) => self.verify_substring(&mut run, j),
                ResolveState::Exhausted => {
                    debug!(
                        "Every candidate for '{}' was rejected, keeping the best ranked one",
                        query.label
                    );
                    let best = run.ranked[0].clone();
                    run.finish(best, true)
                }
                ResolveState::Done(result) => return result,
            };
        }
    }

    fn verify_ranked<'a>(&self, run: &mut Resolution<'a>, i: usize) -> ResolveState<'a> {
        let budget = top_k(&run.ranked, self.config.retry_budget.max(1)).len();
        if i >= budget {
            return ResolveState::SubstringSearch;
        }

        let adapter = match &self.adapter {
            Some(adapter) => adapter,
            None => {
                let mut candidate = run.ranked[i].clone();
                candidate.accept();
                return run.finish(candidate, false);
            }
        };

        let entity = run.ranked[i].entity;
        let verification =
            adapter.verify(&run.query.label, &entity.display_name, entity.location());

        if verification.is_fail_open() {
            let mut candidate = run.ranked[i].clone();
            candidate.accept();
            return run.finish(candidate, false);
        }

        run.verification_used = true;
        let accepted = apply_verification(&mut run.ranked[i], verification);
        run.trail.push(run.ranked[i].clone());
        debug!(
            "Ranked candidate {} '{}' for '{}': {} ({:.3})",
            i + 1,
            entity.display_name,
            run.query.label,
            if accepted { "accepted" } else { "rejected" },
            run.ranked[i].adjusted_confidence
        );

        if accepted {
            let candidate = run.ranked[i].clone();
            run.finish(candidate, false)
        } else {
            ResolveState::Verifying(i + 1)
        }
    }

    fn search_substrings<'a>(
        &self,
        run: &mut Resolution<'a>,
        entities: &'a [ReferenceEntity],
    ) -> ResolveState<'a> {
        if self.adapter.is_none() || self.config.fallback_limit == 0 {
            return ResolveState::Exhausted;
        }

        let normalized: Vec<String> = entities
            .iter()
            .map(|e| normalize_name(&e.display_name))
            .collect();

        'terms: for term in extract_terms(&run.query.label) {
            let needle = normalize_name(&term);
            if needle.is_empty() {
                continue;
            }
            for (entity, name) in entities.iter().zip(&normalized) {
                if name.is_empty() || !name.contains(&needle) {
                    continue;
                }
                if run.was_rejected(entity) || run.already_picked(entity) {
                    continue;
                }
                debug!(
                    "Phrase '{}' from '{}' found in '{}'",
                    term, run.query.label, entity.display_name
                );
                run.fallback.push(Candidate::new(
                    entity,
                    self.config.substring_prior,
                    Provenance::SubstringMatch,
                ));
                if run.fallback.len() >= self.config.fallback_limit {
                    break 'terms;
                }
            }
        }

        if run.fallback.is_empty() {
            ResolveState::Exhausted
        } else {
            ResolveState::VerifyingSubstring(0)
        }
    }

    fn verify_substring<'a>(&self, run: &mut Resolution<'a>, j: usize) -> ResolveState<'a> {
        let adapter = match &self.adapter {
            Some(adapter) if j < run.fallback.len() => adapter,
            _ => return ResolveState::Exhausted,
        };

        let entity = run.fallback[j].entity;
        let verification =
            adapter.verify(&run.query.label, &entity.display_name, entity.location());
        if verification.is_fail_open() {
            // Without a working oracle a phrase hit is no better than the ranking.
            return ResolveState::Exhausted;
        }

        run.verification_used = true;
        let accepted = apply_verification(&mut run.fallback[j], verification);
        run.trail.push(run.fallback[j].clone());

        if accepted {
            let candidate = run.fallback[j].clone();
            run.finish(candidate, false)
        } else {
            ResolveState::VerifyingSubstring(j + 1)
        }
    }
}
