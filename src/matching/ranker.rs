// src/matching/ranker.rs - Lexical ranking of every reference entity against one deal
use std::cmp::Ordering;

use crate::matching::name::name_similarity;
use crate::models::core::{Query, ReferenceEntity};
use crate::models::matching::{Candidate, Provenance};

/// Scores every named entity against the query label, best first.
///
/// `sort_by` is stable, so entities with equal scores keep their input order.
pub fn rank_candidates<'a>(query: &Query, entities: &'a [ReferenceEntity]) -> Vec<Candidate<'a>> {
    let mut ranked: Vec<Candidate<'a>> = entities
        .iter()
        .filter(|entity| entity.has_name())
        .map(|entity| {
            let confidence = name_similarity(&query.label, &entity.display_name).min(1.0);
            Candidate::new(entity, confidence, Provenance::RankedMatch)
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.lexical_confidence
            .partial_cmp(&a.lexical_confidence)
            .unwrap_or(Ordering::Equal)
    });
    ranked
}

/// The prefix of a ranking the resolver is allowed to verify.
pub fn top_k<'r, 'a>(ranked: &'r [Candidate<'a>], k: usize) -> &'r [Candidate<'a>] {
    &ranked[..k.min(ranked.len())]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entities() -> Vec<ReferenceEntity> {
        vec![
            ReferenceEntity::new("1", "Le Bernardin", Some("Midtown"), "g1", "Le Bernardin Group"),
            ReferenceEntity::new("2", "Joe's Pizza", Some("Soho"), "g2", "Joe's"),
            ReferenceEntity::new("3", "", None, "g3", "Nameless"),
            ReferenceEntity::new("4", "Joe's Pizzeria", Some("Chelsea"), "g2", "Joe's"),
        ]
    }

    #[test]
    fn test_rank_orders_descending_and_skips_empty_names() {
        let entities = entities();
        let query = Query::new("Joe's Pizza Soho", "1000");
        let ranked = rank_candidates(&query, &entities);

        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].entity.id, "2");
        assert!(ranked
            .windows(2)
            .all(|w| w[0].lexical_confidence >= w[1].lexical_confidence));
        assert!(ranked.iter().all(|c| c.adjusted_confidence == c.lexical_confidence));
        assert!(ranked.iter().all(|c| c.provenance == Provenance::RankedMatch));
    }

    #[test]
    fn test_ties_keep_input_order() {
        let entities = vec![
            ReferenceEntity::new("a", "Nobu", Some("Tribeca"), "g", "Nobu Hospitality"),
            ReferenceEntity::new("b", "Nobu", Some("Downtown"), "g", "Nobu Hospitality"),
            ReferenceEntity::new("c", "Nobu", Some("57th"), "g", "Nobu Hospitality"),
        ];
        let ranked = rank_candidates(&Query::new("Nobu", "1"), &entities);
        let ids: Vec<&str> = ranked.iter().map(|c| c.entity.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_top_k_is_bounded_by_ranking_length() {
        let entities = entities();
        let ranked = rank_candidates(&Query::new("Joe's Pizza", "1"), &entities);
        assert_eq!(top_k(&ranked, 2).len(), 2);
        assert_eq!(top_k(&ranked, 10).len(), 3);
        assert!(rank_candidates(&Query::new("Joe's Pizza", "1"), &[]).is_empty());
    }
}
