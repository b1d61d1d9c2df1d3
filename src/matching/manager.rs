// src/matching/manager.rs - Sequential batch run over every deal
use anyhow::{Context, Result};

use crate::matching::resolver::MatchResolver;
use crate::models::core::{Query, ReferenceEntity};
use crate::models::matching::{MatchRecord, MatchResult};
use crate::models::stats::MatchRunStats;
use crate::utils::progress_bars::logging::MatchingLogger;
use crate::utils::progress_bars::progress_config::ProgressConfig;

/// Receives each result as soon as it is resolved.
pub trait ResultSink {
    fn record(&mut self, result: &MatchResult<'_>) -> Result<()>;
}

impl ResultSink for Vec<MatchRecord> {
    fn record(&mut self, result: &MatchResult<'_>) -> Result<()> {
        self.push(MatchRecord::from_result(result));
        Ok(())
    }
}

/// Resolves every deal in order and streams the results into `sink`.
///
/// A sink error aborts the run; whatever was already recorded stays recorded.
pub fn run_deal_matching(
    entities: &[ReferenceEntity],
    queries: &[Query],
    resolver: &MatchResolver<'_>,
    sink: &mut dyn ResultSink,
    progress: &ProgressConfig,
) -> Result<MatchRunStats> {
    let logger = MatchingLogger::new();
    let mut stats = MatchRunStats::new(resolver.has_oracle());
    logger.log_start(&stats.run_id, resolver.oracle_name());
    logger.log_data_loaded(entities.len(), "restaurant");
    logger.log_data_loaded(queries.len(), "deal");

    if entities.is_empty() {
        logger.log_warning("Restaurant list is empty, every deal will be reported as NO_MATCH_FOUND");
    }

    logger.log_phase("Matching", Some(&format!("{} deals", queries.len())));
    let pb = progress.create_bar(queries.len() as u64);
    let total = queries.len();

    for (index, query) in queries.iter().enumerate() {
        if let Some(pb) = &pb {
            if progress.should_show_detailed() {
                pb.set_message(query.label.clone());
            }
        }

        let result = resolver.resolve(query, entities);
        logger.log_match(index + 1, total, &result);
        stats.record(&result);
        sink.record(&result)
            .with_context(|| format!("Failed to record match for deal '{}'", query.label))?;

        if let Some(pb) = &pb {
            pb.inc(1);
        }
    }

    if let Some(pb) = &pb {
        pb.finish_with_message(format!(
            "{} high, {} review, {} low",
            stats.high_confidence, stats.review_needed, stats.low_confidence
        ));
    }

    stats.finish();
    logger.log_completion(&stats);
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::matching::NO_MATCH_NAME;
    use crate::utils::config::MatcherConfig;
    use anyhow::anyhow;

    fn quiet() -> ProgressConfig {
        ProgressConfig {
            enabled: false,
            ..ProgressConfig::default()
        }
    }

    fn entities() -> Vec<ReferenceEntity> {
        vec![
            ReferenceEntity::new("1", "Joe's Pizza", Some("Soho"), "g1", "Joe's"),
            ReferenceEntity::new("2", "Le Bernardin", Some("Midtown"), "g2", "Le Bernardin Group"),
        ]
    }

    #[test]
    fn test_one_record_per_deal_in_input_order() {
        let entities = entities();
        let queries = vec![
            Query::new("Le Bernardin NYC", "3000"),
            Query::new("Joe's Pizza Soho", "1000"),
        ];
        let resolver = MatchResolver::lexical_only(MatcherConfig::default());
        let mut records: Vec<MatchRecord> = Vec::new();

        let stats = run_deal_matching(&entities, &queries, &resolver, &mut records, &quiet()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].restaurant_name, "Le Bernardin");
        assert_eq!(records[1].restaurant_name, "Joe's Pizza");
        assert_eq!(records[1].fly_allocation, "1000");
        assert_eq!(stats.deals_processed, 2);
        assert!(!stats.oracle_enabled);
        assert!(stats.finished_at.is_some());
    }

    #[test]
    fn test_empty_reference_set_reports_no_match() {
        let queries = vec![Query::new("Joe's Pizza Soho", "1000")];
        let resolver = MatchResolver::lexical_only(MatcherConfig::default());
        let mut records: Vec<MatchRecord> = Vec::new();

        let stats = run_deal_matching(&[], &queries, &resolver, &mut records, &quiet()).unwrap();

        assert_eq!(records[0].restaurant_name, NO_MATCH_NAME);
        assert_eq!(stats.no_match, 1);
    }

    struct FailingSink {
        accepted: usize,
    }

    impl ResultSink for FailingSink {
        fn record(&mut self, _result: &MatchResult<'_>) -> Result<()> {
            if self.accepted == 1 {
                return Err(anyhow!("disk full"));
            }
            self.accepted += 1;
            Ok(())
        }
    }

    #[test]
    fn test_sink_error_stops_the_run() {
        let entities = entities();
        let queries = vec![
            Query::new("Joe's Pizza", "1"),
            Query::new("Le Bernardin", "2"),
            Query::new("Carbone", "3"),
        ];
        let resolver = MatchResolver::lexical_only(MatcherConfig::default());
        let mut sink = FailingSink { accepted: 0 };

        let err = run_deal_matching(&entities, &queries, &resolver, &mut sink, &quiet()).unwrap_err();
        assert!(format!("{:#}", err).contains("Le Bernardin"));
        assert_eq!(sink.accepted, 1);
    }
}
