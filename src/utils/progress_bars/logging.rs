// src/utils/progress_bars/logging.rs - Logging helpers for the deal matching run
use log::{info, warn};
use std::time::Instant;

use crate::models::matching::MatchResult;
use crate::models::stats::MatchRunStats;

#[derive(Clone)]
pub struct MatchingLogger {
    method_name: &'static str,
    method_emoji: &'static str,
    start_time: Instant,
}

impl MatchingLogger {
    pub fn new() -> Self {
        Self {
            method_name: "DEALS",
            method_emoji: "🍽️",
            start_time: Instant::now(),
        }
    }

    pub fn log_start(&self, run_id: &str, oracle: Option<&str>) {
        match oracle {
            Some(name) => info!(
                "[{}] {} 🚀 Starting deal matching (run ID: {}) with oracle verification via {}",
                self.method_name, self.method_emoji, run_id, name
            ),
            None => info!(
                "[{}] {} 🚀 Starting deal matching (run ID: {}) (lexical only)",
                self.method_name, self.method_emoji, run_id
            ),
        }
    }

    pub fn log_phase(&self, phase: &str, details: Option<&str>) {
        let elapsed = self.start_time.elapsed();
        let msg = if let Some(details) = details {
            format!(
                "[{}] {} 🔄 Phase: {} - {} [+{:.1}s]",
                self.method_name, self.method_emoji, phase, details, elapsed.as_secs_f32()
            )
        } else {
            format!(
                "[{}] {} 🔄 Phase: {} [+{:.1}s]",
                self.method_name, self.method_emoji, phase, elapsed.as_secs_f32()
            )
        };
        info!("{}", msg);
    }

    pub fn log_data_loaded(&self, count: usize, data_type: &str) {
        info!(
            "[{}] {} 📊 Loaded {} {} records",
            self.method_name, self.method_emoji, count, data_type
        );
    }

    pub fn log_match(&self, index: usize, total: usize, result: &MatchResult<'_>) {
        match &result.candidate {
            Some(candidate) => {
                let mut flags = Vec::new();
                if result.verification_used {
                    flags.push("verified");
                }
                if result.all_candidates_rejected {
                    flags.push("all rejected");
                }
                info!(
                    "[{}] {} {} {}/{} '{}' → '{}' ({:.1}%, {}){}",
                    self.method_name,
                    self.method_emoji,
                    result.confidence_bucket.icon(),
                    index,
                    total,
                    result.query.label,
                    candidate.entity.display_name,
                    candidate.adjusted_confidence * 100.0,
                    candidate.provenance.as_str(),
                    if flags.is_empty() {
                        String::new()
                    } else {
                        format!(" [{}]", flags.join(", "))
                    }
                );
            }
            None => warn!(
                "[{}] {} ⚠️  {}/{} '{}' → no restaurant to match against",
                self.method_name, self.method_emoji, index, total, result.query.label
            ),
        }
    }

    pub fn log_completion(&self, stats: &MatchRunStats) {
        let duration = self.start_time.elapsed();
        info!(
            "[{}] {} 🎉 COMPLETED: {} deals matched in {:.2?}",
            self.method_name, self.method_emoji, stats.deals_processed, duration
        );
        info!(
            "[{}] {} 📊 Results: {} high, {} review, {} low, {} no match, avg confidence: {:.3}",
            self.method_name,
            self.method_emoji,
            stats.high_confidence,
            stats.review_needed,
            stats.low_confidence,
            stats.no_match,
            stats.avg_confidence
        );
        if stats.oracle_enabled {
            info!(
                "[{}] {} 🤖 Oracle: {} verified, {} via phrase fallback, {} with every candidate rejected",
                self.method_name,
                self.method_emoji,
                stats.verification_used,
                stats.substring_matches,
                stats.all_candidates_rejected
            );
        }
    }

    pub fn log_warning(&self, message: &str) {
        warn!("[{}] {} ⚠️  {}", self.method_name, self.method_emoji, message);
    }
}

impl Default for MatchingLogger {
    fn default() -> Self {
        Self::new()
    }
}
