// src/io/writer.rs - Incremental CSV output split by confidence bucket
use anyhow::{Context, Result};
use log::info;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::matching::classify::report_bucket;
use crate::matching::manager::ResultSink;
use crate::models::matching::{ConfidenceBucket, MatchRecord, MatchResult};
use crate::models::stats::MatchRunStats;

pub const ALL_MATCHES_FILE: &str = "restaurant_fly_matches_all.csv";
pub const HIGH_CONFIDENCE_FILE: &str = "restaurant_fly_matches_high_confidence.csv";
pub const REVIEW_FILE: &str = "restaurant_fly_matches_review.csv";
pub const LOW_CONFIDENCE_FILE: &str = "restaurant_fly_matches_low_confidence.csv";
pub const SUMMARY_FILE: &str = "restaurant_fly_matches_summary.json";

/// Rows written to each output file so far.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RowCounts {
    pub all: usize,
    pub high: usize,
    pub review: usize,
    pub low: usize,
}

/// Writes every result to the "all" file and matched results to their bucket file.
///
/// Each row is flushed as soon as it is written, so an interrupted run still
/// leaves well-formed files behind.
pub struct CsvReporter {
    output_dir: PathBuf,
    all: csv::Writer<File>,
    high: csv::Writer<File>,
    review: csv::Writer<File>,
    low: csv::Writer<File>,
    counts: RowCounts,
}

/// Column order of `MatchRecord`.
pub const OUTPUT_HEADERS: [&str; 12] = [
    "deal_name",
    "restaurant_name",
    "location_name",
    "match_confidence",
    "verification_used",
    "all_candidates_rejected",
    "restaurant_id",
    "restaurant_group_id",
    "restaurant_group_name",
    "fly_allocation",
    "match_source",
    "verification_note",
];

/// Opens `path` and writes the header straight away, so bucket files that
/// never receive a row are still valid CSV.
fn create_writer(path: &Path) -> Result<csv::Writer<File>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Failed to create output file {}", path.display()))?;
    writer
        .write_record(OUTPUT_HEADERS)
        .with_context(|| format!("Failed to write header to {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("Failed to flush {}", path.display()))?;
    Ok(writer)
}

fn write_row(writer: &mut csv::Writer<File>, record: &MatchRecord, file: &str) -> Result<()> {
    writer
        .serialize(record)
        .with_context(|| format!("Failed to write row to {}", file))?;
    writer
        .flush()
        .with_context(|| format!("Failed to flush {}", file))
}

impl CsvReporter {
    pub fn create(output_dir: &Path) -> Result<Self> {
        fs::create_dir_all(output_dir).with_context(|| {
            format!("Failed to create output directory {}", output_dir.display())
        })?;
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            all: create_writer(&output_dir.join(ALL_MATCHES_FILE))?,
            high: create_writer(&output_dir.join(HIGH_CONFIDENCE_FILE))?,
            review: create_writer(&output_dir.join(REVIEW_FILE))?,
            low: create_writer(&output_dir.join(LOW_CONFIDENCE_FILE))?,
            counts: RowCounts::default(),
        })
    }

    pub fn counts(&self) -> RowCounts {
        self.counts
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn write_summary(&self, stats: &MatchRunStats) -> Result<PathBuf> {
        let path = self.output_dir.join(SUMMARY_FILE);
        let json = serde_json::to_string_pretty(stats).context("Failed to serialize run summary")?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write run summary {}", path.display()))?;
        info!("💾 Run summary written to {}", path.display());
        Ok(path)
    }
}

impl ResultSink for CsvReporter {
    fn record(&mut self, result: &MatchResult<'_>) -> Result<()> {
        let record = MatchRecord::from_result(result);
        write_row(&mut self.all, &record, ALL_MATCHES_FILE)?;
        self.counts.all += 1;

        match report_bucket(result) {
            None => {}
            Some(ConfidenceBucket::High) => {
                write_row(&mut self.high, &record, HIGH_CONFIDENCE_FILE)?;
                self.counts.high += 1;
            }
            Some(ConfidenceBucket::Review) => {
                write_row(&mut self.review, &record, REVIEW_FILE)?;
                self.counts.review += 1;
            }
            Some(ConfidenceBucket::Low) => {
                write_row(&mut self.low, &record, LOW_CONFIDENCE_FILE)?;
                self.counts.low += 1;
            }
        }
        Ok(())
    }
}
