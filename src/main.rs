use anyhow::{Context, Result};
use clap::Parser;
use dealmatch_lib::io::loader::{load_deals, load_restaurants};
use dealmatch_lib::io::writer::{
    CsvReporter, ALL_MATCHES_FILE, HIGH_CONFIDENCE_FILE, LOW_CONFIDENCE_FILE, REVIEW_FILE,
};
use dealmatch_lib::oracle::{AnthropicOracle, VerificationOracle};
use dealmatch_lib::utils::config::{MatcherConfig, OracleConfig};
use dealmatch_lib::utils::env::load_env;
use dealmatch_lib::utils::progress_bars::progress_config::{
    print_env_config_example, ProgressConfig,
};
use dealmatch_lib::{run_deal_matching, MatchResolver};
use log::{info, warn};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Restaurant list exported from the restaurant groups query
    #[arg(long, default_value = "rest_groups.csv")]
    restaurants: PathBuf,

    /// FLY deal allocation sheet
    #[arg(long, default_value = "fly_drop.csv")]
    deals: PathBuf,

    /// Directory for the result files
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Only match the first N deals
    #[arg(long)]
    limit: Option<usize>,

    /// Skip oracle verification even if an API key is configured
    #[arg(long)]
    no_oracle: bool,

    /// Ranked candidates sent to the oracle per deal
    #[arg(long)]
    retry_budget: Option<usize>,

    /// Print the supported environment variables and exit
    #[arg(long)]
    print_env: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    if args.print_env {
        print_env_config_example();
        return Ok(());
    }

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::init_from_env(env_logger::Env::default().default_filter_or(default_level));
    info!("Starting FLY deal to restaurant matching");
    let start_time = Instant::now();
    load_env();

    let mut matcher_config = MatcherConfig::from_env();
    if let Some(budget) = args.retry_budget {
        matcher_config = matcher_config.with_retry_budget(budget);
    }
    matcher_config.log_config();

    let mut oracle_config = OracleConfig::from_env();
    if args.no_oracle {
        oracle_config.enabled = false;
    }
    oracle_config.log_config();

    let progress_config = ProgressConfig::from_env();
    info!(
        "Progress tracking: enabled={}, detailed={}",
        progress_config.enabled, progress_config.detailed
    );

    let oracle = if oracle_config.is_available() {
        Some(AnthropicOracle::new(oracle_config).context("Failed to set up verification oracle")?)
    } else {
        None
    };
    let resolver = MatchResolver::new(
        matcher_config,
        oracle.as_ref().map(|o| o as &dyn VerificationOracle),
    );

    let entities = load_restaurants(&args.restaurants)?;
    let mut deals = load_deals(&args.deals)?;
    if let Some(limit) = args.limit {
        if limit < deals.len() {
            warn!("Quick run: matching only the first {} of {} deals", limit, deals.len());
            deals.truncate(limit);
        }
    }

    let mut reporter = CsvReporter::create(&args.output_dir)?;
    let stats = run_deal_matching(&entities, &deals, &resolver, &mut reporter, &progress_config)
        .context("Deal matching run failed")?;
    let summary_path = reporter.write_summary(&stats)?;

    let counts = reporter.counts();
    let output_dir = reporter.output_dir();
    info!("📊 ===== MATCHING SUMMARY =====");
    info!("Total FLY deals:         {}", stats.deals_processed);
    info!("High confidence (≥92%):  {}", stats.high_confidence);
    info!("Review needed (80-92%):  {}", stats.review_needed);
    info!("Low confidence (<80%):   {}", stats.low_confidence);
    info!("No match:                {}", stats.no_match);
    if stats.oracle_enabled {
        info!("Oracle verified:         {}", stats.verification_used);
        info!("Phrase fallback matches: {}", stats.substring_matches);
        info!("All candidates rejected: {}", stats.all_candidates_rejected);
    }
    info!("Output files:");
    info!("  • {} ({} rows)", output_dir.join(ALL_MATCHES_FILE).display(), counts.all);
    info!("  • {} ({} rows)", output_dir.join(HIGH_CONFIDENCE_FILE).display(), counts.high);
    info!("  • {} ({} rows)", output_dir.join(REVIEW_FILE).display(), counts.review);
    info!("  • {} ({} rows)", output_dir.join(LOW_CONFIDENCE_FILE).display(), counts.low);
    info!("  • {}", summary_path.display());
    info!("✅ Done in {:.2?}", start_time.elapsed());
    Ok(())
}
