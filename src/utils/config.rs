// src/utils/config.rs - Matcher and oracle settings read from the environment
use log::info;
use std::env;
use std::time::Duration;

pub const DEFAULT_RETRY_BUDGET: usize = 3;
pub const DEFAULT_FALLBACK_LIMIT: usize = 3;
/// Lexical confidence given to an entity found by the phrase fallback.
pub const SUBSTRING_PRIOR: f64 = 0.70;

pub const DEFAULT_ORACLE_MODEL: &str = "claude-3-haiku-20240307";
pub const DEFAULT_ORACLE_API_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_ORACLE_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_ORACLE_MAX_TOKENS: u32 = 150;
pub const DEFAULT_ORACLE_MAX_RETRIES: u32 = 2;

/// Knobs of the resolver's retry policy.
#[derive(Debug, Clone, PartialEq)]
pub struct MatcherConfig {
    /// How many ranked candidates may be sent to the oracle per deal.
    pub retry_budget: usize,
    /// How many phrase-fallback candidates may be collected per deal.
    pub fallback_limit: usize,
    pub substring_prior: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            retry_budget: DEFAULT_RETRY_BUDGET,
            fallback_limit: DEFAULT_FALLBACK_LIMIT,
            substring_prior: SUBSTRING_PRIOR,
        }
    }
}

impl MatcherConfig {
    pub fn from_env() -> Self {
        Self {
            retry_budget: env::var("MATCH_RETRY_BUDGET")
                .unwrap_or_else(|_| DEFAULT_RETRY_BUDGET.to_string())
                .parse()
                .unwrap_or(DEFAULT_RETRY_BUDGET),
            fallback_limit: env::var("MATCH_FALLBACK_LIMIT")
                .unwrap_or_else(|_| DEFAULT_FALLBACK_LIMIT.to_string())
                .parse()
                .unwrap_or(DEFAULT_FALLBACK_LIMIT),
            substring_prior: SUBSTRING_PRIOR,
        }
    }

    pub fn with_retry_budget(mut self, retry_budget: usize) -> Self {
        self.retry_budget = retry_budget;
        self
    }

    pub fn log_config(&self) {
        info!(
            "🎯 Matcher: retry budget {}, fallback limit {}, fallback prior {:.2}",
            self.retry_budget, self.fallback_limit, self.substring_prior
        );
    }
}

/// Connection settings for the hosted verification model.
#[derive(Debug, Clone, PartialEq)]
pub struct OracleConfig {
    pub enabled: bool,
    pub api_key: Option<String>,
    pub model: String,
    pub api_url: String,
    pub timeout_secs: u64,
    pub max_tokens: u32,
    pub max_retries: u32,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            model: DEFAULT_ORACLE_MODEL.to_string(),
            api_url: DEFAULT_ORACLE_API_URL.to_string(),
            timeout_secs: DEFAULT_ORACLE_TIMEOUT_SECS,
            max_tokens: DEFAULT_ORACLE_MAX_TOKENS,
            max_retries: DEFAULT_ORACLE_MAX_RETRIES,
        }
    }
}

impl OracleConfig {
    pub fn from_env() -> Self {
        let api_key = env::var("ANTHROPIC_API_KEY")
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        Self {
            enabled: env::var("ORACLE_ENABLED")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
            api_key,
            model: env::var("ORACLE_MODEL").unwrap_or_else(|_| DEFAULT_ORACLE_MODEL.to_string()),
            api_url: env::var("ORACLE_API_URL")
                .unwrap_or_else(|_| DEFAULT_ORACLE_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            timeout_secs: env::var("ORACLE_TIMEOUT_SECS")
                .unwrap_or_else(|_| DEFAULT_ORACLE_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(DEFAULT_ORACLE_TIMEOUT_SECS),
            max_tokens: env::var("ORACLE_MAX_TOKENS")
                .unwrap_or_else(|_| DEFAULT_ORACLE_MAX_TOKENS.to_string())
                .parse()
                .unwrap_or(DEFAULT_ORACLE_MAX_TOKENS),
            max_retries: env::var("ORACLE_MAX_RETRIES")
                .unwrap_or_else(|_| DEFAULT_ORACLE_MAX_RETRIES.to_string())
                .parse()
                .unwrap_or(DEFAULT_ORACLE_MAX_RETRIES),
        }
    }

    /// An oracle is only built when it is switched on and a key is present.
    pub fn is_available(&self) -> bool {
        self.enabled && self.api_key.is_some()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn log_config(&self) {
        if self.is_available() {
            info!("🤖 Verification oracle ENABLED");
            info!("   Model: {} at {}", self.model, self.api_url);
            info!(
                "   Timeout: {}s, retries: {}, max tokens: {}",
                self.timeout_secs, self.max_retries, self.max_tokens
            );
        } else if !self.enabled {
            info!("🤖 Verification oracle DISABLED - lexical matching only");
        } else {
            info!("🤖 No ANTHROPIC_API_KEY set - lexical matching only");
        }
    }
}
