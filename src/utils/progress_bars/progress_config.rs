// src/utils/progress_bars/progress_config.rs

use indicatif::{ProgressBar, ProgressStyle};
use std::env;
use std::time::Duration;

/// Configuration for progress tracking during a matching run
#[derive(Debug, Clone)]
pub struct ProgressConfig {
    /// Whether to show progress bars at all
    pub enabled: bool,
    /// Whether to put the current deal name in the bar message
    pub detailed: bool,
    /// Refresh rate for progress bars in milliseconds
    pub refresh_rate_ms: u64,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            detailed: true,
            refresh_rate_ms: 100,
        }
    }
}

impl ProgressConfig {
    /// Create progress configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            enabled: env::var("PROGRESS_ENABLED")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
            detailed: env::var("PROGRESS_DETAILED")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
            refresh_rate_ms: env::var("PROGRESS_REFRESH_RATE_MS")
                .unwrap_or_else(|_| "100".to_string())
                .parse()
                .unwrap_or(100),
        }
    }

    /// A configured bar over `total` deals, or None when progress is off.
    pub fn create_bar(&self, total: u64) -> Option<ProgressBar> {
        if !self.enabled {
            return None;
        }
        let bar = ProgressBar::new(total);
        // A malformed template only costs us the custom look.
        if let Ok(style) = ProgressStyle::default_bar().template(
            "  {spinner:.blue} [{elapsed_precise}] {bar:30.cyan/blue} {pos}/{len} deals {msg}",
        ) {
            bar.set_style(style.progress_chars("#>-"));
        }
        bar.enable_steady_tick(Duration::from_millis(self.refresh_rate_ms.max(10)));
        Some(bar)
    }

    /// Check if detailed progress should be shown
    pub fn should_show_detailed(&self) -> bool {
        self.enabled && self.detailed
    }
}

/// Environment variable configuration example
pub fn print_env_config_example() {
    println!("# Deal matching configuration");
    println!();
    println!("# Key for the verification model; unset runs lexical matching only");
    println!("export ANTHROPIC_API_KEY=sk-ant-...");
    println!("export ORACLE_ENABLED=true");
    println!("export ORACLE_MODEL=claude-3-haiku-20240307");
    println!("export ORACLE_TIMEOUT_SECS=30");
    println!("export ORACLE_MAX_RETRIES=2");
    println!();
    println!("# Ranked candidates verified per deal, and phrase-fallback candidates (default: 3)");
    println!("export MATCH_RETRY_BUDGET=3");
    println!("export MATCH_FALLBACK_LIMIT=3");
    println!();
    println!("# Enable/disable progress bars (default: true)");
    println!("export PROGRESS_ENABLED=true");
    println!("export PROGRESS_DETAILED=true");
    println!("export PROGRESS_REFRESH_RATE_MS=100");
    println!();
    println!("# For minimal output (CI/automated environments):");
    println!("export PROGRESS_ENABLED=false");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_default_config() {
        let config = ProgressConfig::default();
        assert!(config.enabled);
        assert!(config.detailed);
        assert_eq!(config.refresh_rate_ms, 100);
    }

    #[test]
    fn test_env_config() {
        env::set_var("PROGRESS_ENABLED", "false");
        env::set_var("PROGRESS_DETAILED", "false");
        env::set_var("PROGRESS_REFRESH_RATE_MS", "50");

        let config = ProgressConfig::from_env();
        assert!(!config.enabled);
        assert!(!config.detailed);
        assert_eq!(config.refresh_rate_ms, 50);

        env::remove_var("PROGRESS_ENABLED");
        env::remove_var("PROGRESS_DETAILED");
        env::remove_var("PROGRESS_REFRESH_RATE_MS");
    }

    #[test]
    fn test_bar_creation() {
        let mut config = ProgressConfig::default();
        config.enabled = false;
        assert!(config.create_bar(10).is_none());
        assert!(!config.should_show_detailed());

        config.enabled = true;
        let bar = config.create_bar(10);
        assert!(bar.is_some());
        if let Some(bar) = bar {
            bar.finish_and_clear();
        }
        assert!(config.should_show_detailed());
    }
}
