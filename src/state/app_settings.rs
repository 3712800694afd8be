use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_REFRESH_SECS: u64 = 30;
const MIN_REFRESH_SECS: u64 = 5;

/// Settings read from the environment at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct AppSettings {
    /// Spoiler-free mode: print matchups without scores.
    pub hide_scores: bool,
    pub refresh_interval: Duration,
    pub injury_api_key: Option<String>,
    pub injury_cache: Option<PathBuf>,
    /// `env_logger` filter, e.g. "warn" or "nba_api=debug".
    pub log_filter: Option<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            hide_scores: false,
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_SECS),
            injury_api_key: None,
            injury_cache: None,
            log_filter: None,
        }
    }
}

impl AppSettings {
    pub fn load() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let refresh_secs = value("SQORZ_REFRESH_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_REFRESH_SECS)
            .max(MIN_REFRESH_SECS);

        Self {
            hide_scores: value("SQORZ_HIDE_SCORES").is_some_and(|v| is_truthy(&v)),
            refresh_interval: Duration::from_secs(refresh_secs),
            injury_api_key: value("SQORZ_INJURY_API_KEY"),
            injury_cache: value("SQORZ_INJURY_CACHE").map(PathBuf::from),
            log_filter: value("SQORZ_LOG"),
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
