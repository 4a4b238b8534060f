use std::env;

/// Process-wide configuration, loaded once from environment variables and
/// passed explicitly into each component. There is no hidden singleton —
/// every adapter, the loader, dedup, and linker take a `&Config` (or the
/// fields they need) as a constructor argument.
#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string for the canonical store.
    pub database_url: String,

    /// Root directory for staged downloads. Defaults to `./data`.
    pub data_dir: String,

    /// Default retry attempts for a single HTTP request.
    pub retry_attempts: u32,

    /// Base delay (seconds) for linear retry backoff: `base_delay * attempt`.
    pub retry_base_delay_secs: u64,

    /// Fuzzy-match Levenshtein threshold used by the deduplicator.
    pub dedup_fuzzy_threshold: usize,

    /// Proximity threshold (degrees) used by asset dedup.
    pub dedup_proximity_threshold: f64,

    /// Cron expression driving `--schedule` mode. Defaults to weekly,
    /// Sunday 02:00 local time.
    pub schedule_cron: String,
}

impl Config {
    /// Load configuration from environment variables. Panics with a clear
    /// message if `DATABASE_URL` is missing; every other field has a
    /// sensible default.
    pub fn from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            data_dir: env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string()),
            retry_attempts: env::var("RETRY_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            retry_base_delay_secs: env::var("RETRY_BASE_DELAY_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2),
            dedup_fuzzy_threshold: env::var("DEDUP_FUZZY_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
            dedup_proximity_threshold: env::var("DEDUP_PROXIMITY_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0.01),
            schedule_cron: env::var("SCHEDULE_CRON")
                .unwrap_or_else(|_| "0 0 2 * * SUN".to_string()),
        }
    }

    /// Read a per-source credential pair (`<SRC>_API_EMAIL` / `<SRC>_API_PASSWORD`).
    /// Returns `None` for either half that isn't set — callers decide whether
    /// that source requires authentication at all.
    pub fn source_credentials(source_tag: &str) -> (Option<String>, Option<String>) {
        let prefix = source_tag.to_uppercase();
        (
            env::var(format!("{prefix}_API_EMAIL")).ok(),
            env::var(format!("{prefix}_API_PASSWORD")).ok(),
        )
    }

    /// Log the first few characters of the connection string for debugging,
    /// without leaking credentials embedded in it.
    pub fn log_redacted(&self) {
        let redacted = self
            .database_url
            .split('@')
            .next_back()
            .unwrap_or("(unparseable)");
        tracing::info!(database_url = %format!("...@{redacted}"), data_dir = %self.data_dir, "loaded configuration");
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_credentials_missing_returns_none() {
        std::env::remove_var("ZZZ_API_EMAIL");
        std::env::remove_var("ZZZ_API_PASSWORD");
        let (email, password) = Config::source_credentials("zzz");
        assert!(email.is_none());
        assert!(password.is_none());
    }

    #[test]
    fn source_credentials_reads_uppercased_prefix() {
        std::env::set_var("TX_RRC_API_EMAIL", "user@example.com");
        std::env::set_var("TX_RRC_API_PASSWORD", "hunter2");
        let (email, password) = Config::source_credentials("tx_rrc");
        assert_eq!(email.as_deref(), Some("user@example.com"));
        assert_eq!(password.as_deref(), Some("hunter2"));
        std::env::remove_var("TX_RRC_API_EMAIL");
        std::env::remove_var("TX_RRC_API_PASSWORD");
    }
}
