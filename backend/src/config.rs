use common::logger::LogFormat;
use scoring::dispatch::DEFAULT_WORKER_POOL_SIZE;

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Database connection string for the result store.
    pub database_url: String,

    /// Upper bound on asynchronous calculations running at the same time.
    ///
    /// Extra submissions queue on the pool until a worker frees up; the
    /// synchronous path is not affected by this limit.
    pub worker_pool_size: usize,

    /// JSON logs in production, pretty logs everywhere else.
    pub log_format: LogFormat,

    /// Fallbacks taken while parsing. Config is read before the logger is
    /// installed, so these are held until [`AppConfig::log_warnings`].
    pub warnings: Vec<String>,
}

pub const DEFAULT_DATABASE_URL: &str = "sqlite://scores.db?mode=rwc";

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Unparseable values
    /// fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let mut warnings = Vec::new();

        let worker_pool_size = match lookup("SCORING_WORKER_POOL_SIZE") {
            None => DEFAULT_WORKER_POOL_SIZE,
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n >= 1 => n,
                _ => {
                    warnings.push(format!(
                        "invalid SCORING_WORKER_POOL_SIZE={raw:?}; using default {DEFAULT_WORKER_POOL_SIZE}"
                    ));
                    DEFAULT_WORKER_POOL_SIZE
                }
            },
        };

        let log_format = if lookup("APP_ENV").as_deref() == Some("production") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        };

        Self {
            database_url,
            worker_pool_size,
            log_format,
            warnings,
        }
    }

    /// Emits the parse fallbacks. Call once the logger is up.
    pub fn log_warnings(&self) {
        for w in &self.warnings {
            tracing::warn!("{w}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tracing_test::traced_test;

    use super::*;

    fn cfg(pairs: &[(&str, &str)]) -> AppConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let c = cfg(&[]);
        assert_eq!(c.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(c.worker_pool_size, DEFAULT_WORKER_POOL_SIZE);
        assert_eq!(c.log_format, LogFormat::Pretty);
        assert!(c.warnings.is_empty());
    }

    #[test]
    fn values_are_read_from_lookup() {
        let c = cfg(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("SCORING_WORKER_POOL_SIZE", "16"),
            ("APP_ENV", "production"),
        ]);
        assert_eq!(c.database_url, "sqlite::memory:");
        assert_eq!(c.worker_pool_size, 16);
        assert_eq!(c.log_format, LogFormat::Json);
    }

    #[test]
    fn invalid_pool_size_falls_back() {
        assert_eq!(
            cfg(&[("SCORING_WORKER_POOL_SIZE", "zero")]).worker_pool_size,
            DEFAULT_WORKER_POOL_SIZE
        );
        assert_eq!(
            cfg(&[("SCORING_WORKER_POOL_SIZE", "0")]).worker_pool_size,
            DEFAULT_WORKER_POOL_SIZE
        );
    }

    #[test]
    #[traced_test]
    fn pool_size_fallback_is_logged_after_parsing() {
        let c = cfg(&[("SCORING_WORKER_POOL_SIZE", "zero")]);
        assert_eq!(c.warnings.len(), 1);
        assert!(c.warnings[0].contains("SCORING_WORKER_POOL_SIZE"));
        assert!(!logs_contain("SCORING_WORKER_POOL_SIZE"));

        c.log_warnings();

        assert!(logs_contain("invalid SCORING_WORKER_POOL_SIZE=\"zero\"; using default 4"));
    }
}
