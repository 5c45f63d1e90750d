//! Runtime configuration.
//!
//! Settings come from an optional YAML file; every field has a default so an
//! empty or partial file is valid. Command-line flags override file values.
//!
//! ```yaml
//! listen: 0.0.0.0:8080
//! database: data/news.db
//! scrape_interval_secs: 900
//! quote_symbols: ["^NSEI", "^BSESN"]
//! cors_origin: http://localhost:5173
//! ```

use crate::cli::Cli;
use crate::error::ConfigError;
use crate::quotes::fetch::DEFAULT_BASE_URL;
use crate::summarizer::DEFAULT_MAX_SENTENCES;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, instrument};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Socket address the HTTP server binds to.
    pub listen: String,
    /// SQLite database file; its directory is created on startup.
    pub database: PathBuf,
    pub scrape_interval_secs: u64,
    /// Deadline for a single source adapter within one ingestion run.
    pub adapter_timeout_secs: u64,
    /// Politeness delay between an adapter's paginated requests.
    pub page_delay_ms: u64,
    pub quote_symbols: Vec<String>,
    /// Delay between consecutive quote requests.
    pub quote_delay_ms: u64,
    pub quote_base_url: String,
    /// The single browser origin allowed by CORS.
    pub cors_origin: String,
    pub summary_sentences: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8080".to_string(),
            database: PathBuf::from("data/news.db"),
            scrape_interval_secs: 15 * 60,
            adapter_timeout_secs: 120,
            page_delay_ms: 1000,
            quote_symbols: vec!["^NSEI".to_string(), "^BSESN".to_string()],
            quote_delay_ms: 500,
            quote_base_url: DEFAULT_BASE_URL.to_string(),
            cors_origin: "http://localhost:5173".to_string(),
            summary_sentences: DEFAULT_MAX_SENTENCES,
        }
    }
}

impl AppConfig {
    /// Load and validate a YAML config file.
    #[instrument(level = "info")]
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_yaml(&raw)?;
        debug!(?config, "Loaded configuration");
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        // an empty document deserializes to unit, not a map
        let config: Self = if raw.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(raw)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Resolve the effective config: file (if any), then CLI overrides.
    pub fn resolve(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = match &cli.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(listen) = &cli.listen {
            self.listen = listen.clone();
        }
        if let Some(database) = &cli.database {
            self.database = database.clone();
        }
        if let Some(secs) = cli.scrape_interval_secs {
            self.scrape_interval_secs = secs;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listen.trim().is_empty() {
            return Err(ConfigError::Invalid("listen address is empty".into()));
        }
        if self.scrape_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "scrape_interval_secs must be greater than zero".into(),
            ));
        }
        if self.adapter_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "adapter_timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn scrape_interval(&self) -> Duration {
        Duration::from_secs(self.scrape_interval_secs)
    }

    pub fn adapter_timeout(&self) -> Duration {
        Duration::from_secs(self.adapter_timeout_secs)
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn quote_delay(&self) -> Duration {
        Duration::from_millis(self.quote_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let c = AppConfig::default();
        assert_eq!(c.database, PathBuf::from("data/news.db"));
        assert_eq!(c.scrape_interval(), Duration::from_secs(900));
        assert_eq!(c.quote_delay(), Duration::from_millis(500));
        assert_eq!(c.quote_symbols, ["^NSEI", "^BSESN"]);
        assert_eq!(c.summary_sentences, 5);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let c = AppConfig::from_yaml("listen: 127.0.0.1:9000\nquote_symbols: [\"^NSEBANK\"]\n").unwrap();
        assert_eq!(c.listen, "127.0.0.1:9000");
        assert_eq!(c.quote_symbols, ["^NSEBANK"]);
        assert_eq!(c.cors_origin, "http://localhost:5173");
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(AppConfig::from_yaml("  \n").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_zero_interval_rejected() {
        assert!(matches!(
            AppConfig::from_yaml("scrape_interval_secs: 0"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_bad_yaml_is_parse_error() {
        assert!(matches!(
            AppConfig::from_yaml("quote_symbols: {not: a list}"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "listen: 0.0.0.0:7000\nscrape_interval_secs: 60").unwrap();

        let cli = Cli::parse_from([
            "market_news_aggregator",
            "--config",
            file.path().to_str().unwrap(),
            "--listen",
            "127.0.0.1:8081",
        ]);
        let c = AppConfig::resolve(&cli).unwrap();
        assert_eq!(c.listen, "127.0.0.1:8081");
        assert_eq!(c.scrape_interval_secs, 60);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = AppConfig::load(Path::new("/nonexistent/news.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
