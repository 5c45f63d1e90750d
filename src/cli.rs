//! Command-line interface definitions.
//!
//! Every option except `--no-initial-scrape` can also come from the
//! environment. Anything not given here falls back to the config file, then
//! to built-in defaults.

use clap::Parser;
use std::path::PathBuf;

/// Financial news aggregator: scrapes market news into SQLite and serves it
/// over HTTP alongside index quotes.
///
/// # Examples
///
/// ```sh
/// # Defaults: listen on :8080, database at data/news.db
/// market_news_aggregator
///
/// # Custom config file and port
/// market_news_aggregator -c news.yaml -l 127.0.0.1:9000
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML config file
    #[arg(short, long, env = "NEWS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to bind the HTTP server to
    #[arg(short, long, env = "NEWS_LISTEN")]
    pub listen: Option<String>,

    /// Path to the SQLite database file
    #[arg(short, long, env = "NEWS_DATABASE")]
    pub database: Option<PathBuf>,

    /// Seconds between scheduled ingestion runs
    #[arg(long, env = "NEWS_SCRAPE_INTERVAL_SECS")]
    pub scrape_interval_secs: Option<u64>,

    /// Wait one full interval before the first ingestion run
    #[arg(long)]
    pub no_initial_scrape: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_no_args() {
        let cli = Cli::parse_from(["market_news_aggregator"]);
        assert!(cli.listen.is_none());
        assert!(!cli.no_initial_scrape);
    }

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "market_news_aggregator",
            "--listen",
            "127.0.0.1:9000",
            "--database",
            "/var/lib/news/news.db",
            "--scrape-interval-secs",
            "300",
            "--no-initial-scrape",
        ]);

        assert_eq!(cli.listen.as_deref(), Some("127.0.0.1:9000"));
        assert_eq!(cli.database, Some(PathBuf::from("/var/lib/news/news.db")));
        assert_eq!(cli.scrape_interval_secs, Some(300));
        assert!(cli.no_initial_scrape);
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from(["market_news_aggregator", "-c", "news.yaml", "-l", "0.0.0.0:8080"]);

        assert_eq!(cli.config, Some(PathBuf::from("news.yaml")));
        assert_eq!(cli.listen.as_deref(), Some("0.0.0.0:8080"));
    }

    #[test]
    fn test_cli_rejects_non_numeric_interval() {
        let res = Cli::try_parse_from(["market_news_aggregator", "--scrape-interval-secs", "soon"]);
        assert!(res.is_err());
    }
}
