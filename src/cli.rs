//! Command-line interface definitions for the web ranking tool.
//!
//! This module defines the CLI arguments and options using the `clap` crate.

use crate::models::Period;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    Cli,
    Web,
}

/// Command-line arguments for the web ranking tool.
///
/// # Examples
///
/// ```sh
/// # Compare two sites and print the report
/// web_ranking --domains triesteallnews.it ilpiccolo.it
///
/// # Every source per domain, exported as CSV
/// web_ranking --domains triesteallnews.it --all-sources -o comparison.csv
///
/// # Most-read articles of the last week
/// web_ranking --articles last_7_days --limit 5
///
/// # Store an API key in the config file
/// web_ranking --set-key semrush=abc123
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Run once from the command line, or serve the JSON API
    #[arg(long, value_enum, default_value = "cli")]
    pub mode: Mode,

    /// Domains to compare
    #[arg(long, num_args = 1..)]
    pub domains: Vec<String>,

    /// Keep every source's record per domain instead of only the best one
    #[arg(long)]
    pub all_sources: bool,

    /// Most-read articles for a period (`daily` or `last_7_days`)
    #[arg(long, value_parser = parse_period)]
    pub articles: Option<Period>,

    /// Number of articles to list
    #[arg(long, default_value_t = 10)]
    pub limit: usize,

    /// Print the analytics summary for the article period
    #[arg(long)]
    pub analytics: bool,

    /// Export target; the extension picks CSV, JSON, or a text report
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Path to the YAML config file
    #[arg(short, long, env = "WEB_RANKING_CONFIG", default_value = "web_ranking.yaml")]
    pub config: PathBuf,

    /// Store an API key in the config file and exit, e.g. `seozoom=AK-123`
    #[arg(long, value_name = "PROVIDER=KEY", value_parser = parse_key_assignment)]
    pub set_key: Option<(String, String)>,

    /// Print the Cloudflare zone insights
    #[arg(long)]
    pub zone_info: bool,

    /// Use synthetic data only, without touching the network
    #[arg(long)]
    pub mock: bool,
}

impl Cli {
    /// Whether a cli-mode run has anything to do.
    pub fn has_action(&self) -> bool {
        !self.domains.is_empty() || self.articles.is_some() || self.zone_info || self.set_key.is_some()
    }
}

fn parse_period(s: &str) -> Result<Period, String> {
    s.parse()
}

fn parse_key_assignment(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((provider, key)) if !provider.trim().is_empty() && !key.trim().is_empty() => {
            Ok((provider.trim().to_string(), key.trim().to_string()))
        }
        _ => Err(format!("expected PROVIDER=KEY, got '{s}'")),
    }
}
