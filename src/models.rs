//! Data models for traffic metrics and article statistics.
//!
//! This module defines the core data structures used throughout the application:
//! - [`WebsiteMetrics`]: One data source's view of a domain's traffic
//! - [`ArticleData`]: A single article with its estimated engagement numbers
//! - [`ArticleAnalytics`]: Aggregate statistics over a list of articles
//! - [`Period`]: The time window used by the article engine
//!
//! Records are created fresh on every fetch and are only persisted through an
//! explicit export (see [`crate::outputs`]).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Marker carried in `data_source` by every synthetic record.
pub const MOCK_MARKER: &str = "(Mock)";

/// Author used when no byline could be found.
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";

/// Traffic metrics for a single domain as reported (or estimated) by one source.
///
/// Every numeric field is optional because most providers only return a
/// subset of them. `data_source` names the strategy that produced the record;
/// synthetic records carry [`MOCK_MARKER`] in it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebsiteMetrics {
    /// The domain these metrics describe, e.g. `"triesteallnews.it"`.
    #[serde(default)]
    pub domain: String,
    /// Label of the strategy that produced the record.
    pub data_source: String,
    pub global_rank: Option<u64>,
    pub country_rank: Option<u64>,
    pub monthly_visits: Option<u64>,
    /// Bounce rate as a percentage.
    pub bounce_rate: Option<f64>,
    /// Average visit duration in seconds.
    pub avg_visit_duration: Option<f64>,
    pub pages_per_visit: Option<f64>,
    /// Traffic channel name to percentage.
    #[serde(default)]
    pub traffic_sources: BTreeMap<String, f64>,
    /// Country name to percentage.
    #[serde(default)]
    pub top_countries: BTreeMap<String, f64>,
    /// Technologies detected by tech-profiling sources (BuiltWith, Wappalyzer).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub technologies: Vec<String>,
}

impl WebsiteMetrics {
    /// Create an empty record for `domain` labelled with `data_source`.
    pub fn new(domain: &str, data_source: impl Into<String>) -> Self {
        Self {
            domain: domain.to_string(),
            data_source: data_source.into(),
            ..Default::default()
        }
    }

    /// Whether this record was manufactured by the synthetic generator.
    pub fn is_synthetic(&self) -> bool {
        self.data_source.contains(MOCK_MARKER)
    }

    /// Whether the record carries any traffic figure at all.
    pub fn has_traffic(&self) -> bool {
        self.monthly_visits.is_some_and(|v| v > 0) || self.global_rank.is_some_and(|r| r > 0)
    }
}

/// A single article with estimated engagement numbers.
///
/// Read counts and the other engagement figures are estimates; real values are
/// not published by the site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleData {
    pub title: String,
    pub url: String,
    /// Publication date in `YYYY-MM-DD` format.
    pub publish_date: String,
    pub category: String,
    pub author: String,
    pub read_count: u64,
    /// Engagement score between 0 and 10.
    pub engagement_score: f64,
    pub social_shares: u64,
    pub comments_count: u64,
    pub word_count: u64,
}

/// Time window for the most-read article listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Daily,
    #[serde(rename = "last_7_days", alias = "weekly")]
    Last7Days,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Daily => "daily",
            Period::Last7Days => "last_7_days",
        }
    }

    /// Number of calendar days (including today) an article may be old.
    pub fn window_days(&self) -> i64 {
        match self {
            Period::Daily => 1,
            Period::Last7Days => 7,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Period::Daily),
            "last_7_days" | "weekly" => Ok(Period::Last7Days),
            other => Err(format!(
                "unknown period '{other}' (expected 'daily' or 'last_7_days')"
            )),
        }
    }
}

/// Aggregate engagement figures over a list of articles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngagementMetrics {
    pub average_engagement_score: f64,
    pub total_social_shares: u64,
    pub total_comments: u64,
    pub average_reads_per_article: f64,
    /// `(shares + comments) / total_reads`, zero when there are no reads.
    pub engagement_rate: f64,
}

/// Summary statistics for one period of articles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleAnalytics {
    /// Date the analytics were computed, `YYYY-MM-DD`.
    pub date: String,
    pub period: Period,
    pub total_articles: usize,
    pub total_reads: u64,
    /// Up to ten articles, highest read count first.
    pub top_articles: Vec<ArticleData>,
    /// Category to total reads.
    pub category_breakdown: BTreeMap<String, u64>,
    /// Author to total reads.
    pub author_performance: BTreeMap<String, u64>,
    pub engagement_metrics: EngagementMetrics,
}

/// Per-domain results of a comparison run, in the order the domains were given.
pub type Comparison = Vec<(String, Vec<WebsiteMetrics>)>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new_is_empty() {
        let m = WebsiteMetrics::new("example.com", "PageSpeed");
        assert_eq!(m.domain, "example.com");
        assert_eq!(m.data_source, "PageSpeed");
        assert!(m.monthly_visits.is_none());
        assert!(m.traffic_sources.is_empty());
        assert!(!m.has_traffic());
    }

    #[test]
    fn test_is_synthetic_checks_marker() {
        let real = WebsiteMetrics::new("example.com", "SEOZoom (Real - keywords)");
        let mock = WebsiteMetrics::new("example.com", "SEOZoom (Mock)");
        assert!(!real.is_synthetic());
        assert!(mock.is_synthetic());
    }

    #[test]
    fn test_has_traffic_with_rank_only() {
        let mut m = WebsiteMetrics::new("example.com", "SEMrush");
        m.global_rank = Some(1200);
        assert!(m.has_traffic());
        m.global_rank = Some(0);
        assert!(!m.has_traffic());
    }

    #[test]
    fn test_period_parsing() {
        assert_eq!("daily".parse::<Period>().unwrap(), Period::Daily);
        assert_eq!("last_7_days".parse::<Period>().unwrap(), Period::Last7Days);
        assert_eq!("Weekly".parse::<Period>().unwrap(), Period::Last7Days);
        assert!("monthly".parse::<Period>().is_err());
    }

    #[test]
    fn test_period_serialization() {
        let json = serde_json::to_string(&Period::Last7Days).unwrap();
        assert_eq!(json, "\"last_7_days\"");
        let back: Period = serde_json::from_str("\"weekly\"").unwrap();
        assert_eq!(back, Period::Last7Days);
        assert_eq!(Period::Daily.to_string(), "daily");
    }

    #[test]
    fn test_metrics_serialization_skips_empty_technologies() {
        let m = WebsiteMetrics::new("example.com", "PageSpeed");
        let json = serde_json::to_string(&m).unwrap();
        assert!(!json.contains("technologies"));

        let parsed: WebsiteMetrics =
            serde_json::from_str(r#"{"domain":"a.it","data_source":"X","global_rank":null,"country_rank":null,"monthly_visits":5,"bounce_rate":null,"avg_visit_duration":null,"pages_per_visit":null}"#)
                .unwrap();
        assert_eq!(parsed.monthly_visits, Some(5));
        assert!(parsed.top_countries.is_empty());
    }
}
