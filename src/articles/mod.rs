//! Article-analytics engine for the news site.
//!
//! Listing pages are fetched through a chain of strategies (browser rendering
//! first, then plain HTTP) and parsed with the heuristics in [`parse`]. When
//! nothing usable comes back, the synthetic headline catalogue stands in.
//!
//! # Strategies
//!
//! | Strategy | Module | Sections | Needs |
//! |----------|--------|----------|-------|
//! | Cloudflare Browser Rendering | [`cloudflare`] | 6 | API token and account id |
//! | Browser-profile HTTP | [`direct`] | 6 | nothing |
//! | Basic HTTP | [`direct`] | 4 | nothing |
//!
//! Each strategy drops articles dated outside the requested period, so a page
//! full of stale links counts as "no data" and the next strategy runs.

pub mod cloudflare;
pub mod direct;
pub mod parse;

use crate::config::Config;
use crate::models::{ArticleAnalytics, ArticleData, EngagementMetrics, Period};
use crate::resolver::{BoxError, Resolution, Strategy, resolve};
use crate::synthetic;
use async_trait::async_trait;
use chrono::{Local, NaiveDate, TimeDelta};
use reqwest::Client;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

/// Site sections scanned for listings, the home page first.
pub const SECTIONS: [&str; 6] = ["", "cronaca", "sport", "cultura", "politica", "economia"];

/// Articles pulled for the analytics summary.
pub const ANALYTICS_SAMPLE: usize = 50;

/// Articles shown in the analytics top list.
pub const TOP_ARTICLES: usize = 10;

/// What the article strategies are asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArticleQuery {
    pub period: Period,
    pub limit: usize,
    /// Reference day for the period window.
    pub today: NaiveDate,
}

impl ArticleQuery {
    pub fn new(period: Period, limit: usize) -> Self {
        Self::on(period, limit, Local::now().date_naive())
    }

    pub fn on(period: Period, limit: usize, today: NaiveDate) -> Self {
        Self { period, limit, today }
    }

    /// First day inside the period window.
    pub fn window_start(&self) -> NaiveDate {
        self.today - TimeDelta::days(self.period.window_days() - 1)
    }

    /// Whether `article` was published inside the period window.
    pub fn accepts(&self, article: &ArticleData) -> bool {
        NaiveDate::parse_from_str(&article.publish_date, "%Y-%m-%d")
            .is_ok_and(|d| d >= self.window_start() && d <= self.today)
    }

    /// Keep accepted articles, most read first, at most `limit` of them.
    pub fn select(&self, mut articles: Vec<ArticleData>) -> Vec<ArticleData> {
        articles.retain(|a| self.accepts(a));
        articles.sort_by(|a, b| b.read_count.cmp(&a.read_count));
        articles.truncate(self.limit);
        articles
    }
}

impl fmt::Display for ArticleQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (limit {})", self.period, self.limit)
    }
}

/// Full URLs of the first `count` sections of the site.
pub fn section_urls(base_url: &str, count: usize) -> Vec<String> {
    let base = base_url.trim_end_matches('/');
    SECTIONS
        .iter()
        .take(count)
        .map(|section| format!("{base}/{section}"))
        .collect()
}

/// The page source refused our credentials. Retrying other URLs with the
/// same credentials cannot succeed.
#[derive(Debug, Error)]
#[error("credentials rejected with HTTP {0}")]
pub(crate) struct CredentialsRejected(pub reqwest::StatusCode);

/// Something that can turn a URL into page HTML.
#[async_trait]
pub(crate) trait PageSource: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<String, BoxError>;
}

/// Fetch `urls` in order until one yields articles inside the query window.
///
/// Waits `delay` between candidate URLs. Fetch errors are logged and skipped,
/// except [`CredentialsRejected`], which ends the scan.
pub(crate) async fn scan_sections(
    source: &dyn PageSource,
    label: &str,
    query: &ArticleQuery,
    base_url: &str,
    urls: &[String],
    delay: Duration,
) -> Option<Vec<ArticleData>> {
    for (i, url) in urls.iter().enumerate() {
        if i > 0 {
            sleep(delay).await;
        }
        debug!(strategy = label, %url, "Fetching listing page");
        match source.fetch_page(url).await {
            Ok(html) => {
                let found = parse::parse_articles(&html, base_url, usize::MAX, query.today);
                let parsed = found.len();
                let articles = query.select(found);
                if !articles.is_empty() {
                    info!(strategy = label, %url, count = articles.len(), "Found articles");
                    return Some(articles);
                }
                debug!(strategy = label, %url, parsed, "No articles inside the period");
            }
            Err(e) if e.downcast_ref::<CredentialsRejected>().is_some() => {
                warn!(strategy = label, %url, error = %e, "Credentials rejected; skipping remaining sections");
                return None;
            }
            Err(e) => warn!(strategy = label, %url, error = %e, "Listing fetch failed"),
        }
    }
    None
}

/// Summary statistics over `articles`. An empty list gives zeroed analytics.
pub fn analyze(articles: &[ArticleData], period: Period, today: NaiveDate) -> ArticleAnalytics {
    if articles.is_empty() {
        return empty_analytics(period, today);
    }

    let total_reads: u64 = articles.iter().map(|a| a.read_count).sum();
    let mut category_breakdown = BTreeMap::new();
    let mut author_performance = BTreeMap::new();
    for article in articles {
        *category_breakdown.entry(article.category.clone()).or_insert(0) += article.read_count;
        *author_performance.entry(article.author.clone()).or_insert(0) += article.read_count;
    }

    let mut top_articles = articles.to_vec();
    top_articles.sort_by(|a, b| b.read_count.cmp(&a.read_count));
    top_articles.truncate(TOP_ARTICLES);

    let count = articles.len() as f64;
    let total_social_shares: u64 = articles.iter().map(|a| a.social_shares).sum();
    let total_comments: u64 = articles.iter().map(|a| a.comments_count).sum();
    let engagement_rate = if total_reads > 0 {
        (total_social_shares + total_comments) as f64 / total_reads as f64
    } else {
        0.0
    };

    ArticleAnalytics {
        date: today.format("%Y-%m-%d").to_string(),
        period,
        total_articles: articles.len(),
        total_reads,
        top_articles,
        category_breakdown,
        author_performance,
        engagement_metrics: EngagementMetrics {
            average_engagement_score: articles.iter().map(|a| a.engagement_score).sum::<f64>() / count,
            total_social_shares,
            total_comments,
            average_reads_per_article: total_reads as f64 / count,
            engagement_rate,
        },
    }
}

pub fn empty_analytics(period: Period, today: NaiveDate) -> ArticleAnalytics {
    ArticleAnalytics {
        date: today.format("%Y-%m-%d").to_string(),
        period,
        total_articles: 0,
        total_reads: 0,
        top_articles: Vec::new(),
        category_breakdown: BTreeMap::new(),
        author_performance: BTreeMap::new(),
        engagement_metrics: EngagementMetrics::default(),
    }
}

pub struct ArticleEngine {
    strategies: Vec<Box<dyn Strategy<ArticleQuery, Vec<ArticleData>>>>,
    base_url: String,
    use_mock_data: bool,
    mock_variation: f64,
}

impl ArticleEngine {
    /// Build the engine with the full strategy chain from `config`.
    ///
    /// # Arguments
    ///
    /// * `config` - Cloudflare credentials, site URL, timeouts and mock settings
    /// * `client` - Shared HTTP client for the rendering and basic strategies
    ///
    /// # Errors
    ///
    /// Returns the reqwest error if the browser-profile client cannot be built.
    pub fn new(config: &Config, client: &Client) -> Result<Self, reqwest::Error> {
        let strategies: Vec<Box<dyn Strategy<ArticleQuery, Vec<ArticleData>>>> = vec![
            Box::new(cloudflare::BrowserRendering::new(config, client.clone())),
            Box::new(direct::BrowserProfile::new(config)?),
            Box::new(direct::Basic::new(config, client.clone())),
        ];
        Ok(Self::with_strategies(config, strategies))
    }

    /// Build the engine around an explicit strategy list, tried in order.
    pub fn with_strategies(
        config: &Config,
        strategies: Vec<Box<dyn Strategy<ArticleQuery, Vec<ArticleData>>>>,
    ) -> Self {
        Self {
            strategies,
            base_url: config.site.base_url.clone(),
            use_mock_data: config.use_mock_data,
            mock_variation: config.mock_data_variation,
        }
    }

    /// Articles used in mock mode, randomised when `mock_data_variation`
    /// is positive.
    fn mock_articles(&self, query: &ArticleQuery) -> Vec<ArticleData> {
        if self.mock_variation > 0.0 {
            synthetic::synthesize_articles_varied(&self.base_url, query.period, query.limit, query.today)
        } else {
            synthetic::synthesize_articles(&self.base_url, query.period, query.limit, query.today)
        }
    }

    /// Most-read articles for `period`, at most `limit`, newest window only.
    ///
    /// # Arguments
    ///
    /// * `period` - Window ending today
    /// * `limit` - Maximum number of articles returned
    ///
    /// # Returns
    ///
    /// Articles sorted by `read_count`, highest first, with the strategy that
    /// produced them in `outcome`. Falls back to the headline catalogue.
    pub async fn get_most_read_articles(&self, period: Period, limit: usize) -> Resolution<Vec<ArticleData>> {
        self.most_read(ArticleQuery::new(period, limit)).await
    }

    /// [`get_most_read_articles`](Self::get_most_read_articles) with an
    /// explicit reference day.
    #[instrument(level = "info", skip_all, fields(%query))]
    pub async fn most_read(&self, query: ArticleQuery) -> Resolution<Vec<ArticleData>> {
        let mut resolution = if self.use_mock_data {
            Resolution::synthetic(self.mock_articles(&query))
        } else {
            resolve(&query, &self.strategies, |q: &ArticleQuery| {
                synthetic::synthesize_articles(&self.base_url, q.period, q.limit, q.today)
            })
            .await
        };
        resolution.value = query.select(std::mem::take(&mut resolution.value));
        info!(
            source = %resolution.outcome,
            count = resolution.value.len(),
            "Most-read articles ready"
        );
        resolution
    }

    /// Analytics over the period's top [`ANALYTICS_SAMPLE`] articles.
    pub async fn get_article_analytics(&self, period: Period) -> ArticleAnalytics {
        let query = ArticleQuery::new(period, ANALYTICS_SAMPLE);
        let articles = self.most_read(query).await.value;
        analyze(&articles, period, query.today)
    }
}
