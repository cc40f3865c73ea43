//! Website-ranking engine.
//!
//! Wraps the metric sources in a resolver chain and compares several domains
//! in one run. With `use_mock_data` set, the network is never touched and
//! every record comes from the synthetic generator.

use crate::config::Config;
use crate::models::{Comparison, WebsiteMetrics};
use crate::resolver::{Resolution, Strategy, gather, resolve};
use crate::sources::metric_chain;
use crate::synthetic::{self, Provider};
use crate::utils::clean_domain;
use reqwest::Client;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, instrument, warn};

pub struct RankingEngine {
    strategies: Vec<Box<dyn Strategy<str, WebsiteMetrics>>>,
    use_mock_data: bool,
    mock_variation: f64,
    rate_limit_delay: Duration,
}

impl RankingEngine {
    /// Build the engine with the full source chain from `config`.
    ///
    /// # Arguments
    ///
    /// * `config` - API keys, base URLs, mock settings and the rate-limit delay
    /// * `client` - Shared HTTP client handed to every source
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let engine = RankingEngine::new(&config, &build_client(&config)?);
    /// let best = engine.analyze_domain("triesteallnews.it").await;
    /// println!("{}", best.value.data_source);
    /// ```
    pub fn new(config: &Config, client: &Client) -> Self {
        Self::with_strategies(config, metric_chain(config, client))
    }

    /// Build the engine around an explicit strategy list.
    ///
    /// Only the mock settings and the rate-limit delay are read from
    /// `config`; keys and URLs are whatever `strategies` already hold.
    ///
    /// # Arguments
    ///
    /// * `config` - Source of `use_mock_data`, `mock_data_variation` and the delay
    /// * `strategies` - Sources in priority order, tried first to last
    pub fn with_strategies(config: &Config, strategies: Vec<Box<dyn Strategy<str, WebsiteMetrics>>>) -> Self {
        let configured = strategies.iter().filter(|s| s.is_configured()).count();
        info!(
            sources = strategies.len(),
            configured,
            mock = config.use_mock_data,
            "Ranking engine ready"
        );
        Self {
            strategies,
            use_mock_data: config.use_mock_data,
            mock_variation: config.mock_data_variation,
            rate_limit_delay: config.rate_limit_delay(),
        }
    }

    /// The record used in mock mode, randomised when `mock_data_variation`
    /// is positive.
    fn mock_record(&self, domain: &str) -> WebsiteMetrics {
        if self.mock_variation > 0.0 {
            synthetic::synthesize_metrics_varied(domain, self.mock_variation)
        } else {
            synthetic::synthesize_metrics(domain)
        }
    }

    /// Resolve the best available metrics for one domain.
    ///
    /// # Arguments
    ///
    /// * `domain` - A cleaned domain such as `"example.com"`
    ///
    /// # Returns
    ///
    /// A [`Resolution`] that always carries a record. When no source
    /// delivers, the record comes from [`synthetic::synthesize_metrics`], is
    /// identical on every call, and says so in its `data_source`. Mock mode
    /// skips the sources and may apply `mock_data_variation`.
    #[instrument(level = "info", skip(self))]
    pub async fn analyze_domain(&self, domain: &str) -> Resolution<WebsiteMetrics> {
        if self.use_mock_data {
            return Resolution::synthetic(self.mock_record(domain));
        }
        resolve(domain, &self.strategies, synthetic::synthesize_metrics).await
    }

    /// Every record the configured sources produce for `domain`.
    ///
    /// In mock mode this is one synthetic record per known provider. When no
    /// source delivers, the synthetic record is returned alone.
    #[instrument(level = "info", skip(self))]
    pub async fn gather_domain(&self, domain: &str) -> Vec<WebsiteMetrics> {
        if self.use_mock_data {
            return Provider::ALL
                .iter()
                .map(|p| synthetic::mock_metrics(*p, domain))
                .collect();
        }
        let results = gather(domain, &self.strategies).await;
        if results.is_empty() {
            warn!(%domain, "No source produced data; using synthetic metrics");
            vec![synthetic::synthesize_metrics(domain)]
        } else {
            results
        }
    }

    /// Compare `domains`, keeping their input order.
    ///
    /// Inputs that do not clean to a domain are skipped with a warning. With
    /// `all_sources` every source's record is kept, otherwise only the best one.
    #[instrument(level = "info", skip_all, fields(count = domains.len(), all_sources))]
    pub async fn compare_websites(&self, domains: &[String], all_sources: bool) -> Comparison {
        let mut comparison = Comparison::new();
        for raw in domains {
            let Some(domain) = clean_domain(raw) else {
                warn!(input = %raw, "Skipping invalid domain");
                continue;
            };
            if !comparison.is_empty() && !self.use_mock_data {
                sleep(self.rate_limit_delay).await;
            }
            info!(%domain, "Analyzing");
            let records = if all_sources {
                self.gather_domain(&domain).await
            } else {
                vec![self.analyze_domain(&domain).await.value]
            };
            comparison.push((domain, records));
        }
        info!(domains = comparison.len(), "Comparison complete");
        comparison
    }
}
