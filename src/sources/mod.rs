//! Metric sources for the website-ranking engine.
//!
//! Each submodule wraps one third-party API and implements
//! [`Strategy<str, WebsiteMetrics>`](crate::resolver::Strategy) for a bare
//! domain. The resolver tries them in the order [`metric_chain`] returns.
//!
//! # Supported Sources
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | SEOZoom | [`seozoom`] | Keyword API | Tries URL variants and two actions |
//! | PageSpeed Insights | [`pagespeed`] | Lighthouse API | Traffic figures are estimated |
//! | BuiltWith | [`builtwith`] | Domain API | Technologies only |
//! | Wappalyzer | [`wappalyzer`] | Lookup API | Technologies only |
//! | SimilarWeb | [`similarweb`] | Website API | Four endpoint variants |
//! | SEMrush | [`semrush`] | Domain ranks | Organic figures |
//!
//! A source without an API key reports itself as unconfigured and is skipped.
//! Non-2xx responses become errors, which the resolver logs and treats as
//! "no data".

pub mod builtwith;
pub mod pagespeed;
pub mod semrush;
pub mod seozoom;
pub mod similarweb;
pub mod wappalyzer;

use crate::config::Config;
use crate::models::WebsiteMetrics;
use crate::resolver::{BoxError, Strategy};
use crate::utils::truncate_for_log;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;

/// Strategy list for the website-ranking engine, highest priority first.
///
/// Every source is built, keyed or not. Sources without an API key report
/// themselves unconfigured and the resolver skips them.
///
/// # Arguments
///
/// * `config` - Supplies the per-provider API keys and base URLs
/// * `client` - Shared HTTP client, cloned into each source
///
/// # Returns
///
/// SEOZoom, PageSpeed, BuiltWith, Wappalyzer, SimilarWeb and SEMrush, in
/// that order.
pub fn metric_chain(config: &Config, client: &Client) -> Vec<Box<dyn Strategy<str, WebsiteMetrics>>> {
    let keys = &config.api_keys;
    let urls = &config.base_urls;
    vec![
        Box::new(seozoom::SeoZoom::new(
            client.clone(),
            keys.seozoom.clone(),
            urls.seozoom.clone(),
        )),
        Box::new(pagespeed::PageSpeed::new(
            client.clone(),
            keys.pagespeed.clone(),
            urls.pagespeed.clone(),
        )),
        Box::new(builtwith::BuiltWith::new(
            client.clone(),
            keys.builtwith.clone(),
            urls.builtwith.clone(),
        )),
        Box::new(wappalyzer::Wappalyzer::new(
            client.clone(),
            keys.wappalyzer.clone(),
            urls.wappalyzer.clone(),
        )),
        Box::new(similarweb::SimilarWeb::new(
            client.clone(),
            keys.similarweb.clone(),
            urls.similarweb.clone(),
        )),
        Box::new(semrush::SemRush::new(
            client.clone(),
            keys.semrush.clone(),
            urls.semrush.clone(),
        )),
    ]
}

/// Send a request and decode a JSON body, turning non-2xx statuses into errors.
pub(crate) async fn fetch_json(request: RequestBuilder) -> Result<Value, BoxError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(format!("HTTP {status}: {}", truncate_for_log(&body, 200)).into());
    }
    Ok(response.json::<Value>().await?)
}

/// Read a JSON number, or a string holding one, as `f64`.
pub(crate) fn json_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Read a JSON number, or a string holding one, as a non-negative integer.
pub(crate) fn json_u64(value: &Value) -> Option<u64> {
    json_f64(value).filter(|v| v.is_finite() && *v >= 0.0).map(|v| v.round() as u64)
}
