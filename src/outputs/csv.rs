//! CSV export and import for comparisons, article lists, and analytics.
//!
//! Metric rows keep the report's human formatting (`45.0%`, `60.0s`, `N/A`)
//! so the files read well in a spreadsheet; [`read_metrics_csv`] undoes it.
//! Reading a written file gives back the same values up to that one-decimal
//! rounding.

use super::write_text;
use crate::models::{ArticleAnalytics, ArticleData, Comparison, WebsiteMetrics};
use crate::resolver::BoxError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Serialize, Deserialize)]
struct MetricsRow {
    #[serde(rename = "Domain")]
    domain: String,
    #[serde(rename = "Data Source")]
    data_source: String,
    #[serde(rename = "Global Rank")]
    global_rank: String,
    #[serde(rename = "Country Rank")]
    country_rank: String,
    #[serde(rename = "Monthly Visits")]
    monthly_visits: String,
    #[serde(rename = "Bounce Rate")]
    bounce_rate: String,
    #[serde(rename = "Avg Visit Duration")]
    avg_visit_duration: String,
    #[serde(rename = "Pages per Visit")]
    pages_per_visit: String,
    #[serde(rename = "Traffic Sources")]
    traffic_sources: String,
    #[serde(rename = "Top Countries")]
    top_countries: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ArticleRow {
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "URL")]
    url: String,
    #[serde(rename = "Publish Date")]
    publish_date: String,
    #[serde(rename = "Category")]
    category: String,
    #[serde(rename = "Read Count")]
    read_count: u64,
    #[serde(rename = "Engagement Score")]
    engagement_score: f64,
    #[serde(rename = "Social Shares")]
    social_shares: u64,
    #[serde(rename = "Comments Count")]
    comments_count: u64,
    #[serde(rename = "Word Count")]
    word_count: u64,
    #[serde(rename = "Author")]
    author: String,
}

impl From<&ArticleData> for ArticleRow {
    fn from(a: &ArticleData) -> Self {
        Self {
            title: a.title.clone(),
            url: a.url.clone(),
            publish_date: a.publish_date.clone(),
            category: a.category.clone(),
            read_count: a.read_count,
            engagement_score: a.engagement_score,
            social_shares: a.social_shares,
            comments_count: a.comments_count,
            word_count: a.word_count,
            author: a.author.clone(),
        }
    }
}

impl From<ArticleRow> for ArticleData {
    fn from(r: ArticleRow) -> Self {
        Self {
            title: r.title,
            url: r.url,
            publish_date: r.publish_date,
            category: r.category,
            author: r.author,
            read_count: r.read_count,
            engagement_score: r.engagement_score,
            social_shares: r.social_shares,
            comments_count: r.comments_count,
            word_count: r.word_count,
        }
    }
}

fn int_cell(value: Option<u64>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |v| v.to_string())
}

fn float_cell(value: Option<f64>, suffix: &str) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |v| format!("{v:.1}{suffix}"))
}

fn map_cell(map: &BTreeMap<String, f64>) -> Result<String, BoxError> {
    if map.is_empty() {
        Ok(NOT_AVAILABLE.to_string())
    } else {
        Ok(serde_json::to_string(map)?)
    }
}

fn parse_int(cell: &str) -> Result<Option<u64>, BoxError> {
    match cell.trim() {
        "" | NOT_AVAILABLE => Ok(None),
        s => Ok(Some(s.parse()?)),
    }
}

fn parse_float(cell: &str, suffix: char) -> Result<Option<f64>, BoxError> {
    match cell.trim() {
        "" | NOT_AVAILABLE => Ok(None),
        s => Ok(Some(s.trim_end_matches(suffix).parse()?)),
    }
}

fn parse_map(cell: &str) -> Result<BTreeMap<String, f64>, BoxError> {
    match cell.trim() {
        "" | NOT_AVAILABLE => Ok(BTreeMap::new()),
        s => Ok(serde_json::from_str(s)?),
    }
}

impl MetricsRow {
    fn from_metrics(domain: &str, m: &WebsiteMetrics) -> Result<Self, BoxError> {
        Ok(Self {
            domain: domain.to_string(),
            data_source: m.data_source.clone(),
            global_rank: int_cell(m.global_rank),
            country_rank: int_cell(m.country_rank),
            monthly_visits: int_cell(m.monthly_visits),
            bounce_rate: float_cell(m.bounce_rate, "%"),
            avg_visit_duration: float_cell(m.avg_visit_duration, "s"),
            pages_per_visit: float_cell(m.pages_per_visit, ""),
            traffic_sources: map_cell(&m.traffic_sources)?,
            top_countries: map_cell(&m.top_countries)?,
        })
    }

    fn into_metrics(self) -> Result<WebsiteMetrics, BoxError> {
        Ok(WebsiteMetrics {
            global_rank: parse_int(&self.global_rank)?,
            country_rank: parse_int(&self.country_rank)?,
            monthly_visits: parse_int(&self.monthly_visits)?,
            bounce_rate: parse_float(&self.bounce_rate, '%')?,
            avg_visit_duration: parse_float(&self.avg_visit_duration, 's')?,
            pages_per_visit: parse_float(&self.pages_per_visit, ' ')?,
            traffic_sources: parse_map(&self.traffic_sources)?,
            top_countries: parse_map(&self.top_countries)?,
            technologies: Vec::new(),
            domain: self.domain,
            data_source: self.data_source,
        })
    }
}

/// Render a comparison as CSV text, one row per record.
pub fn metrics_to_csv(comparison: &Comparison) -> Result<String, BoxError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for (domain, records) in comparison {
        for metrics in records {
            writer.serialize(MetricsRow::from_metrics(domain, metrics)?)?;
        }
    }
    Ok(String::from_utf8(writer.into_inner().map_err(|e| e.into_error())?)?)
}

/// Parse CSV text written by [`metrics_to_csv`], regrouping rows by domain in
/// first-seen order.
pub fn metrics_from_csv(text: &str) -> Result<Comparison, BoxError> {
    let mut reader = csv::Reader::from_reader(text.as_bytes());
    let mut comparison = Comparison::new();
    for row in reader.deserialize::<MetricsRow>() {
        let metrics = row?.into_metrics()?;
        match comparison.iter_mut().find(|(d, _)| *d == metrics.domain) {
            Some((_, records)) => records.push(metrics),
            None => comparison.push((metrics.domain.clone(), vec![metrics])),
        }
    }
    Ok(comparison)
}

#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_metrics_csv(comparison: &Comparison, path: &Path) -> Result<(), BoxError> {
    let text = metrics_to_csv(comparison)?;
    write_text(path, text).await?;
    info!(domains = comparison.len(), "Wrote comparison CSV");
    Ok(())
}

pub async fn read_metrics_csv(path: &Path) -> Result<Comparison, BoxError> {
    metrics_from_csv(&fs::read_to_string(path).await?)
}

pub fn articles_to_csv(articles: &[ArticleData]) -> Result<String, BoxError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for article in articles {
        writer.serialize(ArticleRow::from(article))?;
    }
    Ok(String::from_utf8(writer.into_inner().map_err(|e| e.into_error())?)?)
}

pub fn articles_from_csv(text: &str) -> Result<Vec<ArticleData>, BoxError> {
    let mut reader = csv::Reader::from_reader(text.as_bytes());
    let mut articles = Vec::new();
    for row in reader.deserialize::<ArticleRow>() {
        articles.push(ArticleData::from(row?));
    }
    Ok(articles)
}

#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_articles_csv(articles: &[ArticleData], path: &Path) -> Result<(), BoxError> {
    let text = articles_to_csv(articles)?;
    write_text(path, text).await?;
    info!(count = articles.len(), "Wrote articles CSV");
    Ok(())
}

pub async fn read_articles_csv(path: &Path) -> Result<Vec<ArticleData>, BoxError> {
    articles_from_csv(&fs::read_to_string(path).await?)
}

/// Summary row, then one row per category and one per author.
pub fn analytics_to_csv(analytics: &ArticleAnalytics) -> Result<String, BoxError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "Date",
        "Total Articles",
        "Total Reads",
        "Category",
        "Category Reads",
        "Author",
        "Author Reads",
    ])?;
    let total_reads = analytics.total_reads.to_string();
    writer.write_record([
        analytics.date.as_str(),
        &analytics.total_articles.to_string(),
        &total_reads,
        "All",
        &total_reads,
        "All",
        &total_reads,
    ])?;
    for (category, reads) in &analytics.category_breakdown {
        writer.write_record([analytics.date.as_str(), "", "", category, &reads.to_string(), "", ""])?;
    }
    for (author, reads) in &analytics.author_performance {
        writer.write_record([analytics.date.as_str(), "", "", "", "", author, &reads.to_string()])?;
    }
    Ok(String::from_utf8(writer.into_inner().map_err(|e| e.into_error())?)?)
}

#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_analytics_csv(analytics: &ArticleAnalytics, path: &Path) -> Result<(), BoxError> {
    let text = analytics_to_csv(analytics)?;
    write_text(path, text).await?;
    info!(articles = analytics.total_articles, "Wrote analytics CSV");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::articles::analyze;
    use crate::models::Period;
    use crate::synthetic::{synthesize_articles, synthesize_metrics};
    use chrono::NaiveDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 6).unwrap()
    }

    fn assert_close(a: Option<f64>, b: Option<f64>) {
        match (a, b) {
            (Some(x), Some(y)) => assert!((x - y).abs() <= 0.05 + 1e-9, "{x} vs {y}"),
            (None, None) => {}
            other => panic!("mismatch: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_metrics_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exports").join("comparison.csv");

        let mut partial = WebsiteMetrics::new("example.com", "SEMrush");
        partial.global_rank = Some(15_230);
        let comparison = vec![
            ("triesteallnews.it".to_string(), vec![synthesize_metrics("triesteallnews.it")]),
            ("example.com".to_string(), vec![synthesize_metrics("example.com"), partial]),
        ];

        write_metrics_csv(&comparison, &path).await.unwrap();
        let back = read_metrics_csv(&path).await.unwrap();

        assert_eq!(back.len(), 2);
        assert_eq!(back[1].0, "example.com");
        assert_eq!(back[1].1.len(), 2);
        for ((d1, r1), (d2, r2)) in comparison.iter().zip(&back) {
            assert_eq!(d1, d2);
            for (a, b) in r1.iter().zip(r2) {
                assert_eq!(a.data_source, b.data_source);
                assert_eq!(a.global_rank, b.global_rank);
                assert_eq!(a.country_rank, b.country_rank);
                assert_eq!(a.monthly_visits, b.monthly_visits);
                assert_close(a.bounce_rate, b.bounce_rate);
                assert_close(a.avg_visit_duration, b.avg_visit_duration);
                assert_close(a.pages_per_visit, b.pages_per_visit);
                for (x, y) in [(&a.traffic_sources, &b.traffic_sources), (&a.top_countries, &b.top_countries)] {
                    assert!(x.keys().eq(y.keys()));
                    for (k, v) in x {
                        assert_close(Some(*v), y.get(k).copied());
                    }
                }
            }
        }
    }

    #[test]
    fn test_metrics_csv_formatting() {
        let mut m = WebsiteMetrics::new("example.com", "SimilarWeb");
        m.bounce_rate = Some(45.0);
        m.avg_visit_duration = Some(60.0);
        let text = metrics_to_csv(&vec![("example.com".to_string(), vec![m])]).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Domain,Data Source,Global Rank,Country Rank,Monthly Visits,Bounce Rate,Avg Visit Duration,Pages per Visit,Traffic Sources,Top Countries"
        );
        assert_eq!(lines.next().unwrap(), "example.com,SimilarWeb,N/A,N/A,N/A,45.0%,60.0s,N/A,N/A,N/A");
    }

    #[tokio::test]
    async fn test_articles_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.csv");
        let articles = synthesize_articles("https://www.triesteallnews.it", Period::Last7Days, 8, today());

        write_articles_csv(&articles, &path).await.unwrap();
        let back = read_articles_csv(&path).await.unwrap();
        assert_eq!(back, articles);
    }

    #[test]
    fn test_analytics_csv_rows() {
        let articles = synthesize_articles("https://www.triesteallnews.it", Period::Daily, 12, today());
        let analytics = analyze(&articles, Period::Daily, today());
        let text = analytics_to_csv(&analytics).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "Date,Total Articles,Total Reads,Category,Category Reads,Author,Author Reads"
        );
        assert!(lines[1].starts_with("2025-05-06,12,"));
        assert_eq!(
            lines.len(),
            2 + analytics.category_breakdown.len() + analytics.author_performance.len()
        );
    }
}
