//! Report rendering and file export.
//!
//! The export format follows the output path's extension:
//!
//! | Extension | Comparison | Articles | Analytics |
//! |-----------|------------|----------|-----------|
//! | `.csv` | [`csv::write_metrics_csv`] | [`csv::write_articles_csv`] | [`csv::write_analytics_csv`] |
//! | `.json` | [`json::write_comparison_json`] | [`json::write_articles_json`] | pretty JSON |
//! | other | text report | text listing | text summary |
//!
//! Without an output path the text rendering goes to stdout.

pub mod csv;
pub mod json;
pub mod report;

use crate::models::{ArticleAnalytics, ArticleData, Comparison, Period};
use crate::resolver::BoxError;
use crate::utils::ensure_parent_dir;
use chrono::Local;
use std::path::Path;
use tokio::fs;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Csv,
    Json,
    Text,
}

impl Format {
    fn of(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("csv") => Format::Csv,
            Some("json") => Format::Json,
            _ => Format::Text,
        }
    }
}

/// Write `text` to `path`, creating missing parent directories.
pub(crate) async fn write_text(path: &Path, text: String) -> Result<(), BoxError> {
    if let Err(e) = ensure_parent_dir(path).await {
        error!(path = %path.display(), error = %e, "Failed to create output dir");
        return Err(e);
    }
    let bytes = text.len();
    fs::write(path, text).await?;
    info!(path = %path.display(), bytes, "Wrote output file");
    Ok(())
}

/// Export `comparison` to `output`, or print the text report when `None`.
pub async fn generate_report(comparison: &Comparison, output: Option<&Path>) -> Result<(), BoxError> {
    let now = Local::now().naive_local();
    match output {
        None => {
            print!("{}", report::format_report(comparison, now));
            Ok(())
        }
        Some(path) => match Format::of(path) {
            Format::Csv => csv::write_metrics_csv(comparison, path).await,
            Format::Json => json::write_comparison_json(comparison, now, path).await,
            Format::Text => write_text(path, report::format_report(comparison, now)).await,
        },
    }
}

pub async fn export_articles(
    articles: &[ArticleData],
    period: Period,
    source: &str,
    output: Option<&Path>,
) -> Result<(), BoxError> {
    match output {
        None => {
            print!("{}", report::format_articles(articles, period, source));
            Ok(())
        }
        Some(path) => match Format::of(path) {
            Format::Csv => csv::write_articles_csv(articles, path).await,
            Format::Json => json::write_articles_json(articles, path).await,
            Format::Text => write_text(path, report::format_articles(articles, period, source)).await,
        },
    }
}

pub async fn export_analytics(analytics: &ArticleAnalytics, output: Option<&Path>) -> Result<(), BoxError> {
    match output {
        None => {
            print!("{}", report::format_analytics(analytics));
            Ok(())
        }
        Some(path) => match Format::of(path) {
            Format::Csv => csv::write_analytics_csv(analytics, path).await,
            Format::Json => write_text(path, serde_json::to_string_pretty(analytics)?).await,
            Format::Text => write_text(path, report::format_analytics(analytics)).await,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::synthesize_metrics;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(Format::of(Path::new("out/report.CSV")), Format::Csv);
        assert_eq!(Format::of(Path::new("report.json")), Format::Json);
        assert_eq!(Format::of(Path::new("report.txt")), Format::Text);
        assert_eq!(Format::of(Path::new("report")), Format::Text);
    }

    #[tokio::test]
    async fn test_write_text_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("out.txt");
        write_text(&path, "ciao".to_string()).await.unwrap();
        assert_eq!(fs::read_to_string(&path).await.unwrap(), "ciao");

        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").await.unwrap();
        assert!(write_text(&blocker.join("out.txt"), String::new()).await.is_err());
    }

    #[tokio::test]
    async fn test_generate_report_dispatches_on_extension() {
        let dir = tempfile::tempdir().unwrap();
        let comparison = vec![("example.com".to_string(), vec![synthesize_metrics("example.com")])];

        let csv_path = dir.path().join("r.csv");
        generate_report(&comparison, Some(&csv_path)).await.unwrap();
        let text = fs::read_to_string(&csv_path).await.unwrap();
        assert!(text.starts_with("Domain,Data Source"));

        let json_path = dir.path().join("r.json");
        generate_report(&comparison, Some(&json_path)).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&json_path).await.unwrap()).unwrap();
        assert!(value["domains"]["example.com"].is_array());

        let txt_path = dir.path().join("nested").join("r.txt");
        generate_report(&comparison, Some(&txt_path)).await.unwrap();
        let text = fs::read_to_string(&txt_path).await.unwrap();
        assert!(text.contains("Domain: EXAMPLE.COM"));
    }
}
