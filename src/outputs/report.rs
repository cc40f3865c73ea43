//! Plain-text comparison report.

use crate::models::{ArticleAnalytics, ArticleData, Comparison, Period, WebsiteMetrics};
use crate::utils::thousands;
use chrono::NaiveDateTime;
use std::fmt::Write;

const TITLE: &str = "MEDIAIMMAGINE WEB RANKING COMPARISON REPORT";

fn rank(label: &str, value: Option<u64>) -> String {
    match value.filter(|v| *v > 0) {
        Some(v) => format!("   {label}: {}", thousands(v)),
        None => format!("   {label}: N/A"),
    }
}

fn decimal(label: &str, value: Option<f64>, suffix: &str) -> String {
    match value.filter(|v| *v != 0.0) {
        Some(v) => format!("   {label}: {v:.1}{suffix}"),
        None => format!("   {label}: N/A"),
    }
}

fn push_metrics(out: &mut Vec<String>, metrics: &WebsiteMetrics) {
    out.push(format!("Source: {}", metrics.data_source));
    out.push(rank("Global Rank", metrics.global_rank));
    out.push(rank("Country Rank", metrics.country_rank));
    out.push(rank("Monthly Visits", metrics.monthly_visits));
    out.push(decimal("Bounce Rate", metrics.bounce_rate, "%"));
    out.push(decimal("Avg Visit Duration", metrics.avg_visit_duration, "s"));
    out.push(decimal("Pages per Visit", metrics.pages_per_visit, ""));

    for (heading, map) in [
        ("Traffic Sources", &metrics.traffic_sources),
        ("Top Countries", &metrics.top_countries),
    ] {
        if !map.is_empty() {
            out.push(format!("   {heading}:"));
            out.extend(map.iter().map(|(name, pct)| format!("     {name}: {pct:.1}%")));
        }
    }
    if !metrics.technologies.is_empty() {
        out.push(format!("   Technologies: {}", metrics.technologies.join(", ")));
    }
    out.push(String::new());
}

/// Render `comparison` as the human-readable text report.
pub fn format_report(comparison: &Comparison, generated_at: NaiveDateTime) -> String {
    let rule = "=".repeat(80);
    let mut lines = vec![
        rule.clone(),
        TITLE.to_string(),
        rule.clone(),
        format!("Generated: {}", generated_at.format("%Y-%m-%d %H:%M:%S")),
        rule,
        String::new(),
    ];

    for (domain, records) in comparison {
        lines.push(format!("Domain: {}", domain.to_uppercase()));
        lines.push("-".repeat(50));
        for metrics in records {
            push_metrics(&mut lines, metrics);
        }
        lines.push("=".repeat(50));
        lines.push(String::new());
    }

    let mut report = String::new();
    for line in lines {
        let _ = writeln!(report, "{line}");
    }
    report
}

/// Numbered most-read listing, one block per article.
pub fn format_articles(articles: &[ArticleData], period: Period, source: &str) -> String {
    let mut report = String::new();
    let _ = writeln!(report, "Most-read articles ({period}), source: {source}");
    let _ = writeln!(report, "{}", "-".repeat(50));
    for (i, article) in articles.iter().enumerate() {
        let _ = writeln!(report, "{:>2}. {}", i + 1, article.title);
        let _ = writeln!(
            report,
            "    {} | {} | {} | {} reads",
            article.publish_date,
            article.category,
            article.author,
            thousands(article.read_count)
        );
        let _ = writeln!(report, "    {}", article.url);
    }
    report
}

pub fn format_analytics(analytics: &ArticleAnalytics) -> String {
    let mut report = String::new();
    let _ = writeln!(report, "Article analytics for {} ({})", analytics.date, analytics.period);
    let _ = writeln!(report, "{}", "-".repeat(50));
    let _ = writeln!(report, "Total articles: {}", analytics.total_articles);
    let _ = writeln!(report, "Total reads: {}", thousands(analytics.total_reads));

    let e = &analytics.engagement_metrics;
    let _ = writeln!(report, "Average engagement score: {:.1}", e.average_engagement_score);
    let _ = writeln!(report, "Average reads per article: {:.0}", e.average_reads_per_article);
    let _ = writeln!(report, "Engagement rate: {:.2}%", e.engagement_rate * 100.0);

    for (heading, map) in [
        ("Reads by category", &analytics.category_breakdown),
        ("Reads by author", &analytics.author_performance),
    ] {
        let _ = writeln!(report, "{heading}:");
        for (name, reads) in map {
            let _ = writeln!(report, "   {name}: {}", thousands(*reads));
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, 6)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_report_layout() {
        let mut m = WebsiteMetrics::new("triesteallnews.it", "SEOZoom (Mock)");
        m.global_rank = Some(45_230);
        m.monthly_visits = Some(1_250_000);
        m.bounce_rate = Some(45.0);
        m.avg_visit_duration = Some(95.25);
        m.traffic_sources.insert("Search".to_string(), 41.0);
        let comparison = vec![("triesteallnews.it".to_string(), vec![m])];

        let report = format_report(&comparison, at());
        assert!(report.starts_with(&"=".repeat(80)));
        assert!(report.contains("Generated: 2025-05-06 09:30:00"));
        assert!(report.contains("Domain: TRIESTEALLNEWS.IT"));
        assert!(report.contains("Source: SEOZoom (Mock)"));
        assert!(report.contains("   Global Rank: 45,230"));
        assert!(report.contains("   Country Rank: N/A"));
        assert!(report.contains("   Monthly Visits: 1,250,000"));
        assert!(report.contains("   Bounce Rate: 45.0%"));
        assert!(report.contains("   Avg Visit Duration: 95.2s") || report.contains("   Avg Visit Duration: 95.3s"));
        assert!(report.contains("   Pages per Visit: N/A"));
        assert!(report.contains("   Traffic Sources:\n     Search: 41.0%"));
        assert!(!report.contains("Top Countries"));
    }

    #[test]
    fn test_articles_listing() {
        let article = ArticleData {
            title: "Barcolana, oltre duemila barche in regata".to_string(),
            url: "https://www.triesteallnews.it/sport/barcolana".to_string(),
            publish_date: "2025-05-06".to_string(),
            category: "Sport".to_string(),
            author: "Redazione".to_string(),
            read_count: 12_400,
            engagement_score: 7.5,
            social_shares: 40,
            comments_count: 12,
            word_count: 600,
        };
        let text = format_articles(&[article], Period::Daily, "Basic HTTP");
        assert!(text.starts_with("Most-read articles (daily), source: Basic HTTP"));
        assert!(text.contains(" 1. Barcolana, oltre duemila barche in regata"));
        assert!(text.contains("2025-05-06 | Sport | Redazione | 12,400 reads"));
    }

    #[test]
    fn test_report_lists_technologies() {
        let mut m = WebsiteMetrics::new("example.com", "BuiltWith");
        m.technologies = vec!["WordPress".to_string(), "Nginx".to_string()];
        let report = format_report(&vec![("example.com".to_string(), vec![m])], at());
        assert!(report.contains("   Technologies: WordPress, Nginx"));
    }
}
