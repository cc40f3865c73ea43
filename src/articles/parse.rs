//! HTML heuristics for pulling article listings out of a news site page.
//!
//! The site has no structured feed, so listings are recognised by walking a
//! list of common CSS selectors, from semantic containers down to any link
//! with a path. Dates and bylines are picked up from nearby elements when
//! the theme exposes them.

use crate::models::{ArticleData, UNKNOWN_AUTHOR};
use crate::synthetic::{
    engagement_score, estimate_comments_count, estimate_read_count, estimate_social_shares,
    estimate_word_count,
};
use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::debug;
use url::Url;

/// Shortest title, in characters, that can belong to an article.
pub const MIN_TITLE_LEN: usize = 10;

/// Served instead of the real page when a bot check blocks the request.
pub const BLOCKED_MARKER: &str = "JavaScript is not available";

const SKIP_PATTERNS: [&str; 26] = [
    "/wp-admin",
    "/wp-content",
    "/wp-includes",
    "/category/",
    "/tag/",
    "/author/",
    "/page/",
    "/search",
    "/contact",
    "/about",
    "/login",
    "/register",
    ".jpg",
    ".jpeg",
    ".png",
    ".gif",
    ".pdf",
    ".doc",
    "mailto:",
    "tel:",
    "#",
    "javascript:",
    "facebook.com",
    "twitter.com",
    "instagram.com",
    "youtube.com",
];

const GENERIC_TITLES: [&str; 14] = [
    "home",
    "menu",
    "login",
    "register",
    "search",
    "contact",
    "about",
    "privacy",
    "terms",
    "cookie",
    "javascript",
    "javascript is not available",
    "loading",
    "error",
];

const CATEGORY_KEYWORDS: [(&str, &[&str]); 9] = [
    (
        "Sport",
        &["sport", "calcio", "triestina", "pallacanestro", "tennis", "nuoto", "ciclismo", "barcolana", "regata"],
    ),
    (
        "Politica",
        &["politica", "elezioni", "consiglio", "sindaco", "comune", "regione", "governo", "parlamento"],
    ),
    (
        "Cronaca",
        &["cronaca", "incidente", "arresto", "furto", "incendio", "emergenza", "allerta", "meteo"],
    ),
    (
        "Cultura",
        &["cultura", "teatro", "mostra", "arte", "musica", "libro", "cinema", "festival"],
    ),
    (
        "Economia",
        &["economia", "lavoro", "azienda", "investimento", "porto", "turismo", "commercio"],
    ),
    (
        "Salute",
        &["salute", "ospedale", "medico", "vaccino", "covid", "sanità", "farmacia"],
    ),
    (
        "Tecnologia",
        &["tecnologia", "digitale", "internet", "smartphone", "computer", "startup"],
    ),
    (
        "Ambiente",
        &["ambiente", "verde", "sostenibilità", "riciclo", "inquinamento", "energia"],
    ),
    (
        "Trasporti",
        &["trasporti", "bus", "treno", "ferrovia", "strada", "traffico", "mobilità"],
    ),
];

const DEFAULT_CATEGORY: &str = "Generale";

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"];

const NON_AUTHORS: [&str; 3] = ["staff", "redazione", "editor"];

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

/// Listing selectors, most specific first.
static LISTING_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        "article",
        ".article",
        ".post",
        ".news-item",
        ".entry",
        "h1 a",
        "h2 a",
        "h3 a",
        ".title a",
        ".headline a",
        "a[href*=\"/\"]",
    ]
    .into_iter()
    .map(selector)
    .collect()
});

static DATE_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        ".date",
        ".publish-date",
        ".article-date",
        ".post-date",
        ".entry-date",
        ".time",
        ".timestamp",
    ]
    .into_iter()
    .map(selector)
    .collect()
});

static DATETIME_ATTR: Lazy<Selector> = Lazy::new(|| selector("[datetime]"));

static AUTHOR_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        ".author",
        ".byline",
        ".writer",
        ".reporter",
        ".journalist",
        ".post-author",
        ".article-author",
        ".entry-author",
        "[rel=\"author\"]",
        ".author-name",
        ".by-author",
    ]
    .into_iter()
    .map(selector)
    .collect()
});

static LINK: Lazy<Selector> = Lazy::new(|| selector("a[href]"));

static HEADING: Lazy<Selector> = Lazy::new(|| selector("h1, h2, h3, .title, .headline"));

static BYLINE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(di|by|da)\b[\s:]*").expect("static regex"));

/// Whether `href` and `title` look like a link to an article.
pub fn is_valid_article(href: &str, title: &str) -> bool {
    let href_lower = href.to_lowercase();
    if SKIP_PATTERNS.iter().any(|p| href_lower.contains(p)) {
        return false;
    }

    let title = title.trim();
    if !title_ok(title) || GENERIC_TITLES.contains(&title.to_lowercase().as_str()) {
        return false;
    }
    href.len() > 5 && href.contains('/')
}

/// Whether `title` is long enough to be a headline: more than
/// [`MIN_TITLE_LEN`] characters once trimmed.
pub(crate) fn title_ok(title: &str) -> bool {
    title.trim().chars().count() > MIN_TITLE_LEN
}

/// First category whose keyword appears in the title or URL, else `"Generale"`.
pub fn guess_category(title: &str, url: &str) -> &'static str {
    let title = title.to_lowercase();
    let url = url.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| title.contains(k) || url.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(DEFAULT_CATEGORY)
}

/// Resolve `href` against the site root.
pub fn make_full_url(base_url: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    let root = format!("{}/", base_url.trim_end_matches('/'));
    match Url::parse(&root).and_then(|base| base.join(href)) {
        Ok(url) => url.to_string(),
        Err(_) => format!("{}{}", root, href.trim_start_matches('/')),
    }
}

fn collapse_text(element: ElementRef<'_>) -> String {
    element.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ")
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    let head: String = text.chars().take(10).collect();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&head, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
}

fn parent_element(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.parent().and_then(ElementRef::wrap)
}

fn date_near(element: ElementRef<'_>) -> Option<NaiveDate> {
    let classed = DATE_SELECTORS
        .iter()
        .flat_map(|sel| element.select(sel))
        .find_map(|el| parse_date_text(&collapse_text(el)));
    classed
        .or_else(|| element.value().attr("datetime").and_then(parse_date_text))
        .or_else(|| {
            element
                .select(&DATETIME_ATTR)
                .find_map(|el| el.value().attr("datetime").and_then(parse_date_text))
        })
}

/// Publication date (`YYYY-MM-DD`) found in or around `element`, else `today`.
pub fn extract_publish_date(element: ElementRef<'_>, today: NaiveDate) -> String {
    date_near(element)
        .or_else(|| parent_element(element).and_then(date_near))
        .unwrap_or(today)
        .format("%Y-%m-%d")
        .to_string()
}

fn clean_byline(text: &str) -> Option<String> {
    if text.is_empty() || text.chars().count() >= 50 {
        return None;
    }
    let name = BYLINE_PREFIX.replace(text, "").trim().to_string();
    if name.is_empty() || NON_AUTHORS.contains(&name.to_lowercase().as_str()) {
        None
    } else {
        Some(name)
    }
}

fn author_near(element: ElementRef<'_>) -> Option<String> {
    AUTHOR_SELECTORS
        .iter()
        .flat_map(|sel| element.select(sel))
        .find_map(|el| clean_byline(&collapse_text(el)))
}

/// Byline found in or around `element`, else `"Unknown Author"`.
pub fn extract_author(element: ElementRef<'_>) -> String {
    author_near(element)
        .or_else(|| {
            element
                .value()
                .attr("data-author")
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string)
        })
        .or_else(|| parent_element(element).and_then(author_near))
        .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string())
}

/// Link and title of a listing element. Containers use their first link and
/// prefer a heading's text over the whole block.
fn link_and_title(element: ElementRef<'_>) -> Option<(String, String)> {
    if element.value().name() == "a" {
        let href = element.value().attr("href")?;
        return Some((href.to_string(), collapse_text(element)));
    }
    let link = element.select(&LINK).next()?;
    let href = link.value().attr("href")?.to_string();
    let title = element
        .select(&HEADING)
        .map(collapse_text)
        .find(|t| !t.is_empty())
        .unwrap_or_else(|| collapse_text(element));
    Some((href, title))
}

fn build_article(title: String, url: String, element: ElementRef<'_>, today: NaiveDate) -> ArticleData {
    let category = guess_category(&title, &url);
    let word_count = estimate_word_count(&title);
    ArticleData {
        publish_date: extract_publish_date(element, today),
        author: extract_author(element),
        category: category.to_string(),
        read_count: estimate_read_count(&title, category),
        engagement_score: engagement_score(&title, word_count),
        social_shares: estimate_social_shares(&title, category),
        comments_count: estimate_comments_count(&title, category),
        word_count,
        title,
        url,
    }
}

/// Extract up to `limit` articles from a listing page, most read first.
///
/// Pages served by a bot check yield nothing.
pub fn parse_articles(html: &str, base_url: &str, limit: usize, today: NaiveDate) -> Vec<ArticleData> {
    if html.contains(BLOCKED_MARKER) {
        debug!("Page is a bot-check interstitial");
        return Vec::new();
    }
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut articles = Vec::new();

    'selectors: for sel in LISTING_SELECTORS.iter() {
        for element in document.select(sel) {
            if articles.len() >= limit {
                break 'selectors;
            }
            let Some((href, title)) = link_and_title(element) else {
                continue;
            };
            if !is_valid_article(&href, &title) {
                continue;
            }
            let url = make_full_url(base_url, &href);
            if seen.insert(url.clone()) {
                articles.push(build_article(title, url, element, today));
            }
        }
    }

    debug!(count = articles.len(), "Parsed article listing");
    articles.sort_by(|a, b| b.read_count.cmp(&a.read_count));
    articles.truncate(limit);
    articles
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.triesteallnews.it";

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 6).unwrap()
    }

    fn first<'a>(doc: &'a Html, css: &str) -> ElementRef<'a> {
        doc.select(&Selector::parse(css).unwrap()).next().unwrap()
    }

    #[test]
    fn test_is_valid_article_rejects_short_titles() {
        assert!(!is_valid_article("/cronaca/incidente", "Breve"));
        assert!(!is_valid_article("/cronaca/incidente", "  123456789  "));
        assert!(!is_valid_article("/cronaca/incidente", "1234567890"));
        assert!(is_valid_article("/cronaca/incidente", "12345678901"));
        assert!(!title_ok(" 1234567890 "));
        assert!(is_valid_article("/cronaca/incidente", "Incidente in via Carducci"));
    }

    #[test]
    fn test_is_valid_article_rejects_skip_patterns() {
        let title = "Una notizia abbastanza lunga";
        assert!(!is_valid_article("/category/sport", title));
        assert!(!is_valid_article("/wp-content/uploads/x.jpg", title));
        assert!(!is_valid_article("mailto:redazione@example.it", title));
        assert!(!is_valid_article("https://www.facebook.com/share", title));
        assert!(!is_valid_article("/cronaca#commenti", title));
        assert!(!is_valid_article("abc", title));
        assert!(!is_valid_article("/privacy", "Privacy"));
    }

    #[test]
    fn test_is_valid_article_rejects_generic_titles() {
        assert!(!is_valid_article("/some/page", "JavaScript is not available"));
    }

    #[test]
    fn test_guess_category() {
        assert_eq!(guess_category("Barcolana da record", "/x"), "Sport");
        assert_eq!(guess_category("Nuova mostra al museo", "/x"), "Cultura");
        assert_eq!(guess_category("Un titolo qualsiasi", "/economia/abc"), "Economia");
        assert_eq!(guess_category("Un titolo qualsiasi", "/x"), "Generale");
    }

    #[test]
    fn test_make_full_url() {
        assert_eq!(
            make_full_url(BASE, "/cronaca/articolo-1"),
            "https://www.triesteallnews.it/cronaca/articolo-1"
        );
        assert_eq!(
            make_full_url("https://www.triesteallnews.it/", "sport/derby"),
            "https://www.triesteallnews.it/sport/derby"
        );
        assert_eq!(make_full_url(BASE, "https://other.it/a"), "https://other.it/a");
    }

    #[test]
    fn test_extract_publish_date_formats() {
        let html = Html::parse_fragment(
            r#"<div><article><a href="/a/b">T</a><span class="date">03/05/2025 10:12</span></article></div>"#,
        );
        assert_eq!(extract_publish_date(first(&html, "article"), today()), "2025-05-03");

        let html = Html::parse_fragment(
            r#"<div><span class="post-date">2025/05/01</span><a href="/a/b">T</a></div>"#,
        );
        assert_eq!(extract_publish_date(first(&html, "a"), today()), "2025-05-01");

        let html = Html::parse_fragment(r#"<article><time datetime="2025-04-30T08:00:00Z">ieri</time></article>"#);
        assert_eq!(extract_publish_date(first(&html, "article"), today()), "2025-04-30");

        let html = Html::parse_fragment(r#"<article><span class="date">ieri</span></article>"#);
        assert_eq!(extract_publish_date(first(&html, "article"), today()), "2025-05-06");
    }

    #[test]
    fn test_extract_author() {
        let html = Html::parse_fragment(r#"<article><span class="byline">Di Marco Rossi</span></article>"#);
        assert_eq!(extract_author(first(&html, "article")), "Marco Rossi");

        let html = Html::parse_fragment(r#"<article><span class="author">Redazione</span></article>"#);
        assert_eq!(extract_author(first(&html, "article")), UNKNOWN_AUTHOR);

        let html = Html::parse_fragment(r#"<article data-author=" Anna Bianchi "></article>"#);
        assert_eq!(extract_author(first(&html, "article")), "Anna Bianchi");

        let long = "x".repeat(60);
        let html = Html::parse_fragment(&format!(r#"<article><span class="author">{long}</span></article>"#));
        assert_eq!(extract_author(first(&html, "article")), UNKNOWN_AUTHOR);
    }

    #[test]
    fn test_extract_author_keeps_names_starting_with_prefix_letters() {
        let html = Html::parse_fragment(r#"<article><span class="author">Davide Bylan</span></article>"#);
        assert_eq!(extract_author(first(&html, "article")), "Davide Bylan");
    }

    #[test]
    fn test_parse_articles_listing() {
        let html = r#"
            <html><body>
              <nav><a href="/">Home</a><a href="/category/sport/">Sport e altro</a></nav>
              <div class="card"><article>
                <h2><a href="/cronaca/incidente-carducci">Incidente stradale in via Carducci a Trieste</a></h2>
                <span class="date">2025-05-06</span>
                <span class="author">Di Marco Rossi</span>
              </article></div>
              <div class="card"><article>
                <h2><a href="/sport/triestina-vittoria">Triestina, vittoria importante in trasferta</a></h2>
                <span class="date">2025-05-04</span>
              </article></div>
              <div class="sidebar">
                <a href="/cronaca/incidente-carducci">Incidente stradale in via Carducci a Trieste</a>
              </div>
            </body></html>
        "#;
        let articles = parse_articles(html, BASE, 10, today());
        assert_eq!(articles.len(), 2);
        assert!(articles.windows(2).all(|w| w[0].read_count >= w[1].read_count));

        let crash = articles.iter().find(|a| a.url.ends_with("incidente-carducci")).unwrap();
        assert_eq!(crash.title, "Incidente stradale in via Carducci a Trieste");
        assert_eq!(crash.url, "https://www.triesteallnews.it/cronaca/incidente-carducci");
        assert_eq!(crash.category, "Cronaca");
        assert_eq!(crash.author, "Marco Rossi");
        assert_eq!(crash.publish_date, "2025-05-06");

        let sport = articles.iter().find(|a| a.category == "Sport").unwrap();
        assert_eq!(sport.publish_date, "2025-05-04");
        assert_eq!(sport.author, UNKNOWN_AUTHOR);
    }

    #[test]
    fn test_parse_articles_respects_limit() {
        let items: String = (0..8)
            .map(|i| format!(r#"<article><a href="/cronaca/notizia-{i}">Notizia di cronaca numero {i}</a></article>"#))
            .collect();
        let articles = parse_articles(&format!("<html><body>{items}</body></html>"), BASE, 3, today());
        assert_eq!(articles.len(), 3);
    }

    #[test]
    fn test_parse_articles_rejects_bot_check() {
        let html = r#"<html><body><p>JavaScript is not available.</p><a href="/a/b">Una notizia importante</a></body></html>"#;
        assert!(parse_articles(html, BASE, 10, today()).is_empty());
    }
}
