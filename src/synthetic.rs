//! Synthetic traffic and article figures.
//!
//! Two families of functions live here:
//!
//! - **Deterministic** (`synthesize_*`, `estimate_*`, `mock_metrics`): pure
//!   functions of a SHA-256 based hash of the input string. The same domain or
//!   title always yields the same numbers, in every process. These are the
//!   only ones the resolver's fallback uses.
//! - **Varied** (`*_varied`): the deterministic value multiplied by a random
//!   factor, for demo runs that want "realistic variation". Never used as a
//!   resolver fallback.
//!
//! All values follow the shape `base + (h * k) % range`, where `h` is
//! [`stable_hash`] of the target and the constants come from per-provider
//! tables.

use crate::models::{ArticleData, MOCK_MARKER, Period, UNKNOWN_AUTHOR, WebsiteMetrics};
use chrono::{Duration, NaiveDate};
use itertools::Itertools;
use rand::{Rng, rng};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Hash space used by every estimate.
pub const HASH_SPACE: u64 = 1_000_000;

/// Stable hash of `s` in `0..HASH_SPACE`.
///
/// Uses the first eight bytes of the SHA-256 digest, so the value does not
/// change between runs (unlike `std::hash`).
pub fn stable_hash(s: &str) -> u64 {
    let digest = Sha256::digest(s.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes) % HASH_SPACE
}

/// Hash of `s` salted with `purpose`, so unrelated estimates of the same title
/// are not correlated.
fn keyed_hash(purpose: &str, s: &str) -> u64 {
    stable_hash(&format!("{purpose}:{s}"))
}

/// `h` mapped onto `[0, 1)`.
fn unit(h: u64) -> f64 {
    h as f64 / HASH_SPACE as f64
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Coarse classification of a domain by its top-level domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TldClass {
    /// `.com`, `.org`, `.net`
    Major,
    /// `.it`, `.de`, `.fr`, `.uk`
    Country,
    Other,
}

impl TldClass {
    pub fn of(domain: &str) -> Self {
        let lower = domain.to_lowercase();
        if [".com", ".org", ".net"].iter().any(|t| lower.contains(t)) {
            TldClass::Major
        } else if [".it", ".de", ".fr", ".uk"].iter().any(|t| lower.contains(t)) {
            TldClass::Country
        } else {
            TldClass::Other
        }
    }

    fn index(self) -> usize {
        match self {
            TldClass::Major => 0,
            TldClass::Country => 1,
            TldClass::Other => 2,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct IntSpan {
    base: u64,
    mult: u64,
    range: u64,
}

impl IntSpan {
    const fn new(base: u64, mult: u64, range: u64) -> Self {
        Self { base, mult, range }
    }

    fn at(&self, h: u64) -> u64 {
        self.base + (h * self.mult) % self.range
    }
}

#[derive(Debug, Clone, Copy)]
struct FloatSpan {
    base: f64,
    mult: f64,
    range: f64,
}

impl FloatSpan {
    const fn new(base: f64, mult: f64, range: f64) -> Self {
        Self { base, mult, range }
    }

    fn at(&self, h: u64) -> f64 {
        round1(self.base + (h as f64 * self.mult) % self.range)
    }
}

#[derive(Debug, Clone, Copy)]
enum CountryRank {
    Half,
    Offset { mult: u64, range: u64, shift: i64 },
    Independent(IntSpan),
}

struct Profile {
    label: &'static str,
    visits: [IntSpan; 3],
    rank: [IntSpan; 3],
    country_rank: CountryRank,
    bounce: FloatSpan,
    duration: FloatSpan,
    pages: FloatSpan,
    traffic: &'static [(&'static str, FloatSpan)],
    countries: &'static [(&'static str, FloatSpan)],
}

const fn same(span: IntSpan) -> [IntSpan; 3] {
    [span, span, span]
}

const SEOZOOM: Profile = Profile {
    label: "SEOZoom",
    visits: [
        IntSpan::new(100_000, 500, 900_000),
        IntSpan::new(20_000, 200, 180_000),
        IntSpan::new(2_000, 100, 18_000),
    ],
    rank: [
        IntSpan::new(1_000, 5, 9_000),
        IntSpan::new(5_000, 10, 45_000),
        IntSpan::new(10_000, 20, 90_000),
    ],
    country_rank: CountryRank::Half,
    bounce: FloatSpan::new(45.0, 3.0, 25.0),
    duration: FloatSpan::new(90.0, 2.0, 120.0),
    pages: FloatSpan::new(2.0, 0.1, 1.5),
    traffic: &[
        ("Direct", FloatSpan::new(40.0, 2.0, 20.0)),
        ("Search", FloatSpan::new(30.0, 2.0, 20.0)),
        ("Social", FloatSpan::new(15.0, 1.0, 10.0)),
        ("Referral", FloatSpan::new(10.0, 1.0, 10.0)),
        ("Email", FloatSpan::new(3.0, 1.0, 4.0)),
        ("Other", FloatSpan::new(2.0, 1.0, 3.0)),
    ],
    countries: &[
        ("Italy", FloatSpan::new(70.0, 2.0, 20.0)),
        ("United States", FloatSpan::new(10.0, 1.0, 10.0)),
        ("Germany", FloatSpan::new(8.0, 1.0, 7.0)),
        ("France", FloatSpan::new(5.0, 1.0, 5.0)),
        ("United Kingdom", FloatSpan::new(4.0, 1.0, 4.0)),
        ("Spain", FloatSpan::new(2.0, 1.0, 3.0)),
        ("Other", FloatSpan::new(1.0, 1.0, 4.0)),
    ],
};

const ANGLO_COUNTRIES: [&str; 5] = [
    "United States",
    "United Kingdom",
    "Canada",
    "Germany",
    "Australia",
];

const PAGESPEED: Profile = Profile {
    label: "PageSpeed",
    visits: same(IntSpan::new(10_000, 500, 90_000)),
    rank: same(IntSpan::new(5_000, 5, 45_000)),
    country_rank: CountryRank::Independent(IntSpan::new(5_000, 7, 40_000)),
    bounce: FloatSpan::new(40.0, 4.0, 40.0),
    duration: FloatSpan::new(60.0, 2.0, 120.0),
    pages: FloatSpan::new(1.5, 0.08, 2.0),
    traffic: &[
        ("Direct", FloatSpan::new(50.0, 2.0, 20.0)),
        ("Search", FloatSpan::new(20.0, 2.0, 15.0)),
        ("Social", FloatSpan::new(20.0, 1.0, 15.0)),
        ("Referral", FloatSpan::new(8.0, 1.0, 7.0)),
        ("Email", FloatSpan::new(2.0, 1.0, 3.0)),
    ],
    countries: &[
        (ANGLO_COUNTRIES[0], FloatSpan::new(40.0, 3.0, 35.0)),
        (ANGLO_COUNTRIES[1], FloatSpan::new(12.0, 2.0, 13.0)),
        (ANGLO_COUNTRIES[2], FloatSpan::new(10.0, 1.0, 8.0)),
        (ANGLO_COUNTRIES[3], FloatSpan::new(8.0, 1.0, 9.0)),
        (ANGLO_COUNTRIES[4], FloatSpan::new(7.0, 1.0, 7.0)),
    ],
};

const BUILTWITH: Profile = Profile {
    label: "BuiltWith",
    visits: [
        IntSpan::new(200_000, 1_000, 1_800_000),
        IntSpan::new(50_000, 500, 450_000),
        IntSpan::new(5_000, 100, 45_000),
    ],
    rank: [
        IntSpan::new(500, 3, 4_500),
        IntSpan::new(2_000, 5, 8_000),
        IntSpan::new(5_000, 10, 45_000),
    ],
    country_rank: CountryRank::Offset { mult: 2, range: 1_000, shift: 0 },
    bounce: FloatSpan::new(30.0, 2.0, 40.0),
    duration: FloatSpan::new(120.0, 3.0, 180.0),
    pages: FloatSpan::new(2.0, 0.1, 3.0),
    traffic: &[
        ("Direct", FloatSpan::new(40.0, 2.0, 30.0)),
        ("Search", FloatSpan::new(30.0, 2.0, 25.0)),
        ("Social", FloatSpan::new(10.0, 1.0, 15.0)),
        ("Referral", FloatSpan::new(15.0, 1.0, 10.0)),
        ("Email", FloatSpan::new(5.0, 1.0, 5.0)),
    ],
    countries: &[
        (ANGLO_COUNTRIES[0], FloatSpan::new(35.0, 2.0, 25.0)),
        (ANGLO_COUNTRIES[1], FloatSpan::new(8.0, 1.0, 12.0)),
        (ANGLO_COUNTRIES[2], FloatSpan::new(6.0, 1.0, 8.0)),
        (ANGLO_COUNTRIES[3], FloatSpan::new(5.0, 1.0, 7.0)),
        (ANGLO_COUNTRIES[4], FloatSpan::new(4.0, 1.0, 6.0)),
    ],
};

const WAPPALYZER: Profile = Profile {
    label: "Wappalyzer",
    visits: same(IntSpan::new(25_000, 800, 225_000)),
    rank: same(IntSpan::new(2_000, 4, 8_000)),
    country_rank: CountryRank::Independent(IntSpan::new(2_000, 6, 7_000)),
    bounce: FloatSpan::new(35.0, 3.0, 35.0),
    duration: FloatSpan::new(90.0, 2.0, 150.0),
    pages: FloatSpan::new(1.8, 0.12, 2.7),
    traffic: &[
        ("Direct", FloatSpan::new(45.0, 2.0, 25.0)),
        ("Search", FloatSpan::new(25.0, 2.0, 20.0)),
        ("Social", FloatSpan::new(15.0, 1.0, 10.0)),
        ("Referral", FloatSpan::new(10.0, 1.0, 10.0)),
        ("Email", FloatSpan::new(5.0, 1.0, 5.0)),
    ],
    countries: &[
        (ANGLO_COUNTRIES[0], FloatSpan::new(30.0, 3.0, 30.0)),
        (ANGLO_COUNTRIES[1], FloatSpan::new(10.0, 2.0, 15.0)),
        (ANGLO_COUNTRIES[2], FloatSpan::new(8.0, 1.0, 7.0)),
        (ANGLO_COUNTRIES[3], FloatSpan::new(7.0, 1.0, 8.0)),
        (ANGLO_COUNTRIES[4], FloatSpan::new(6.0, 1.0, 6.0)),
    ],
};

const SIMILARWEB: Profile = Profile {
    label: "SimilarWeb",
    visits: [
        IntSpan::new(5_000_000, 2_000, 45_000_000),
        IntSpan::new(100_000, 500, 900_000),
        IntSpan::new(10_000, 100, 90_000),
    ],
    rank: [
        IntSpan::new(100, 5, 9_900),
        IntSpan::new(1_000, 10, 9_000),
        IntSpan::new(5_000, 20, 45_000),
    ],
    country_rank: CountryRank::Offset { mult: 3, range: 200, shift: -100 },
    bounce: FloatSpan::new(20.0, 2.0, 60.0),
    duration: FloatSpan::new(60.0, 2.0, 240.0),
    pages: FloatSpan::new(1.5, 0.1, 6.5),
    traffic: &[
        ("Direct", FloatSpan::new(30.0, 3.0, 30.0)),
        ("Search", FloatSpan::new(20.0, 2.0, 20.0)),
        ("Social", FloatSpan::new(5.0, 1.0, 15.0)),
        ("Referral", FloatSpan::new(5.0, 2.0, 10.0)),
        ("Email", FloatSpan::new(1.0, 1.0, 4.0)),
    ],
    countries: &[
        (ANGLO_COUNTRIES[0], FloatSpan::new(20.0, 2.0, 30.0)),
        (ANGLO_COUNTRIES[1], FloatSpan::new(5.0, 1.0, 10.0)),
        (ANGLO_COUNTRIES[2], FloatSpan::new(3.0, 1.0, 7.0)),
        (ANGLO_COUNTRIES[3], FloatSpan::new(2.0, 1.0, 6.0)),
        (ANGLO_COUNTRIES[4], FloatSpan::new(2.0, 1.0, 4.0)),
    ],
};

const ALEXA: Profile = Profile {
    label: "Alexa",
    visits: same(IntSpan::new(800_000, 1_200, 89_200_000)),
    rank: same(IntSpan::new(1, 11, 11_999)),
    country_rank: CountryRank::Offset { mult: 5, range: 400, shift: -200 },
    bounce: FloatSpan::new(25.0, 3.0, 50.0),
    duration: FloatSpan::new(70.0, 3.0, 280.0),
    pages: FloatSpan::new(1.8, 0.12, 7.2),
    traffic: &[
        ("Direct", FloatSpan::new(25.0, 2.0, 30.0)),
        ("Search", FloatSpan::new(25.0, 3.0, 20.0)),
        ("Social", FloatSpan::new(8.0, 2.0, 17.0)),
        ("Referral", FloatSpan::new(5.0, 2.0, 13.0)),
        ("Email", FloatSpan::new(1.0, 1.0, 5.0)),
    ],
    countries: &[
        (ANGLO_COUNTRIES[0], FloatSpan::new(25.0, 3.0, 30.0)),
        (ANGLO_COUNTRIES[1], FloatSpan::new(6.0, 2.0, 12.0)),
        (ANGLO_COUNTRIES[2], FloatSpan::new(4.0, 1.0, 8.0)),
        (ANGLO_COUNTRIES[3], FloatSpan::new(3.0, 1.0, 7.0)),
        (ANGLO_COUNTRIES[4], FloatSpan::new(3.0, 1.0, 5.0)),
    ],
};

const SEMRUSH: Profile = Profile {
    label: "SEMrush",
    visits: same(IntSpan::new(900_000, 1_300, 94_100_000)),
    rank: same(IntSpan::new(1, 13, 14_999)),
    country_rank: CountryRank::Offset { mult: 4, range: 300, shift: -150 },
    bounce: FloatSpan::new(22.0, 3.0, 56.0),
    duration: FloatSpan::new(65.0, 3.0, 255.0),
    pages: FloatSpan::new(1.6, 0.11, 6.9),
    traffic: &[
        ("Direct", FloatSpan::new(28.0, 2.0, 30.0)),
        ("Search", FloatSpan::new(22.0, 2.0, 20.0)),
        ("Social", FloatSpan::new(6.0, 2.0, 16.0)),
        ("Referral", FloatSpan::new(6.0, 1.0, 10.0)),
        ("Email", FloatSpan::new(1.0, 1.0, 4.0)),
    ],
    countries: &[
        (ANGLO_COUNTRIES[0], FloatSpan::new(22.0, 3.0, 30.0)),
        (ANGLO_COUNTRIES[1], FloatSpan::new(5.0, 2.0, 11.0)),
        (ANGLO_COUNTRIES[2], FloatSpan::new(3.0, 1.0, 8.0)),
        (ANGLO_COUNTRIES[3], FloatSpan::new(2.0, 1.0, 7.0)),
        (ANGLO_COUNTRIES[4], FloatSpan::new(2.0, 1.0, 5.0)),
    ],
};

/// Traffic shape attached to real PageSpeed results, which carry no traffic data.
const TRAFFIC_ESTIMATE: Profile = Profile {
    label: "Traffic Estimate",
    visits: [
        IntSpan::new(50_000, 200, 450_000),
        IntSpan::new(10_000, 100, 90_000),
        IntSpan::new(1_000, 50, 9_000),
    ],
    rank: [
        IntSpan::new(1_000, 5, 9_000),
        IntSpan::new(5_000, 10, 45_000),
        IntSpan::new(10_000, 20, 90_000),
    ],
    country_rank: CountryRank::Half,
    bounce: FloatSpan::new(40.0, 3.0, 30.0),
    duration: FloatSpan::new(60.0, 2.0, 120.0),
    pages: FloatSpan::new(1.5, 0.1, 2.0),
    traffic: &[
        ("Direct", FloatSpan::new(35.0, 2.0, 25.0)),
        ("Search", FloatSpan::new(25.0, 2.0, 20.0)),
        ("Social", FloatSpan::new(15.0, 1.0, 15.0)),
        ("Referral", FloatSpan::new(15.0, 1.0, 15.0)),
        ("Email", FloatSpan::new(5.0, 1.0, 5.0)),
        ("Other", FloatSpan::new(5.0, 1.0, 5.0)),
    ],
    countries: &[
        ("Italy", FloatSpan::new(40.0, 3.0, 30.0)),
        ("United States", FloatSpan::new(15.0, 2.0, 15.0)),
        ("Germany", FloatSpan::new(10.0, 1.0, 10.0)),
        ("France", FloatSpan::new(8.0, 1.0, 8.0)),
        ("United Kingdom", FloatSpan::new(7.0, 1.0, 7.0)),
        ("Spain", FloatSpan::new(5.0, 1.0, 5.0)),
        ("Other", FloatSpan::new(15.0, 1.0, 15.0)),
    ],
};

const TECH_CATEGORIES: [&str; 6] = [
    "Analytics",
    "CDN",
    "CMS",
    "E-commerce",
    "JavaScript",
    "Web Server",
];

/// Providers that have a synthetic metrics profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    SeoZoom,
    PageSpeed,
    BuiltWith,
    Wappalyzer,
    SimilarWeb,
    Alexa,
    SemRush,
}

impl Provider {
    pub const ALL: [Provider; 7] = [
        Provider::SeoZoom,
        Provider::PageSpeed,
        Provider::BuiltWith,
        Provider::Wappalyzer,
        Provider::SimilarWeb,
        Provider::Alexa,
        Provider::SemRush,
    ];

    fn profile(self) -> &'static Profile {
        match self {
            Provider::SeoZoom => &SEOZOOM,
            Provider::PageSpeed => &PAGESPEED,
            Provider::BuiltWith => &BUILTWITH,
            Provider::Wappalyzer => &WAPPALYZER,
            Provider::SimilarWeb => &SIMILARWEB,
            Provider::Alexa => &ALEXA,
            Provider::SemRush => &SEMRUSH,
        }
    }
}

fn apply_profile(profile: &Profile, domain: &str, label: String) -> WebsiteMetrics {
    let h = stable_hash(domain);
    let class = TldClass::of(domain).index();
    let rank = profile.rank[class].at(h);

    let country_rank = match profile.country_rank {
        CountryRank::Half => rank / 2,
        CountryRank::Offset { mult, range, shift } => {
            (rank as i64 + ((h * mult) % range) as i64 + shift).max(1) as u64
        }
        CountryRank::Independent(span) => span.at(h),
    };

    let spread = |table: &[(&str, FloatSpan)]| -> BTreeMap<String, f64> {
        table
            .iter()
            .map(|(name, span)| (name.to_string(), span.at(h)))
            .collect()
    };

    WebsiteMetrics {
        domain: domain.to_string(),
        data_source: label,
        global_rank: Some(rank),
        country_rank: Some(country_rank),
        monthly_visits: Some(profile.visits[class].at(h)),
        bounce_rate: Some(profile.bounce.at(h)),
        avg_visit_duration: Some(profile.duration.at(h)),
        pages_per_visit: Some(profile.pages.at(h)),
        traffic_sources: spread(profile.traffic),
        top_countries: spread(profile.countries),
        technologies: Vec::new(),
    }
}

/// Deterministic mock record in the shape `provider` would return.
///
/// The label is `"{provider} (Mock)"` so the record is recognisable as synthetic.
pub fn mock_metrics(provider: Provider, domain: &str) -> WebsiteMetrics {
    let profile = provider.profile();
    let mut metrics = apply_profile(profile, domain, format!("{} {}", profile.label, MOCK_MARKER));
    if provider == Provider::BuiltWith {
        let h = stable_hash(domain);
        metrics.technologies = (0..3 + h % 3)
            .map(|i| TECH_CATEGORIES[((h + i * 7) % TECH_CATEGORIES.len() as u64) as usize])
            .unique()
            .map(str::to_string)
            .collect();
    }
    metrics
}

/// The resolver fallback for the website-ranking engine.
pub fn synthesize_metrics(domain: &str) -> WebsiteMetrics {
    mock_metrics(Provider::SeoZoom, domain)
}

/// [`synthesize_metrics`] with visits and ranks scaled by a random factor in
/// `1 ± variation`. Not deterministic.
pub fn synthesize_metrics_varied(domain: &str, variation: f64) -> WebsiteMetrics {
    let mut metrics = synthesize_metrics(domain);
    let variation = variation.clamp(0.0, 0.9);
    if variation == 0.0 {
        return metrics;
    }
    let mut r = rng();
    let mut scale = |v: u64| -> u64 {
        let factor: f64 = r.random_range(1.0 - variation..=1.0 + variation);
        ((v as f64 * factor).round() as u64).max(1)
    };
    metrics.monthly_visits = metrics.monthly_visits.map(&mut scale);
    metrics.global_rank = metrics.global_rank.map(&mut scale);
    metrics.country_rank = metrics.country_rank.map(&mut scale);
    metrics
}

/// Deterministic traffic shape for `domain`, used to enrich sources that
/// report performance but no traffic.
pub fn traffic_estimate(domain: &str) -> WebsiteMetrics {
    apply_profile(&TRAFFIC_ESTIMATE, domain, TRAFFIC_ESTIMATE.label.to_string())
}

// ---------------------------------------------------------------------------
// Articles
// ---------------------------------------------------------------------------

fn read_multiplier(category: &str) -> f64 {
    match category {
        "Cronaca" => 1.5,
        "Sport" => 1.3,
        "Cultura" => 1.1,
        "Politica" => 1.4,
        "Economia" => 1.2,
        _ => 1.0,
    }
}

fn share_multiplier(category: &str) -> f64 {
    match category {
        "Cronaca" => 1.5,
        "Sport" => 1.3,
        "Cultura" => 0.8,
        "Politica" => 1.4,
        "Economia" => 1.1,
        _ => 1.0,
    }
}

fn comment_multiplier(category: &str) -> f64 {
    match category {
        "Cronaca" => 1.8,
        "Sport" => 1.2,
        "Cultura" => 0.6,
        "Politica" => 2.0,
        "Economia" => 1.1,
        _ => 1.0,
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// Read count before the per-title factor is applied.
fn base_reads(title: &str, category: &str) -> f64 {
    let lower = title.to_lowercase();
    let mut reads = 100.0 * read_multiplier(category);
    if contains_any(&lower, &["trieste", "friuli", "venezia giulia"]) {
        reads *= 1.2;
    }
    if contains_any(&lower, &["emergenza", "crisi", "allarme"]) {
        reads *= 1.5;
    }
    if contains_any(&lower, &["successo", "vittoria", "record"]) {
        reads *= 1.3;
    }
    reads
}

/// Estimated reads for a scraped article, never below 50.
pub fn estimate_read_count(title: &str, category: &str) -> u64 {
    let factor = 0.8 + unit(keyed_hash("reads", title)) * 0.7;
    ((base_reads(title, category) * factor) as u64).max(50)
}

pub fn estimate_read_count_varied(title: &str, category: &str) -> u64 {
    let factor: f64 = rng().random_range(0.8..1.5);
    ((base_reads(title, category) * factor) as u64).max(50)
}

pub fn estimate_social_shares(title: &str, category: &str) -> u64 {
    let base = (10.0 * share_multiplier(category)).floor();
    let factor = 0.5 + unit(keyed_hash("shares", title)) * 1.5;
    (base * factor) as u64
}

pub fn estimate_social_shares_varied(category: &str) -> u64 {
    let base = (10.0 * share_multiplier(category)).floor();
    (base * rng().random_range(0.5..2.0)) as u64
}

pub fn estimate_comments_count(title: &str, category: &str) -> u64 {
    let base = (5.0 * comment_multiplier(category)).floor();
    let factor = 0.3 + unit(keyed_hash("comments", title)) * 1.5;
    (base * factor) as u64
}

pub fn estimate_comments_count_varied(category: &str) -> u64 {
    let base = (5.0 * comment_multiplier(category)).floor();
    (base * rng().random_range(0.3..1.8)) as u64
}

/// Article length estimate between 300 and 800 words.
pub fn estimate_word_count(title: &str) -> u64 {
    300 + keyed_hash("words", title) % 501
}

/// Engagement score out of 10 from title length, article length, and keywords.
pub fn engagement_score(title: &str, word_count: u64) -> f64 {
    let mut score: f64 = 5.0;
    let len = title.chars().count();
    if (50..=60).contains(&len) {
        score += 2.0;
    } else if (40..=70).contains(&len) {
        score += 1.0;
    }
    if (300..=800).contains(&word_count) {
        score += 2.0;
    } else if (200..=1000).contains(&word_count) {
        score += 1.0;
    }
    let lower = title.to_lowercase();
    if contains_any(&lower, &["esclusivo", "breaking", "urgente"]) {
        score += 1.5;
    }
    if contains_any(&lower, &["video", "foto", "gallery"]) {
        score += 1.0;
    }
    score.min(10.0)
}

fn section_base_reads(section: &str) -> u64 {
    match section {
        "cronaca" => 1200,
        "sport" => 800,
        "cultura" => 600,
        "politica" => 1000,
        "economia" => 700,
        "tecnologia" => 500,
        "salute" => 400,
        "ambiente" => 300,
        _ => 500,
    }
}

/// Reads for a catalogue article: within ±30% of the section's base.
pub fn section_reads(section: &str, title: &str) -> u64 {
    let base = section_base_reads(section);
    let low = base * 7 / 10;
    let high = base * 13 / 10;
    low + keyed_hash("section-reads", title) % (high - low + 1)
}

fn category_engagement_base(category: &str) -> f64 {
    match category {
        "Cronaca" => 8.5,
        "Sport" => 7.2,
        "Cultura" => 6.8,
        "Politica" => 8.0,
        "Economia" => 7.5,
        "Tecnologia" => 6.5,
        "Salute" => 7.0,
        "Ambiente" => 6.0,
        _ => 7.0,
    }
}

/// Category baseline ± 0.5, one decimal.
pub fn category_engagement(category: &str, title: &str) -> f64 {
    let jitter = unit(keyed_hash("engagement", title)) - 0.5;
    round1(category_engagement_base(category) + jitter)
}

fn category_share_base(category: &str) -> u64 {
    match category {
        "Cronaca" => 45,
        "Sport" | "Salute" => 35,
        "Politica" => 40,
        "Economia" => 30,
        "Cultura" | "Ambiente" => 25,
        "Tecnologia" => 20,
        _ => 30,
    }
}

fn category_comment_base(category: &str) -> u64 {
    match category {
        "Cronaca" => 25,
        "Sport" => 20,
        "Politica" => 35,
        "Salute" => 22,
        "Economia" => 18,
        "Cultura" | "Ambiente" => 15,
        "Tecnologia" => 12,
        _ => 20,
    }
}

fn spread_between(h: u64, low: u64, high: u64) -> u64 {
    low + h % (high.saturating_sub(low) + 1)
}

/// A sample headline with its site section and display category.
struct CatalogueEntry {
    title: &'static str,
    section: &'static str,
    category: &'static str,
}

const CATALOGUE: &[CatalogueEntry] = &[
    CatalogueEntry { title: "Trieste: Nuovo piano urbanistico approvato dal consiglio comunale", section: "cronaca", category: "Cronaca" },
    CatalogueEntry { title: "Sport: La Triestina vince 3-1 contro il Venezia in casa", section: "sport", category: "Sport" },
    CatalogueEntry { title: "Cultura: Mostra d'arte contemporanea al Museo Revoltella", section: "cultura", category: "Cultura" },
    CatalogueEntry { title: "Politica: Elezioni comunali, i candidati si presentano", section: "politica", category: "Politica" },
    CatalogueEntry { title: "Economia: Nuovo investimento da 50 milioni per il porto di Trieste", section: "economia", category: "Economia" },
    CatalogueEntry { title: "Emergenza meteo: Allerta arancione per il Friuli Venezia Giulia", section: "cronaca", category: "Cronaca" },
    CatalogueEntry { title: "Salute: Nuovo ospedale pediatrico in costruzione a Opicina", section: "salute", category: "Salute" },
    CatalogueEntry { title: "Turismo: Record di presenze a Trieste, +15% rispetto all'anno scorso", section: "economia", category: "Economia" },
    CatalogueEntry { title: "Istruzione: Università di Trieste, nuovi corsi di laurea in medicina", section: "cultura", category: "Cultura" },
    CatalogueEntry { title: "Trasporti: Potenziamento della linea ferroviaria Trieste-Venezia", section: "trasporti", category: "Trasporti" },
    CatalogueEntry { title: "Barcolana: Oltre 2000 barche in regata, spettacolo unico", section: "sport", category: "Sport" },
    CatalogueEntry { title: "Cultura: Festival dell'Europa Orientale, programma ricchissimo", section: "cultura", category: "Cultura" },
    CatalogueEntry { title: "Politica: Nuova giunta comunale insediata, obiettivi per il mandato", section: "politica", category: "Politica" },
    CatalogueEntry { title: "Ambiente: Iniziativa \"Trieste Verde\" per la sostenibilità urbana", section: "ambiente", category: "Ambiente" },
    CatalogueEntry { title: "Cronaca: Incidente stradale in via Carducci, nessun ferito", section: "cronaca", category: "Cronaca" },
    CatalogueEntry { title: "Tecnologia: Startup triestine conquistano il mercato europeo", section: "tecnologia", category: "Tecnologia" },
    CatalogueEntry { title: "Sport: Pallacanestro Trieste, vittoria importante in trasferta", section: "sport", category: "Sport" },
    CatalogueEntry { title: "Cultura: Teatro Verdi, nuova stagione con grandi nomi internazionali", section: "cultura", category: "Cultura" },
    CatalogueEntry { title: "Economia: Porto Vecchio, riqualificazione dell'area ex Cattaruzza", section: "economia", category: "Economia" },
    CatalogueEntry { title: "Cronaca: Mercato di Ponterosso, novità e orari estivi", section: "cronaca", category: "Cronaca" },
];

/// Number of headlines the article generator can produce.
pub fn catalogue_len() -> usize {
    CATALOGUE.len()
}

fn publish_date_for(period: Period, index: usize, today: NaiveDate) -> String {
    let days_ago = match period {
        Period::Daily => 0,
        Period::Last7Days => (index % 7) as i64,
    };
    (today - Duration::days(days_ago)).format("%Y-%m-%d").to_string()
}

/// The resolver fallback for the article engine.
///
/// Produces `min(limit, catalogue_len())` articles dated inside `period`
/// relative to `today`, sorted by read count (highest first).
pub fn synthesize_articles(base_url: &str, period: Period, limit: usize, today: NaiveDate) -> Vec<ArticleData> {
    let base_url = base_url.trim_end_matches('/');
    CATALOGUE
        .iter()
        .take(limit)
        .enumerate()
        .map(|(i, entry)| {
            let h = keyed_hash("catalogue", entry.title);
            let shares_base = category_share_base(entry.category);
            let comments_base = category_comment_base(entry.category);
            ArticleData {
                title: entry.title.to_string(),
                url: format!("{}/{}/article-{}", base_url, entry.section, i + 1),
                publish_date: publish_date_for(period, i, today),
                category: entry.category.to_string(),
                author: UNKNOWN_AUTHOR.to_string(),
                read_count: section_reads(entry.section, entry.title),
                engagement_score: category_engagement(entry.category, entry.title),
                social_shares: spread_between(h, shares_base / 2, shares_base * 3 / 2),
                comments_count: spread_between(h / 7, comments_base * 3 / 10, comments_base * 12 / 10),
                word_count: estimate_word_count(entry.title),
            }
        })
        .sorted_by(|a, b| b.read_count.cmp(&a.read_count))
        .collect()
}

/// [`synthesize_articles`] with read, share, and comment counts redrawn at
/// random. Not deterministic.
pub fn synthesize_articles_varied(base_url: &str, period: Period, limit: usize, today: NaiveDate) -> Vec<ArticleData> {
    synthesize_articles(base_url, period, limit, today)
        .into_iter()
        .map(|mut a| {
            a.read_count = estimate_read_count_varied(&a.title, &a.category);
            a.social_shares = estimate_social_shares_varied(&a.category);
            a.comments_count = estimate_comments_count_varied(&a.category);
            a
        })
        .sorted_by(|a, b| b.read_count.cmp(&a.read_count))
        .collect()
}
