//! Source-chain resolution with a synthetic fallback.
//!
//! A target (a domain, or an article [`Period`](crate::models::Period)) is
//! handed to an ordered list of [`Strategy`] implementations. The first one
//! whose output passes [`Validate`] wins and no later strategy runs. When
//! every strategy comes back empty or fails, a pure fallback function
//! manufactures the value, so resolution always produces something.
//!
//! # State machine
//!
//! ```text
//! NotStarted -> Trying(0) -> Success
//!                        \-> Trying(1) -> ... -> SyntheticFallback -> Done
//! ```
//!
//! Strategy errors never escape: they are logged and treated as "no data".

use crate::articles::parse::title_ok;
use crate::models::{ArticleData, WebsiteMetrics};
use async_trait::async_trait;
use futures::future::join_all;
use std::error::Error;
use std::fmt;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Boxed error used inside strategies, sendable across tasks.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// One way of acquiring data for a target.
///
/// Implementations may perform network I/O. Returning `Ok(None)` means the
/// strategy found nothing; returning `Err` means it failed. The resolver
/// treats both the same way.
#[async_trait]
pub trait Strategy<Tg: ?Sized + Sync, T: Send>: Send + Sync {
    /// Human-readable label, also used as the `data_source` of real records.
    fn label(&self) -> &str;

    /// Whether the strategy has what it needs (API keys etc.) to run at all.
    /// Unconfigured strategies are skipped rather than attempted.
    fn is_configured(&self) -> bool {
        true
    }

    async fn attempt(&self, target: &Tg) -> Result<Option<T>, BoxError>;
}

/// The "looks valid" check applied to a strategy's output before it is accepted.
pub trait Validate {
    fn is_valid(&self) -> bool;
}

impl Validate for WebsiteMetrics {
    fn is_valid(&self) -> bool {
        !self.is_synthetic() && (self.has_traffic() || !self.technologies.is_empty())
    }
}

impl Validate for Vec<ArticleData> {
    fn is_valid(&self) -> bool {
        !self.is_empty() && self.iter().all(|a| title_ok(&a.title))
    }
}

/// Progress of a single resolution call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveState {
    NotStarted,
    Trying(usize),
    Success,
    SyntheticFallback,
    Done,
}

/// Where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A strategy with this label produced the value.
    Strategy(String),
    /// Every strategy failed and the fallback generated the value.
    Synthetic,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Strategy(label) => f.write_str(label),
            Outcome::Synthetic => f.write_str("synthetic"),
        }
    }
}

/// The value produced by [`resolve`] plus bookkeeping about how it was found.
#[derive(Debug, Clone)]
pub struct Resolution<T> {
    pub value: T,
    pub outcome: Outcome,
    /// Number of strategies actually invoked.
    pub attempts: usize,
    /// Number of strategies skipped because they were not configured.
    pub skipped: usize,
    /// Terminal state: `Success` or `Done` (after the synthetic fallback).
    pub state: ResolveState,
}

impl<T> Resolution<T> {
    /// A value generated without consulting any strategy.
    pub fn synthetic(value: T) -> Self {
        Self {
            value,
            outcome: Outcome::Synthetic,
            attempts: 0,
            skipped: 0,
            state: ResolveState::Done,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.outcome == Outcome::Synthetic
    }
}

/// Run one strategy, folding errors and invalid output into `None`.
async fn try_strategy<Tg, T>(strategy: &dyn Strategy<Tg, T>, target: &Tg) -> Option<T>
where
    Tg: ?Sized + Sync + fmt::Display,
    T: Validate + Send,
{
    let t0 = Instant::now();
    let result = strategy.attempt(target).await;
    let elapsed_ms = t0.elapsed().as_millis() as u64;

    match result {
        Ok(Some(value)) if value.is_valid() => Some(value),
        Ok(Some(_)) => {
            info!(strategy = strategy.label(), %target, elapsed_ms, "Strategy returned data that failed validation");
            None
        }
        Ok(None) => {
            info!(strategy = strategy.label(), %target, elapsed_ms, "Strategy yielded nothing");
            None
        }
        Err(e) => {
            warn!(strategy = strategy.label(), %target, elapsed_ms, error = %e, "Strategy failed; trying next");
            None
        }
    }
}

/// Resolve `target` through `strategies` in order, falling back to `fallback`.
///
/// The first strategy returning a valid value wins; no later strategy is
/// invoked. `fallback` must be pure: it is only called when every strategy
/// has failed and it cannot fail itself.
pub async fn resolve<Tg, T, F>(
    target: &Tg,
    strategies: &[Box<dyn Strategy<Tg, T>>],
    fallback: F,
) -> Resolution<T>
where
    Tg: ?Sized + Sync + fmt::Display,
    T: Validate + Send,
    F: FnOnce(&Tg) -> T,
{
    let mut state = ResolveState::NotStarted;
    let mut attempts = 0usize;
    let mut skipped = 0usize;
    debug!(%target, strategies = strategies.len(), ?state, "Starting resolution");

    for (i, strategy) in strategies.iter().enumerate() {
        if !strategy.is_configured() {
            skipped += 1;
            debug!(strategy = strategy.label(), %target, "Strategy not configured; skipping");
            continue;
        }

        state = ResolveState::Trying(i);
        attempts += 1;
        info!(strategy = strategy.label(), %target, ?state, "Trying strategy");

        if let Some(value) = try_strategy(strategy.as_ref(), target).await {
            state = ResolveState::Success;
            info!(strategy = strategy.label(), %target, attempts, ?state, "Resolved from strategy");
            return Resolution {
                value,
                outcome: Outcome::Strategy(strategy.label().to_string()),
                attempts,
                skipped,
                state,
            };
        }
    }

    state = ResolveState::SyntheticFallback;
    warn!(%target, attempts, skipped, ?state, "All strategies failed; using synthetic data");
    let value = fallback(target);
    state = ResolveState::Done;

    Resolution {
        value,
        outcome: Outcome::Synthetic,
        attempts,
        skipped,
        state,
    }
}

/// Run every configured strategy concurrently and keep each valid result,
/// in chain order.
///
/// Unlike [`resolve`] this does not stop at the first success and has no
/// fallback; an empty vector means nothing real was found.
pub async fn gather<Tg, T>(target: &Tg, strategies: &[Box<dyn Strategy<Tg, T>>]) -> Vec<T>
where
    Tg: ?Sized + Sync + fmt::Display,
    T: Validate + Send,
{
    let attempts = strategies
        .iter()
        .filter(|s| s.is_configured())
        .map(|s| try_strategy(s.as_ref(), target));
    let results: Vec<T> = join_all(attempts).await.into_iter().flatten().collect();
    info!(%target, collected = results.len(), "Gathered results");
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, PartialEq)]
    struct Num(u32);

    impl Validate for Num {
        fn is_valid(&self) -> bool {
            self.0 > 0
        }
    }

    enum Behaviour {
        Yield(u32),
        Nothing,
        Fail,
    }

    struct Fake {
        label: String,
        behaviour: Behaviour,
        configured: bool,
        calls: Arc<AtomicUsize>,
    }

    impl Fake {
        fn boxed(label: &str, behaviour: Behaviour, calls: &Arc<AtomicUsize>) -> Box<dyn Strategy<str, Num>> {
            Box::new(Fake {
                label: label.to_string(),
                behaviour,
                configured: true,
                calls: Arc::clone(calls),
            })
        }
    }

    #[async_trait]
    impl Strategy<str, Num> for Fake {
        fn label(&self) -> &str {
            &self.label
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn attempt(&self, _target: &str) -> Result<Option<Num>, BoxError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behaviour {
                Behaviour::Yield(n) => Ok(Some(Num(n))),
                Behaviour::Nothing => Ok(None),
                Behaviour::Fail => Err("connection refused".into()),
            }
        }
    }

    #[tokio::test]
    async fn test_first_valid_strategy_short_circuits() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let third = Arc::new(AtomicUsize::new(0));
        let chain = vec![
            Fake::boxed("empty", Behaviour::Nothing, &first),
            Fake::boxed("good", Behaviour::Yield(7), &second),
            Fake::boxed("later", Behaviour::Yield(9), &third),
        ];

        let res = resolve("example.com", &chain, |_| Num(1)).await;

        assert_eq!(res.value, Num(7));
        assert_eq!(res.outcome, Outcome::Strategy("good".to_string()));
        assert_eq!(res.attempts, 2);
        assert_eq!(res.state, ResolveState::Success);
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 1);
        assert_eq!(third.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_all_failing_strategies_use_fallback() {
        let calls = Arc::new(AtomicUsize::new(0));
        let chain = vec![
            Fake::boxed("a", Behaviour::Fail, &calls),
            Fake::boxed("b", Behaviour::Fail, &calls),
            Fake::boxed("c", Behaviour::Fail, &calls),
        ];

        let res = resolve("example.com", &chain, |t: &str| Num(t.len() as u32)).await;

        assert!(res.is_synthetic());
        assert_eq!(res.value, Num(11));
        assert_eq!(res.attempts, 3);
        assert_eq!(res.state, ResolveState::Done);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_invalid_output_falls_through() {
        let calls = Arc::new(AtomicUsize::new(0));
        let chain = vec![
            Fake::boxed("zero", Behaviour::Yield(0), &calls),
            Fake::boxed("ok", Behaviour::Yield(3), &calls),
        ];

        let res = resolve("example.com", &chain, |_| Num(1)).await;
        assert_eq!(res.value, Num(3));
        assert_eq!(res.attempts, 2);
    }

    #[tokio::test]
    async fn test_unconfigured_strategies_are_skipped() {
        let calls = Arc::new(AtomicUsize::new(0));
        let chain: Vec<Box<dyn Strategy<str, Num>>> = vec![Box::new(Fake {
            label: "needs-key".to_string(),
            behaviour: Behaviour::Yield(5),
            configured: false,
            calls: Arc::clone(&calls),
        })];

        let res = resolve("example.com", &chain, |_| Num(2)).await;
        assert!(res.is_synthetic());
        assert_eq!(res.attempts, 0);
        assert_eq!(res.skipped, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_chain_goes_straight_to_fallback() {
        let chain: Vec<Box<dyn Strategy<str, Num>>> = Vec::new();
        let res = resolve("example.com", &chain, |_| Num(4)).await;
        assert_eq!(res.value, Num(4));
        assert_eq!(res.outcome.to_string(), "synthetic");
    }

    #[tokio::test]
    async fn test_gather_collects_every_valid_result() {
        let calls = Arc::new(AtomicUsize::new(0));
        let chain = vec![
            Fake::boxed("a", Behaviour::Yield(1), &calls),
            Fake::boxed("b", Behaviour::Fail, &calls),
            Fake::boxed("c", Behaviour::Yield(2), &calls),
        ];

        let all = gather("example.com", &chain).await;
        assert_eq!(all, vec![Num(1), Num(2)]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_metrics_validation_rejects_mock_records() {
        let mut m = WebsiteMetrics::new("example.com", "SEOZoom (Mock)");
        m.monthly_visits = Some(1000);
        assert!(!m.is_valid());
        m.data_source = "SEOZoom (Real - keywords)".to_string();
        assert!(m.is_valid());
    }

    #[test]
    fn test_article_list_validation() {
        let article = |title: &str| ArticleData {
            title: title.to_string(),
            url: "https://www.triesteallnews.it/cronaca/x".to_string(),
            publish_date: "2025-05-06".to_string(),
            category: "Cronaca".to_string(),
            author: "Unknown Author".to_string(),
            read_count: 100,
            engagement_score: 5.0,
            social_shares: 1,
            comments_count: 1,
            word_count: 400,
        };
        assert!(!Vec::<ArticleData>::new().is_valid());
        assert!(vec![article("Trieste, nuovo piano urbanistico")].is_valid());
        assert!(!vec![article("Short")].is_valid());
        assert!(!vec![article("1234567890")].is_valid());
        assert!(vec![article("12345678901")].is_valid());
        assert!(!vec![article("Trieste, nuovo piano urbanistico"), article("1234567890")].is_valid());
    }

    #[test]
    fn test_synthetic_resolution_skips_bookkeeping() {
        let res = Resolution::synthetic(Num(3));
        assert!(res.is_synthetic());
        assert_eq!(res.attempts, 0);
        assert_eq!(res.state, ResolveState::Done);
    }
}
