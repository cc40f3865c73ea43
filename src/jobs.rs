//! Background resolutions with a single-consumer hand-off.
//!
//! Each submitted job runs on its own tokio task and posts a [`JobOutcome`]
//! into one `mpsc` channel. A single consumer task applies outcomes to the
//! shared [`Dashboard`]. Ids increase per [`JobKind`], and an outcome whose id
//! is not newer than the last one applied for its kind is dropped, so a slow
//! early request can never overwrite the result of a later one.

use crate::models::{ArticleData, Comparison, Period};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    Comparison,
    Articles,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobPayload {
    Comparison(Comparison),
    Articles {
        period: Period,
        source: String,
        articles: Vec<ArticleData>,
    },
}

impl JobPayload {
    pub fn kind(&self) -> JobKind {
        match self {
            JobPayload::Comparison(_) => JobKind::Comparison,
            JobPayload::Articles { .. } => JobKind::Articles,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobOutcome {
    pub id: u64,
    pub kind: JobKind,
    pub payload: JobPayload,
}

/// Latest applied results, one slot per job kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dashboard {
    /// Id of the comparison in `comparison`, 0 when none has landed.
    pub comparison_job: u64,
    pub comparison: Option<Comparison>,
    pub articles_job: u64,
    pub articles: Option<JobPayload>,
    /// Outcomes discarded because a newer one had already been applied.
    pub dropped: u64,
}

impl Dashboard {
    /// Apply `outcome` unless it is stale. Returns whether it was applied.
    pub fn apply(&mut self, outcome: JobOutcome) -> bool {
        let slot = match outcome.payload.kind() {
            JobKind::Comparison => &mut self.comparison_job,
            JobKind::Articles => &mut self.articles_job,
        };
        if outcome.id <= *slot {
            self.dropped += 1;
            return false;
        }
        *slot = outcome.id;
        match outcome.payload {
            JobPayload::Comparison(comparison) => self.comparison = Some(comparison),
            articles @ JobPayload::Articles { .. } => self.articles = Some(articles),
        }
        true
    }
}

pub struct JobBoard {
    tx: mpsc::UnboundedSender<JobOutcome>,
    comparison_seq: AtomicU64,
    articles_seq: AtomicU64,
    dashboard: Arc<RwLock<Dashboard>>,
}

impl JobBoard {
    /// Create the board and spawn its consumer. Must be called inside a
    /// tokio runtime.
    pub fn start() -> Arc<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let dashboard = Arc::new(RwLock::new(Dashboard::default()));
        tokio::spawn(consume(rx, Arc::clone(&dashboard)));
        Arc::new(Self {
            tx,
            comparison_seq: AtomicU64::new(0),
            articles_seq: AtomicU64::new(0),
            dashboard,
        })
    }

    fn seq(&self, kind: JobKind) -> &AtomicU64 {
        match kind {
            JobKind::Comparison => &self.comparison_seq,
            JobKind::Articles => &self.articles_seq,
        }
    }

    /// Run `work` in the background and return its job id.
    ///
    /// `work` must resolve to a payload of `kind`.
    pub fn submit<F>(&self, kind: JobKind, work: F) -> u64
    where
        F: Future<Output = JobPayload> + Send + 'static,
    {
        let id = self.seq(kind).fetch_add(1, Ordering::SeqCst) + 1;
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let payload = work.await;
            debug_assert_eq!(payload.kind(), kind);
            if tx.send(JobOutcome { id, kind, payload }).is_err() {
                warn!(id, ?kind, "Job board closed; outcome discarded");
            }
        });
        info!(id, ?kind, "Job submitted");
        id
    }

    pub async fn snapshot(&self) -> Dashboard {
        self.dashboard.read().await.clone()
    }
}

async fn consume(mut rx: mpsc::UnboundedReceiver<JobOutcome>, dashboard: Arc<RwLock<Dashboard>>) {
    while let Some(outcome) = rx.recv().await {
        let (id, kind) = (outcome.id, outcome.kind);
        if dashboard.write().await.apply(outcome) {
            debug!(id, ?kind, "Job outcome applied");
        } else {
            info!(id, ?kind, "Dropped stale job outcome");
        }
    }
}
