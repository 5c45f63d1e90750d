//! Ingestion orchestrator.
//!
//! One run launches every source adapter concurrently, waits for all of them
//! at a barrier, then writes each successful batch to the store in source
//! order. Ingestion is best-effort: a failed, panicked or timed-out source
//! contributes nothing and never fails the run.
//!
//! Runs are single-flight. A trigger that arrives while a run is in progress
//! is dropped rather than queued.

use crate::models::Article;
use crate::scrapers::SourceAdapter;
use crate::store::{ArticleStore, InsertOutcome};
use futures::future::join_all;
use itertools::Itertools;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::time::{Instant, timeout_at};
use tracing::{debug, error, info, instrument, warn};

/// Outcome of one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Articles inserted as new rows.
    pub stored: usize,
    /// Articles whose URL was already stored.
    pub skipped: usize,
    /// Sources that errored, panicked or timed out.
    pub failed_sources: Vec<String>,
}

/// Runs every adapter and persists what they return.
pub struct Ingestor {
    store: Arc<ArticleStore>,
    adapters: Vec<Arc<dyn SourceAdapter>>,
    adapter_timeout: Duration,
    running: Mutex<()>,
}

impl Ingestor {
    pub fn new(
        store: Arc<ArticleStore>,
        adapters: Vec<Arc<dyn SourceAdapter>>,
        adapter_timeout: Duration,
    ) -> Self {
        Self {
            store,
            adapters,
            adapter_timeout,
            running: Mutex::new(()),
        }
    }

    /// Run one ingestion cycle.
    ///
    /// Returns `None` when another cycle is already running.
    #[instrument(level = "info", skip_all)]
    pub async fn run(&self) -> Option<IngestReport> {
        let Ok(_guard) = self.running.try_lock() else {
            warn!("Ingestion already in progress; skipping this trigger");
            return None;
        };

        let t0 = Instant::now();
        info!(sources = self.adapters.len(), "Starting news ingestion from all sources");

        let (batches, mut failed_sources) = self.scrape_all().await;

        let store = Arc::clone(&self.store);
        let (stored, skipped) = match tokio::task::spawn_blocking(move || store_batches(&store, batches)).await {
            Ok(counts) => counts,
            Err(e) => {
                error!(error = %e, "Storage task failed");
                (0, 0)
            }
        };

        failed_sources.sort();
        info!(
            stored,
            skipped,
            failed = %failed_sources.iter().join(", "),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Ingestion completed"
        );

        Some(IngestReport {
            stored,
            skipped,
            failed_sources,
        })
    }

    /// Fan out one task per adapter, then fan in at a barrier.
    ///
    /// Every wait shares one deadline measured from launch, so no adapter
    /// gets more than `adapter_timeout` and a stalled one is aborted.
    async fn scrape_all(&self) -> (Vec<(String, Vec<Article>)>, Vec<String>) {
        let (err_tx, mut err_rx) = mpsc::unbounded_channel::<(String, String)>();
        let deadline = Instant::now() + self.adapter_timeout;

        let mut pending = Vec::with_capacity(self.adapters.len());
        for adapter in &self.adapters {
            let name = adapter.name().to_string();
            let (tx, rx) = oneshot::channel::<Option<Vec<Article>>>();
            let adapter = Arc::clone(adapter);
            let err_tx = err_tx.clone();
            let task_name = name.clone();

            let handle = tokio::spawn(async move {
                info!(source = %task_name, "Starting scrape");
                let result = match adapter.scrape().await {
                    Ok(articles) => Some(articles),
                    Err(e) => {
                        error!(source = %task_name, error = %e, "Error scraping source");
                        let _ = err_tx.send((task_name, e.to_string()));
                        None
                    }
                };
                let _ = tx.send(result);
            });
            pending.push((name, rx, handle));
        }
        drop(err_tx);

        let outcomes = join_all(pending.into_iter().map(|(name, rx, handle)| async move {
            let outcome = timeout_at(deadline, rx).await;
            if outcome.is_err() {
                handle.abort();
            }
            (name, outcome)
        }))
        .await;

        let mut batches = Vec::new();
        let mut failed = Vec::new();
        for (name, outcome) in outcomes {
            match outcome {
                Ok(Ok(Some(articles))) => {
                    info!(source = %name, count = articles.len(), "Source returned articles");
                    batches.push((name, articles));
                }
                Ok(Ok(None)) => failed.push(name),
                Ok(Err(_)) => {
                    error!(source = %name, "Scrape task ended without a result");
                    failed.push(name);
                }
                Err(_) => {
                    warn!(source = %name, timeout = ?self.adapter_timeout, "Source timed out; cancelled");
                    failed.push(name);
                }
            }
        }

        let mut reported = 0usize;
        while let Ok((source, message)) = err_rx.try_recv() {
            debug!(%source, %message, "Source failure reported");
            reported += 1;
        }
        if reported > 0 {
            warn!(reported, "Some sources failed during this run");
        }

        (batches, failed)
    }
}

/// Check-then-insert every article, in source order then emission order.
fn store_batches(store: &ArticleStore, batches: Vec<(String, Vec<Article>)>) -> (usize, usize) {
    let mut stored = 0usize;
    let mut skipped = 0usize;

    for (source, articles) in batches {
        for article in articles {
            match store.exists(&article.url) {
                Err(e) => {
                    error!(%source, url = %article.url, error = %e, "Error checking article existence");
                }
                Ok(true) => {
                    if let Err(e) = store.touch(&article.url) {
                        warn!(%source, url = %article.url, error = %e, "Failed to refresh scrape timestamp");
                    }
                    skipped += 1;
                }
                Ok(false) => match store.insert(&article) {
                    Ok(InsertOutcome::Inserted) => {
                        debug!(%source, title = %article.title, "Stored new article");
                        stored += 1;
                    }
                    Ok(InsertOutcome::AlreadyPresent) => skipped += 1,
                    Err(e) => {
                        error!(%source, url = %article.url, error = %e, "Error storing article");
                    }
                },
            }
        }
    }

    (stored, skipped)
}
