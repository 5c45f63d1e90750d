//! Periodic ingestion trigger.

use crate::ingest::Ingestor;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{info, instrument};

/// Trigger `ingestor` every `period` until the returned handle is aborted.
///
/// The first run fires immediately unless `run_immediately` is false. Each
/// run is spawned on its own task so a slow run cannot delay the clock; an
/// overlapping trigger is dropped by the ingestor's single-flight guard.
#[instrument(level = "info", skip(ingestor))]
pub fn spawn_periodic(
    ingestor: Arc<Ingestor>,
    period: Duration,
    run_immediately: bool,
) -> JoinHandle<()> {
    let start = if run_immediately {
        Instant::now()
    } else {
        Instant::now() + period
    };

    tokio::spawn(async move {
        let mut ticker = interval_at(start, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let ingestor = Arc::clone(&ingestor);
            tokio::spawn(async move {
                if let Some(report) = ingestor.run().await {
                    info!(
                        stored = report.stored,
                        skipped = report.skipped,
                        "Scheduled ingestion finished"
                    );
                }
            });
        }
    })
}
