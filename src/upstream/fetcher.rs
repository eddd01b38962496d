use super::{ArticleRecord, PageviewSource, Target, UpstreamError};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Records returned for one target, tagged with the target's position in the
/// batch so callers can restore chronological order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub slot: usize,
    pub records: Vec<ArticleRecord>,
}

/// Outcome counts for one fan-out batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub succeeded: usize,
    pub failed: usize,
}

/// Runs upstream fetches with a bounded number of calls in flight.
///
/// Failed or timed-out targets are logged and skipped; they never abort the
/// rest of the batch.
#[derive(Clone)]
pub struct ConcurrentFetcher {
    source: Arc<dyn PageviewSource>,
    max_in_flight: usize,
    call_timeout: Duration,
}

impl ConcurrentFetcher {
    /// `max_in_flight` is clamped to at least 1.
    pub fn new(
        source: Arc<dyn PageviewSource>,
        max_in_flight: usize,
        call_timeout: Duration,
    ) -> Self {
        Self {
            source,
            max_in_flight: max_in_flight.max(1),
            call_timeout,
        }
    }

    pub const fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    /// Fetch a single target, surfacing any failure to the caller.
    pub async fn fetch_one(&self, target: &Target) -> Result<Vec<ArticleRecord>, UpstreamError> {
        tokio::time::timeout(self.call_timeout, self.source.fetch(target))
            .await
            .map_err(|_| UpstreamError::Timeout)?
    }

    /// Fetch every target and return the successful payloads in target order.
    pub async fn fetch_all(&self, targets: Vec<Target>) -> Vec<Payload> {
        let slots: Arc<Mutex<Vec<Option<Payload>>>> =
            Arc::new(Mutex::new(vec![None; targets.len()]));
        let sink = Arc::clone(&slots);
        self.for_each_completed(targets, move |payload| {
            let slot = payload.slot;
            sink.lock()[slot] = Some(payload);
        })
        .await;

        let filled = std::mem::take(&mut *slots.lock());
        filled.into_iter().flatten().collect()
    }

    /// Fetch every target and hand each successful payload to `on_payload`
    /// as soon as it arrives. Completion order is arbitrary; `Payload::slot`
    /// carries the target's position.
    pub async fn for_each_completed<F>(&self, targets: Vec<Target>, on_payload: F) -> BatchReport
    where
        F: Fn(Payload) + Send + Sync + 'static,
    {
        let permits = Arc::new(Semaphore::new(self.max_in_flight));
        let on_payload = Arc::new(on_payload);
        let mut tasks = JoinSet::new();

        for (slot, target) in targets.into_iter().enumerate() {
            let permits = Arc::clone(&permits);
            let on_payload = Arc::clone(&on_payload);
            let fetcher = self.clone();
            tasks.spawn(async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    return false;
                };
                match fetcher.fetch_one(&target).await {
                    Ok(records) => {
                        on_payload(Payload { slot, records });
                        true
                    }
                    Err(e) => {
                        tracing::warn!(
                            query = %target,
                            error = %e,
                            "Upstream fetch failed, skipping"
                        );
                        false
                    }
                }
            });
        }

        let mut report = BatchReport::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(true) => report.succeeded += 1,
                Ok(false) => report.failed += 1,
                Err(e) => {
                    tracing::error!(error = %e, "Fetch task panicked");
                    report.failed += 1;
                }
            }
        }

        tracing::debug!(
            succeeded = report.succeeded,
            failed = report.failed,
            "Fan-out batch complete"
        );
        report
    }
}
