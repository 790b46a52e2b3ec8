//! Webhook intake: dedup, then process each message on its own tracked task.

use std::sync::Arc;
use std::time::Duration;

use handler_chain::HandlerChain;
use herald_core::{ToCoreMessage, Update};
use tokio::sync::Semaphore;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::cache::IdempotencyCache;

/// What happened to an accepted update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptOutcome {
    /// Seen within the idempotency window; dropped.
    Duplicate,
    /// Handed to a worker task.
    Dispatched,
    /// Not a message; logged only.
    Logged,
}

/// Runs the handler chain for each new update on a separate task, at most `max_concurrent`
/// at a time. Tasks are tracked so shutdown can wait for them.
#[derive(Clone)]
pub struct UpdateDispatcher {
    cache: Arc<IdempotencyCache>,
    chain: Arc<HandlerChain>,
    permits: Arc<Semaphore>,
    tracker: TaskTracker,
}

impl UpdateDispatcher {
    pub fn new(cache: Arc<IdempotencyCache>, chain: HandlerChain, max_concurrent: usize) -> Self {
        Self {
            cache,
            chain: Arc::new(chain),
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            tracker: TaskTracker::new(),
        }
    }

    pub fn cache(&self) -> &Arc<IdempotencyCache> {
        &self.cache
    }

    /// Returns as soon as the update is deduplicated and queued; processing happens later.
    pub async fn accept(&self, update: Update) -> AcceptOutcome {
        if let Some(update_id) = update.update_id {
            if self.cache.seen_or_record(update_id).await {
                return AcceptOutcome::Duplicate;
            }
        }

        let kind = update.kind();
        let Some(wire) = update.message else {
            info!(
                update_id = ?update.update_id,
                kind = kind.as_str(),
                "Non-message update received, no action"
            );
            return AcceptOutcome::Logged;
        };

        let message = wire.to_core();
        let chain = self.chain.clone();
        let permits = self.permits.clone();
        let update_id = update.update_id;

        self.tracker.spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                warn!(?update_id, "Dispatcher closed, dropping update");
                return;
            };
            let work = tokio::spawn(async move {
                match chain.handle(&message).await {
                    Ok(response) => debug!(?update_id, ?response, "Update processed"),
                    Err(e) => error!(?update_id, error = %e, "Update processing failed"),
                }
            });
            if let Err(e) = work.await {
                if e.is_panic() {
                    error!(?update_id, "Update handler panicked");
                }
            }
        });

        AcceptOutcome::Dispatched
    }

    /// Number of updates still being processed.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Stops accepting work and waits up to `timeout` for in-flight updates.
    pub async fn shutdown(&self, timeout: Duration) {
        self.tracker.close();
        if tokio::time::timeout(timeout, self.tracker.wait()).await.is_err() {
            warn!(in_flight = self.tracker.len(), "Shutdown timed out with updates in flight");
        } else {
            info!("All in-flight updates finished");
        }
    }

    /// Waits for every update dispatched so far. Intended for tests and one-shot runs.
    pub async fn wait_idle(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }
}
