//! In-memory dedup of webhook deliveries.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Remembers update ids for `window`. Check-and-record is atomic under one mutex; a background
/// sweeper prunes expired ids so memory stays bounded.
pub struct IdempotencyCache {
    window: Duration,
    entries: Mutex<HashMap<i64, Instant>>,
}

impl IdempotencyCache {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Returns true if `update_id` was recorded within the window; otherwise records it now and
    /// returns false.
    pub async fn seen_or_record(&self, update_id: i64) -> bool {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        match entries.get(&update_id) {
            Some(seen_at) if now.duration_since(*seen_at) <= self.window => {
                info!(update_id, "Duplicate update within idempotency window, ignoring");
                true
            }
            _ => {
                entries.insert(update_id, now);
                debug!(update_id, "Recorded update id");
                false
            }
        }
    }

    /// Drops every entry older than the window; returns how many were removed.
    pub async fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, seen_at| now.duration_since(*seen_at) <= self.window);
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Runs [`IdempotencyCache::sweep`] every `period` until `cancel` fires.
    pub fn spawn_sweeper(self: Arc<Self>, period: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(period_secs = period.as_secs(), "Idempotency cache sweeper started");
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let removed = self.sweep().await;
                        if removed > 0 {
                            debug!(removed, "Swept expired update ids");
                        }
                    }
                }
            }
            info!("Idempotency cache sweeper stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(60);

    /// **Test: Checking the same id twice inside the window returns (false, true).**
    #[tokio::test(start_paused = true)]
    async fn test_duplicate_within_window() {
        let cache = IdempotencyCache::new(WINDOW);
        assert!(!cache.seen_or_record(42).await);
        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(cache.seen_or_record(42).await);
        assert!(!cache.seen_or_record(43).await);
    }

    /// **Test: An entry older than the window counts as new even before the sweeper removes it.**
    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_new_again() {
        let cache = IdempotencyCache::new(WINDOW);
        assert!(!cache.seen_or_record(7).await);
        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(!cache.seen_or_record(7).await);
        assert!(cache.seen_or_record(7).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_removes_only_expired() {
        let cache = IdempotencyCache::new(WINDOW);
        cache.seen_or_record(1).await;
        tokio::time::advance(Duration::from_secs(40)).await;
        cache.seen_or_record(2).await;
        tokio::time::advance(Duration::from_secs(30)).await;

        assert_eq!(cache.sweep().await, 1);
        assert_eq!(cache.len().await, 1);
        assert!(cache.seen_or_record(2).await);
    }

    /// **Test: With the sweeper running, an entry is gone after window + sweep period.**
    ///
    /// **Setup:** Paused clock, sweeper every 30s, one id recorded at t=0.
    /// **Action:** Sleep past t = 60s + 30s.
    /// **Expected:** The cache is empty without anyone calling `sweep` directly.
    #[tokio::test(start_paused = true)]
    async fn test_background_sweeper_prunes() {
        let cache = Arc::new(IdempotencyCache::new(WINDOW));
        let cancel = CancellationToken::new();
        let sweeper = cache.clone().spawn_sweeper(WINDOW / 2, cancel.clone());

        cache.seen_or_record(99).await;
        tokio::time::sleep(WINDOW + WINDOW / 2 + Duration::from_secs(1)).await;

        assert!(cache.is_empty().await);
        cancel.cancel();
        sweeper.await.unwrap();
    }
}
