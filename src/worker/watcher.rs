use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::time::{sleep, Duration};

use crate::error::AppError;
use crate::models::ConnectionStatus;
use crate::store::{ArticleRepository, ChangeCursor, ChangeFeed, StoreClient};

use super::monitor::ConnectionMonitor;
use super::protocol::Event;

/// Restart delay after a change-feed fault. Deliberately a separate,
/// fixed policy from the monitor's linear reconnect backoff; the two
/// also keep separate counters.
pub const RESUBSCRIBE_DELAY: Duration = Duration::from_millis(5000);

/// Watches the store for row changes and pushes stats/badge updates to
/// whoever is listening. Also acts as the outer scheduler that nudges a
/// Failed monitor back into a check on every tick.
pub struct ChangeWatcher {
    feed: ChangeFeed,
    repo: ArticleRepository,
    monitor: Arc<ConnectionMonitor<StoreClient>>,
    events: broadcast::Sender<Event>,
    poll_interval: Duration,
    resubscribes: u32,
}

impl ChangeWatcher {
    pub fn new(
        store: StoreClient,
        repo: ArticleRepository,
        monitor: Arc<ConnectionMonitor<StoreClient>>,
        events: broadcast::Sender<Event>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            feed: ChangeFeed::new(store),
            repo,
            monitor,
            events,
            poll_interval,
            resubscribes: 0,
        }
    }

    pub async fn run(mut self) {
        loop {
            self.tick().await;
            sleep(self.poll_interval).await;
        }
    }

    async fn tick(&mut self) {
        // The retry loop never reschedules itself past max_retries;
        // the poll tick is what eventually re-probes a dead backend.
        if self.monitor.status() == ConnectionStatus::Failed
            && self.monitor.check_connection().await != ConnectionStatus::Connected
        {
            return;
        }

        match self.feed.poll().await {
            Ok(Some(ChangeCursor { total, latest })) => {
                tracing::debug!("store changed ({total} rows, latest write {latest:?})");
                self.publish_stats().await;
            }
            Ok(None) => {}
            Err(e) => self.handle_fault(e).await,
        }
    }

    /// Subscription fault: same as a failed connection check from the
    /// monitor's point of view, but restarted on this watcher's own
    /// fixed delay rather than the monitor's backoff.
    async fn handle_fault(&mut self, error: AppError) {
        self.resubscribes += 1;
        tracing::error!("change feed fault (restart {}): {error}", self.resubscribes);
        self.monitor.mark_fault(error.to_string());

        sleep(RESUBSCRIBE_DELAY).await;
        self.feed.reset();
        self.monitor.check_connection().await;
    }

    async fn publish_stats(&self) {
        match self.repo.stats().await {
            Ok(stats) => {
                let _ = self.events.send(Event::StatsUpdate { stats });
            }
            Err(e) => tracing::warn!("failed to compute stats: {e}"),
        }
    }
}

/// Badge text for the article count: the number, or empty at zero so
/// the badge disappears.
pub fn badge_text(total: u64) -> String {
    if total == 0 {
        String::new()
    } else {
        total.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn badge_is_empty_at_zero() {
        assert_eq!(badge_text(0), "");
        assert_eq!(badge_text(1), "1");
        assert_eq!(badge_text(42), "42");
    }

    #[test]
    fn resubscribe_policy_is_fixed_at_five_seconds() {
        // Not a backoff: the restart delay is constant regardless of
        // how many faults have been seen.
        assert_eq!(RESUBSCRIBE_DELAY, Duration::from_millis(5000));
    }
}
