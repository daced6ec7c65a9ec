use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::channels::{ChannelRegistry, SubscriptionHandle, topic};
use crate::config::LeaderboardSettings;
use crate::leaderboard::snapshot::{LeaderboardEntry, Period};
use crate::storage::ScoreStore;

/// Delivers top-N ranking views for (game, period) pairs.
///
/// In live mode a change notification on the leaderboard topic triggers a
/// re-fetch of the authoritative ranked list. In simulated mode no push
/// notifications exist, so the store is polled on a fixed interval and the
/// result delivered unconditionally; deliveries are a refresh signal, not
/// a diff.
pub struct LeaderboardSync {
    registry: Arc<ChannelRegistry>,
    store: Arc<dyn ScoreStore>,
    live: bool,
    poll: Duration,
    limit: usize,
}

impl LeaderboardSync {
    pub fn new(
        registry: Arc<ChannelRegistry>,
        store: Arc<dyn ScoreStore>,
        live: bool,
        settings: &LeaderboardSettings,
    ) -> Self {
        Self {
            registry,
            store,
            live,
            poll: Duration::from_secs(settings.poll_secs.max(1)),
            limit: settings.limit,
        }
    }

    /// Start delivering ranked snapshots for (`game_id`, `period`).
    ///
    /// The returned subscription's cancel function is the only way to stop
    /// the underlying timer or channel; dropping the subscription cancels
    /// as well, so nothing leaks when a widget unmounts without cleanup.
    pub fn subscribe(&self, game_id: &str, period: Period) -> LeaderboardSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let store = Arc::clone(&self.store);
        let game = game_id.to_string();
        let limit = self.limit;

        let canceller = if self.live {
            let mut notifications = self.registry.subscribe(&topic::leaderboard(game_id, period));
            let channel = notifications.handle();
            tokio::spawn(async move {
                while let Some(_notification) = notifications.recv().await {
                    if !deliver(&store, &game, period, limit, &tx) {
                        break;
                    }
                }
                debug!(%game, "leaderboard notifications ended");
            });
            Canceller::Channel(channel)
        } else {
            let poll = self.poll;
            Canceller::Poll(tokio::spawn(async move {
                let mut ticker = tokio::time::interval(poll);
                loop {
                    ticker.tick().await;
                    if !deliver(&store, &game, period, limit, &tx) {
                        break;
                    }
                }
                debug!(%game, "leaderboard polling ended");
            }))
        };

        LeaderboardSubscription {
            receiver: rx,
            canceller,
            cancelled: AtomicBool::new(false),
        }
    }
}

/// Fetch the ranked list and push it to the subscriber. Returns false once
/// the subscriber is gone; fetch errors are logged and skipped.
fn deliver(
    store: &Arc<dyn ScoreStore>,
    game_id: &str,
    period: Period,
    limit: usize,
    tx: &UnboundedSender<Vec<LeaderboardEntry>>,
) -> bool {
    match store.fetch_leaderboard(game_id, period, limit) {
        Ok(entries) => tx.send(entries).is_ok(),
        Err(e) => {
            warn!(game_id, "leaderboard fetch failed: {e}");
            !tx.is_closed()
        }
    }
}

enum Canceller {
    Poll(JoinHandle<()>),
    Channel(Arc<SubscriptionHandle>),
}

/// A cancellable stream of ranked snapshots for one (game, period) pair.
pub struct LeaderboardSubscription {
    receiver: UnboundedReceiver<Vec<LeaderboardEntry>>,
    canceller: Canceller,
    cancelled: AtomicBool,
}

impl LeaderboardSubscription {
    /// The next ranked snapshot. Treat each delivery as a refresh signal;
    /// simulated mode re-delivers even when nothing changed.
    pub async fn recv(&mut self) -> Option<Vec<LeaderboardEntry>> {
        self.receiver.recv().await
    }

    /// Non-blocking variant of `recv`.
    pub fn try_recv(&mut self) -> Option<Vec<LeaderboardEntry>> {
        self.receiver.try_recv().ok()
    }

    /// Stop the interval timer (simulated) or release the notification
    /// channel (live). Idempotent.
    pub fn cancel(&self) {
        if self.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }
        match &self.canceller {
            Canceller::Poll(task) => task.abort(),
            Canceller::Channel(channel) => channel.cancel(),
        }
    }
}

impl Drop for LeaderboardSubscription {
    fn drop(&mut self) {
        self.cancel();
    }
}
