use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::debug;

use crate::channels::{ChannelRegistry, SubscriptionHandle, topic};
use crate::presence::record::{PresenceRecord, PresenceStatus};
use crate::storage::Identity;
use crate::transport::Transport;
use crate::transport::message::{PresenceAction, PresenceUpdate, TransportEvent};

/// Tracking lifecycle of a single game room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackState {
    /// No local tracking.
    Idle,
    /// Track issued, awaiting the first reconciled update.
    Joining,
    /// Synced at least once.
    Tracked,
}

struct GamePresence {
    state: TrackState,
    roster: Vec<PresenceRecord>,
    trackers: usize,
}

impl GamePresence {
    fn new() -> Self {
        Self {
            state: TrackState::Idle,
            roster: Vec::new(),
            trackers: 0,
        }
    }

    /// Fold one notification into the local view. A full roster replaces it
    /// wholesale (last snapshot wins); deltas merge, deduplicated by
    /// `user_id`.
    fn apply(&mut self, update: PresenceUpdate) {
        if let Some(roster) = update.roster {
            self.roster = roster;
            return;
        }
        match update.action {
            PresenceAction::Join => {
                if let Some(record) = update.record {
                    if !self.roster.iter().any(|r| r.user_id == record.user_id) {
                        self.roster.push(record);
                    }
                }
            }
            PresenceAction::Leave => {
                if let Some(record) = update.record {
                    self.roster.retain(|r| r.user_id != record.user_id);
                }
            }
            PresenceAction::Sync => {}
        }
    }
}

/// Maintains the set of active participants per game room on top of the
/// channel registry.
///
/// The per-game roster is a local view reconciled from join/leave deltas
/// and full-state snapshots; out-of-order stale snapshots are tolerated
/// because a fresher one eventually replaces them.
pub struct PresenceTracker {
    registry: Arc<ChannelRegistry>,
    transport: Arc<dyn Transport>,
    games: Arc<Mutex<HashMap<String, GamePresence>>>,
}

impl PresenceTracker {
    pub fn new(registry: Arc<ChannelRegistry>, transport: Arc<dyn Transport>) -> Self {
        Self {
            registry,
            transport,
            games: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Register `identity` as present in `game_id` and start receiving
    /// reconciled roster snapshots.
    ///
    /// The returned subscription's `release` removes the record from the
    /// shared view and unsubscribes; it is idempotent, and dropping the
    /// subscription releases too.
    pub fn track(&self, game_id: &str, identity: &Identity) -> PresenceSubscription {
        let record = PresenceRecord {
            user_id: identity.id.clone(),
            username: identity.display_name.clone(),
            game_id: game_id.to_string(),
            status: PresenceStatus::Online,
            joined_at: Utc::now().timestamp_millis(),
        };
        let presence_topic = topic::presence(game_id);

        let subscription = self.registry.subscribe(&presence_topic);
        let channel = subscription.handle();

        let initial = {
            let mut games = self.games.lock().unwrap();
            let entry = games
                .entry(game_id.to_string())
                .or_insert_with(GamePresence::new);
            entry.trackers += 1;
            if entry.state == TrackState::Idle {
                entry.state = TrackState::Joining;
            }
            if !entry.roster.iter().any(|r| r.user_id == record.user_id) {
                entry.roster.push(record.clone());
            }
            entry.roster.clone()
        };

        self.transport.publish(
            &presence_topic,
            TransportEvent::Presence(PresenceUpdate {
                action: PresenceAction::Join,
                record: Some(record.clone()),
                roster: None,
            }),
        );

        let (out_tx, out_rx) = mpsc::unbounded_channel();
        // the caller sees its own join without waiting for the echo
        let _ = out_tx.send(initial);

        let games = Arc::clone(&self.games);
        let game = game_id.to_string();
        let mut incoming = subscription;
        tokio::spawn(async move {
            while let Some(event) = incoming.recv().await {
                let TransportEvent::Presence(update) = event else {
                    continue;
                };
                let roster = {
                    let mut games = games.lock().unwrap();
                    let Some(entry) = games.get_mut(&game) else {
                        break;
                    };
                    entry.apply(update);
                    entry.state = TrackState::Tracked;
                    entry.roster.clone()
                };
                if out_tx.send(roster).is_err() {
                    break;
                }
            }
            debug!(%game, "presence reconciliation ended");
        });

        PresenceSubscription {
            record,
            topic: presence_topic,
            transport: Arc::clone(&self.transport),
            games: Arc::clone(&self.games),
            channel,
            receiver: out_rx,
            released: AtomicBool::new(false),
        }
    }

    /// The current reconciled participant list for `game_id`.
    pub fn snapshot(&self, game_id: &str) -> Vec<PresenceRecord> {
        self.games
            .lock()
            .unwrap()
            .get(game_id)
            .map(|g| g.roster.clone())
            .unwrap_or_default()
    }

    /// Number of distinct users present in `game_id`. Duplicate joins from
    /// the same user never double-count.
    pub fn online_count(&self, game_id: &str) -> usize {
        self.games
            .lock()
            .unwrap()
            .get(game_id)
            .map(|g| {
                g.roster
                    .iter()
                    .map(|r| r.user_id.as_str())
                    .collect::<HashSet<_>>()
                    .len()
            })
            .unwrap_or(0)
    }

    pub fn state(&self, game_id: &str) -> TrackState {
        self.games
            .lock()
            .unwrap()
            .get(game_id)
            .map(|g| g.state)
            .unwrap_or(TrackState::Idle)
    }
}

/// A live presence registration: yields the reconciled roster after every
/// change, and removes its record from the shared view on release.
pub struct PresenceSubscription {
    record: PresenceRecord,
    topic: String,
    transport: Arc<dyn Transport>,
    games: Arc<Mutex<HashMap<String, GamePresence>>>,
    channel: Arc<SubscriptionHandle>,
    receiver: UnboundedReceiver<Vec<PresenceRecord>>,
    released: AtomicBool,
}

impl PresenceSubscription {
    /// The next reconciled roster. `None` once released.
    pub async fn recv(&mut self) -> Option<Vec<PresenceRecord>> {
        self.receiver.recv().await
    }

    /// Non-blocking variant of `recv`.
    pub fn try_recv(&mut self) -> Option<Vec<PresenceRecord>> {
        self.receiver.try_recv().ok()
    }

    /// The record this subscription registered.
    pub fn record(&self) -> &PresenceRecord {
        &self.record
    }

    /// Remove the registered record from the shared view and unsubscribe.
    /// Idempotent: a second call neither throws nor decrements again.
    pub fn release(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }
        self.channel.cancel();
        {
            let mut games = self.games.lock().unwrap();
            if let Some(entry) = games.get_mut(&self.record.game_id) {
                entry.roster.retain(|r| r.user_id != self.record.user_id);
                entry.trackers = entry.trackers.saturating_sub(1);
                if entry.trackers == 0 {
                    entry.state = TrackState::Idle;
                }
            }
        }
        self.transport.publish(
            &self.topic,
            TransportEvent::Presence(PresenceUpdate {
                action: PresenceAction::Leave,
                record: Some(self.record.clone()),
                roster: None,
            }),
        );
    }
}

impl Drop for PresenceSubscription {
    fn drop(&mut self) {
        self.release();
    }
}
