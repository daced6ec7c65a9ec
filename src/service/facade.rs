use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::info;

use crate::channels::{ChannelRegistry, Subscription, topic};
use crate::config::Settings;
use crate::events::broadcaster::{EventBroadcaster, GameEventSubscription};
use crate::events::message::{GameEvent, ScoreEvent};
use crate::leaderboard::snapshot::Period;
use crate::leaderboard::sync::{LeaderboardSubscription, LeaderboardSync};
use crate::presence::record::PresenceRecord;
use crate::presence::tracker::{PresenceSubscription, PresenceTracker};
use crate::storage::{Identity, ScoreStore};
use crate::transport::{LiveTransport, SimulatedTransport, Transport, TransportEvent};
use crate::utils::SyncError;

/// The single entry point the rest of the site depends on.
///
/// Owns the choice of live vs simulated transport, made once at
/// construction from the configuration predicate, and the lifetime of
/// every channel it creates. Construct one per process and pass it by
/// reference; `shutdown` releases all channels and the transport.
///
/// Must be created inside a Tokio runtime, since the transport and the
/// channel fan-out run as background tasks.
pub struct SyncService {
    settings: Settings,
    transport: Arc<dyn Transport>,
    simulator: Option<Arc<SimulatedTransport>>,
    registry: Arc<ChannelRegistry>,
    presence: PresenceTracker,
    broadcaster: EventBroadcaster,
    leaderboard: LeaderboardSync,
    store: Arc<dyn ScoreStore>,
    shut_down: AtomicBool,
}

impl SyncService {
    pub fn new(settings: Settings, store: Arc<dyn ScoreStore>) -> Self {
        let live = settings.live_configured();
        let (transport, simulator): (Arc<dyn Transport>, Option<Arc<SimulatedTransport>>) =
            if live {
                info!(endpoint = %settings.realtime.endpoint, "using live transport");
                (
                    Arc::new(LiveTransport::new(
                        &settings.realtime.endpoint,
                        &settings.realtime.api_key,
                    )),
                    None,
                )
            } else {
                info!("live backend not configured, using simulated transport");
                let simulator = Arc::new(SimulatedTransport::new(
                    settings.simulation.clone(),
                    Arc::clone(&store),
                ));
                (
                    Arc::clone(&simulator) as Arc<dyn Transport>,
                    Some(simulator),
                )
            };
        transport.connect();

        let registry = ChannelRegistry::new(Arc::clone(&transport));
        let presence = PresenceTracker::new(Arc::clone(&registry), Arc::clone(&transport));
        let broadcaster = EventBroadcaster::new(Arc::clone(&registry), Arc::clone(&transport));
        let leaderboard = LeaderboardSync::new(
            Arc::clone(&registry),
            Arc::clone(&store),
            live,
            &settings.leaderboard,
        );

        Self {
            settings,
            transport,
            simulator,
            registry,
            presence,
            broadcaster,
            leaderboard,
            store,
            shut_down: AtomicBool::new(false),
        }
    }

    /// Whether the live transport was selected at construction.
    pub fn is_live(&self) -> bool {
        self.simulator.is_none()
    }

    /// The simulated transport, when it was selected; carries the demo-only
    /// presence hooks.
    pub fn simulator(&self) -> Option<&Arc<SimulatedTransport>> {
        self.simulator.as_ref()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The guest-or-user identity from the storage collaborator.
    pub fn identity(&self) -> Identity {
        self.store.current_identity()
    }

    /// Live `ScoreEvent` stream for `game_id`.
    pub fn subscribe_to_scores(&self, game_id: &str) -> ScoreSubscription {
        ScoreSubscription {
            inner: self.registry.subscribe(&topic::scores(game_id)),
        }
    }

    /// Ranked snapshot stream for (`game_id`, `period`).
    pub fn subscribe_to_leaderboard(
        &self,
        game_id: &str,
        period: Period,
    ) -> LeaderboardSubscription {
        self.leaderboard.subscribe(game_id, period)
    }

    /// Register `identity` as present in `game_id` and stream the
    /// reconciled roster.
    pub fn track_presence(&self, game_id: &str, identity: &Identity) -> PresenceSubscription {
        self.presence.track(game_id, identity)
    }

    /// The current reconciled participant list for `game_id`.
    pub fn presence_snapshot(&self, game_id: &str) -> Vec<PresenceRecord> {
        self.presence.snapshot(game_id)
    }

    /// Number of distinct users present in `game_id`.
    pub fn online_count(&self, game_id: &str) -> usize {
        self.presence.online_count(game_id)
    }

    /// Fire-and-forget publish of a game event.
    pub fn broadcast_game_event(&self, event: GameEvent) {
        self.broadcaster.broadcast(event);
    }

    /// Raw `GameEvent` stream for `game_id`.
    pub fn subscribe_to_game_events(&self, game_id: &str) -> GameEventSubscription {
        self.broadcaster.subscribe(game_id)
    }

    /// Most recent scores for `game_id`, newest first, from the storage
    /// collaborator.
    pub fn recent_scores(&self, game_id: &str, limit: usize) -> Result<Vec<ScoreEvent>, SyncError> {
        self.store.fetch_recent_scores(game_id, limit)
    }

    /// Release every channel and disconnect the transport. Idempotent.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }
        self.registry.clear();
        self.transport.disconnect();
        info!("sync service shut down");
    }
}

impl Drop for SyncService {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// A cancellable stream of `ScoreEvent`s for one game.
pub struct ScoreSubscription {
    inner: Subscription,
}

impl ScoreSubscription {
    /// The next score posted for the game; payloads of other kinds on the
    /// topic are skipped. `None` once cancelled.
    pub async fn recv(&mut self) -> Option<ScoreEvent> {
        while let Some(event) = self.inner.recv().await {
            if let TransportEvent::Score(score) = event {
                return Some(score);
            }
        }
        None
    }

    /// Non-blocking variant of `recv`.
    pub fn try_recv(&mut self) -> Option<ScoreEvent> {
        while let Some(event) = self.inner.try_recv() {
            if let TransportEvent::Score(score) = event {
                return Some(score);
            }
        }
        None
    }

    /// Idempotent; dropping the subscription cancels too.
    pub fn cancel(&self) {
        self.inner.cancel();
    }
}
