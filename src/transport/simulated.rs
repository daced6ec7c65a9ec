use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::channels::topic;
use crate::config::SimulationSettings;
use crate::presence::{PresenceRecord, PresenceStatus};
use crate::storage::ScoreStore;
use crate::transport::Transport;
use crate::transport::message::{PresenceAction, PresenceUpdate, TransportEvent};

/// Names used to synthesize demo traffic.
const DEMO_PLAYERS: &[&str] = &[
    "NovaFox",
    "PixelPilot",
    "TurboSnail",
    "LuckyLobster",
    "MossyGolem",
    "EchoWisp",
];

/// A locally convincing approximation of the live system, used whenever no
/// backend is configured so the product stays functional and demoable.
///
/// Keeps an in-memory map from topic to the single subscriber channel, plus
/// an ordered presence roster per game. `connect` starts a generator that
/// posts a plausible score for the demo game at pseudo-random intervals.
///
/// The simulator cannot fail in the network sense; misuse such as
/// subscribing before `connect` produces zero events instead of a crash.
pub struct SimulatedTransport {
    inner: Arc<Mutex<SimState>>,
    settings: SimulationSettings,
    store: Arc<dyn ScoreStore>,
}

#[derive(Default)]
struct SimState {
    connected: bool,
    topics: HashMap<String, UnboundedSender<TransportEvent>>,
    presence: HashMap<String, Vec<PresenceRecord>>,
    generator: Option<JoinHandle<()>>,
}

impl SimulatedTransport {
    pub fn new(settings: SimulationSettings, store: Arc<dyn ScoreStore>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SimState::default())),
            settings,
            store,
        }
    }

    /// Immediately and synchronously hands `event` to the topic's subscriber
    /// channel. No queuing, no backpressure; subscriber counts are small and
    /// receivers drain on the event loop.
    pub fn broadcast(&self, topic: &str, event: TransportEvent) {
        Self::broadcast_on(&self.inner, topic, event);
    }

    fn broadcast_on(inner: &Arc<Mutex<SimState>>, topic: &str, event: TransportEvent) {
        let mut state = inner.lock().unwrap();
        let dead = match state.topics.get(topic) {
            Some(sender) => sender.send(event).is_err(),
            None => false,
        };
        if dead {
            state.topics.remove(topic);
        }
    }

    /// Synthesize a participant joining `game_id`, mutate the roster, and
    /// notify `presence:<game_id>` subscribers with the full updated list.
    pub fn simulate_presence_join(&self, game_id: &str) -> PresenceRecord {
        let suffix = Uuid::new_v4().simple().to_string();
        let status = if rand::rng().random_bool(0.5) {
            PresenceStatus::Playing
        } else {
            PresenceStatus::Online
        };
        let record = PresenceRecord {
            user_id: format!("sim-{}", &suffix[..8]),
            username: DEMO_PLAYERS[rand::rng().random_range(0..DEMO_PLAYERS.len())].to_string(),
            game_id: game_id.to_string(),
            status,
            joined_at: Utc::now().timestamp_millis(),
        };
        self.apply_join(record.clone());
        record
    }

    /// Remove one synthesized participant from `game_id` (if any) and notify
    /// subscribers with the full updated list.
    pub fn simulate_presence_leave(&self, game_id: &str) -> Option<PresenceRecord> {
        let record = {
            let state = self.inner.lock().unwrap();
            let roster = state.presence.get(game_id)?;
            let simulated: Vec<&PresenceRecord> = roster
                .iter()
                .filter(|r| r.user_id.starts_with("sim-"))
                .collect();
            if simulated.is_empty() {
                return None;
            }
            simulated[rand::rng().random_range(0..simulated.len())].clone()
        };
        self.apply_leave(&record);
        Some(record)
    }

    /// The current roster for a game, as the simulator sees it.
    pub fn presence_roster(&self, game_id: &str) -> Vec<PresenceRecord> {
        let state = self.inner.lock().unwrap();
        state.presence.get(game_id).cloned().unwrap_or_default()
    }

    /// Whether a subscriber channel is currently open for `topic`.
    pub fn has_topic(&self, topic: &str) -> bool {
        self.inner.lock().unwrap().topics.contains_key(topic)
    }

    fn apply_join(&self, record: PresenceRecord) {
        let topic = topic::presence(&record.game_id);
        let roster = {
            let mut state = self.inner.lock().unwrap();
            let roster = state.presence.entry(record.game_id.clone()).or_default();
            // duplicate joins from the same user must not double-count
            if !roster.iter().any(|r| r.user_id == record.user_id) {
                roster.push(record.clone());
            }
            roster.clone()
        };
        Self::broadcast_on(
            &self.inner,
            &topic,
            TransportEvent::Presence(PresenceUpdate {
                action: PresenceAction::Join,
                record: Some(record),
                roster: Some(roster),
            }),
        );
    }

    fn apply_leave(&self, record: &PresenceRecord) {
        let topic = topic::presence(&record.game_id);
        let roster = {
            let mut state = self.inner.lock().unwrap();
            let roster = state.presence.entry(record.game_id.clone()).or_default();
            roster.retain(|r| r.user_id != record.user_id);
            roster.clone()
        };
        Self::broadcast_on(
            &self.inner,
            &topic,
            TransportEvent::Presence(PresenceUpdate {
                action: PresenceAction::Leave,
                record: Some(record.clone()),
                roster: Some(roster),
            }),
        );
    }
}

impl Transport for SimulatedTransport {
    fn connect(&self) {
        let mut state = self.inner.lock().unwrap();
        if state.connected {
            return;
        }
        state.connected = true;

        let inner = Arc::clone(&self.inner);
        let store = Arc::clone(&self.store);
        let settings = self.settings.clone();
        state.generator = Some(tokio::spawn(async move {
            loop {
                let secs = rand::rng()
                    .random_range(settings.score_min_secs..=settings.score_max_secs.max(settings.score_min_secs));
                tokio::time::sleep(Duration::from_secs(secs)).await;

                let player = DEMO_PLAYERS[rand::rng().random_range(0..DEMO_PLAYERS.len())];
                let score = rand::rng().random_range(1..=100) * 50;
                let event = match store.submit_score(&settings.demo_game, player, score) {
                    Ok(event) => event,
                    Err(e) => {
                        warn!("demo score submission failed: {e}");
                        continue;
                    }
                };
                debug!(
                    game = %settings.demo_game,
                    player = %event.player_name,
                    points = event.score,
                    "synthesized demo score"
                );
                Self::broadcast_on(
                    &inner,
                    &topic::scores(&settings.demo_game),
                    TransportEvent::Score(event),
                );
            }
        }));
        info!("simulated transport connected");
    }

    fn disconnect(&self) {
        let mut state = self.inner.lock().unwrap();
        if let Some(generator) = state.generator.take() {
            generator.abort();
        }
        state.topics.clear();
        state.presence.clear();
        state.connected = false;
    }

    fn publish(&self, topic: &str, event: TransportEvent) {
        if !self.inner.lock().unwrap().connected {
            warn!(topic, "publish before connect ignored");
            return;
        }
        // Presence publishes mutate the shared roster this process owns and
        // come back to subscribers as a full-roster notification.
        if let TransportEvent::Presence(update) = &event {
            if let Some(record) = &update.record {
                match update.action {
                    PresenceAction::Join => self.apply_join(record.clone()),
                    PresenceAction::Leave => self.apply_leave(record),
                    PresenceAction::Sync => {}
                }
                return;
            }
        }
        self.broadcast(topic, event);
    }

    fn subscribe(&self, topic: &str) -> UnboundedReceiver<TransportEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.inner.lock().unwrap();
        if !state.connected {
            warn!(topic, "subscribe before connect yields no events");
            return rx;
        }
        state.topics.insert(topic.to_string(), tx);
        rx
    }

    fn unsubscribe(&self, topic: &str) {
        self.inner.lock().unwrap().topics.remove(topic);
    }
}
