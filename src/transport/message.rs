use serde::{Deserialize, Serialize};

use crate::events::message::{GameEvent, ScoreEvent};
use crate::leaderboard::Period;
use crate::presence::PresenceRecord;

/// The action carried by a presence notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceAction {
    Join,
    Leave,
    Sync,
}

/// A presence notification: a delta (`record`) or a full-state snapshot
/// (`roster`). Snapshots replace the local view wholesale; deltas merge
/// into it, deduplicated by `user_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceUpdate {
    pub action: PresenceAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<PresenceRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roster: Option<Vec<PresenceRecord>>,
}

/// Everything that can travel over a topic, regardless of transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransportEvent {
    Score(ScoreEvent),
    Presence(PresenceUpdate),
    Game(GameEvent),
    LeaderboardChanged { game_id: String, period: Period },
}

/// Frames sent by this process to the live backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientFrame {
    Auth { api_key: String },
    Subscribe { topic: String },
    Unsubscribe { topic: String },
    Publish { topic: String, event: TransportEvent },
}

/// Frames received from the live backend: an event addressed to a topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerFrame {
    pub topic: String,
    pub event: TransportEvent,
}
