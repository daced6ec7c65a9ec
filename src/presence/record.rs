use serde::{Deserialize, Serialize};

/// What a participant is currently doing in a game room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    Online,
    Playing,
    Idle,
}

/// One participant's entry in a game room's shared presence view.
///
/// The tracker holds a local view reconciled from join/leave/sync
/// notifications; the source of truth is the backend (or, in simulation,
/// this process itself).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceRecord {
    pub user_id: String,
    pub username: String,
    pub game_id: String,
    pub status: PresenceStatus,
    pub joined_at: i64,
}
