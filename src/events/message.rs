use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A score posted for a game, as observed by the sync layer.
///
/// Produced by score submission and never mutated afterwards.
///
/// # Fields
///
/// - `id` - Unique identifier of the submission.
/// - `game_id` - The game the score belongs to.
/// - `player_name` - Display name of the player who posted it.
/// - `score` - The points achieved.
/// - `created_at` - Unix timestamp in milliseconds of the submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEvent {
    pub id: String,
    pub game_id: String,
    pub player_name: String,
    pub score: i64,
    pub created_at: i64,
}

impl ScoreEvent {
    pub fn new(game_id: &str, player_name: &str, score: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            game_id: game_id.to_string(),
            player_name: player_name.to_string(),
            score,
            created_at: Utc::now().timestamp_millis(),
        }
    }
}

/// The kinds of game events carried on `game:<gameId>` topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameEventKind {
    ScoreUpdate,
    PlayerJoined,
    PlayerLeft,
    GameStarted,
    GameEnded,
}

/// A transient event describing something that happened in a game room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    pub kind: GameEventKind,
    pub game_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_name: Option<String>,
    #[serde(default)]
    pub data: serde_json::Value,
    pub timestamp: i64,
}

impl GameEvent {
    pub fn new(kind: GameEventKind, game_id: &str) -> Self {
        Self {
            kind,
            game_id: game_id.to_string(),
            player_name: None,
            data: serde_json::Value::Null,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    pub fn started(game_id: &str) -> Self {
        Self::new(GameEventKind::GameStarted, game_id)
    }

    pub fn ended(game_id: &str) -> Self {
        Self::new(GameEventKind::GameEnded, game_id)
    }

    pub fn player_joined(game_id: &str, player_name: &str) -> Self {
        let mut event = Self::new(GameEventKind::PlayerJoined, game_id);
        event.player_name = Some(player_name.to_string());
        event
    }

    pub fn player_left(game_id: &str, player_name: &str) -> Self {
        let mut event = Self::new(GameEventKind::PlayerLeft, game_id);
        event.player_name = Some(player_name.to_string());
        event
    }

    pub fn score_update(game_id: &str, player_name: &str, score: i64) -> Self {
        let mut event = Self::new(GameEventKind::ScoreUpdate, game_id);
        event.player_name = Some(player_name.to_string());
        event.data = serde_json::json!({ "score": score });
        event
    }
}
