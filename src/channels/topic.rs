//! Topic keys addressing the logical event streams.
//!
//! Topics are the only addressing mechanism; there is no hierarchical
//! routing. Keys are namespaced by purpose and game id.

use crate::leaderboard::Period;

/// Topic carrying `ScoreEvent`s for a game.
pub fn scores(game_id: &str) -> String {
    format!("scores:{game_id}")
}

/// Topic carrying presence join/leave/sync updates for a game room.
pub fn presence(game_id: &str) -> String {
    format!("presence:{game_id}")
}

/// Topic carrying `GameEvent`s for a game room.
pub fn game(game_id: &str) -> String {
    format!("game:{game_id}")
}

/// Change-notification topic for a (game, period) leaderboard.
pub fn leaderboard(game_id: &str, period: Period) -> String {
    format!("leaderboard:{game_id}:{period}")
}
