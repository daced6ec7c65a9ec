use serde::{Deserialize, Serialize};

use crate::events::message::ScoreEvent;
use crate::leaderboard::snapshot::{LeaderboardEntry, Period};
use crate::utils::SyncError;

/// Who the current player is: a signed-in user or a generated guest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub display_name: String,
}

/// The narrow boundary to the score/identity collaborator.
///
/// The sync layer consumes this interface and never reaches past it:
/// ranking is computed behind `fetch_leaderboard`, identity management
/// behind `current_identity`. `SledScoreStore` is the local stand-in; a
/// real deployment substitutes its own implementation.
pub trait ScoreStore: Send + Sync {
    /// The guest-or-user identity for this session.
    fn current_identity(&self) -> Identity;

    /// Record a score and return the resulting event.
    fn submit_score(
        &self,
        game_id: &str,
        player_name: &str,
        score: i64,
    ) -> Result<ScoreEvent, SyncError>;

    /// The ranked top-`limit` list for (`game_id`, `period`): 1-based ranks,
    /// non-increasing scores, ties stable by arrival order.
    fn fetch_leaderboard(
        &self,
        game_id: &str,
        period: Period,
        limit: usize,
    ) -> Result<Vec<LeaderboardEntry>, SyncError>;

    /// The most recent scores for `game_id`, newest first.
    fn fetch_recent_scores(
        &self,
        game_id: &str,
        limit: usize,
    ) -> Result<Vec<ScoreEvent>, SyncError>;
}
