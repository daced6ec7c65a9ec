use std::fmt;

use serde::{Deserialize, Serialize};

/// The time window a leaderboard covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Daily,
    Weekly,
    AllTime,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Daily => "daily",
            Period::Weekly => "weekly",
            Period::AllTime => "all_time",
        }
    }

    /// Oldest `created_at` (millis) still inside this period, relative to
    /// `now_millis`. `None` means no cutoff.
    pub fn cutoff_millis(&self, now_millis: i64) -> Option<i64> {
        match self {
            Period::Daily => Some(now_millis - 24 * 3600 * 1000),
            Period::Weekly => Some(now_millis - 7 * 24 * 3600 * 1000),
            Period::AllTime => None,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of a ranked leaderboard snapshot.
///
/// Ranks are 1-based and strictly increasing while scores never increase;
/// ties keep the arrival order of the underlying query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub id: String,
    pub player_name: String,
    pub score: i64,
    pub rank: usize,
}
