//! The `leaderboard` module recomputes top-N ranking views for
//! (game, period) pairs and delivers them to subscribers, driven by push
//! notifications in live mode and by polling in simulated mode.

pub mod snapshot;
pub mod sync;

pub use snapshot::{LeaderboardEntry, Period};
pub use sync::{LeaderboardSubscription, LeaderboardSync};
