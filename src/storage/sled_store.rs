use chrono::Utc;
use sled::{Db, Tree};
use uuid::Uuid;

use crate::config::StorageSettings;
use crate::events::message::ScoreEvent;
use crate::leaderboard::snapshot::{LeaderboardEntry, Period};
use crate::storage::score_store::{Identity, ScoreStore};
use crate::utils::SyncError;

const IDENTITY_KEY: &[u8] = b"__guest_identity";

/// Sled-backed stand-in for the score/identity collaborator.
///
/// Scores live in one tree per game, keyed by big-endian creation timestamp
/// plus the event id so same-millisecond submissions keep distinct keys and
/// iteration order stays chronological. Old entries are cleaned up on read
/// when a TTL is set, and each game's tree can be capped.
#[derive(Clone)]
pub struct SledScoreStore {
    db: Db,
    identity: Identity,
    ttl_seconds: Option<i64>,
    max_scores_per_game: Option<usize>,
}

impl SledScoreStore {
    pub fn new(
        path: &str,
        ttl_seconds: Option<i64>,
        max_scores_per_game: Option<usize>,
    ) -> Result<Self, SyncError> {
        let db = sled::open(path)?;
        let identity = Self::load_or_create_identity(&db)?;
        Ok(Self {
            db,
            identity,
            ttl_seconds,
            max_scores_per_game,
        })
    }

    pub fn from_settings(settings: &StorageSettings) -> Result<Self, SyncError> {
        Self::new(
            &settings.path,
            settings.score_ttl_secs,
            settings.max_scores_per_game,
        )
    }

    /// A guest identity is minted on first open and reused on every later
    /// one, so the same player name follows the player across sessions.
    fn load_or_create_identity(db: &Db) -> Result<Identity, SyncError> {
        if let Some(raw) = db.get(IDENTITY_KEY)? {
            if let Ok(identity) = serde_json::from_slice(&raw) {
                return Ok(identity);
            }
        }
        let tag = Uuid::new_v4().simple().to_string();
        let identity = Identity {
            id: format!("guest-{}", Uuid::new_v4()),
            display_name: format!("Guest-{}", &tag[..4]),
        };
        db.insert(IDENTITY_KEY, serde_json::to_vec(&identity)?)?;
        Ok(identity)
    }

    pub(crate) fn store_event(&self, event: &ScoreEvent) -> Result<(), SyncError> {
        let tree = self.db.open_tree(&event.game_id)?;
        let mut key = Vec::with_capacity(8 + event.id.len());
        key.extend_from_slice(&event.created_at.to_be_bytes());
        key.extend_from_slice(event.id.as_bytes());
        tree.insert(key, serde_json::to_vec(event)?)?;
        self.enforce_cap(&tree)?;
        Ok(())
    }

    fn enforce_cap(&self, tree: &Tree) -> Result<(), SyncError> {
        if let Some(cap) = self.max_scores_per_game {
            while tree.len() > cap {
                match tree.first()? {
                    Some((key, _)) => {
                        tree.remove(key)?;
                    }
                    None => break,
                }
            }
        }
        Ok(())
    }

    fn load_scores(&self, game_id: &str) -> Result<Vec<ScoreEvent>, SyncError> {
        self.cleanup_old_scores(game_id)?;
        let tree = self.db.open_tree(game_id)?;
        Ok(tree
            .iter()
            .filter_map(|res| res.ok())
            .filter_map(|(_, val)| serde_json::from_slice(&val).ok())
            .collect())
    }

    fn cleanup_old_scores(&self, game_id: &str) -> Result<(), SyncError> {
        if let Some(ttl) = self.ttl_seconds {
            let expiry_time = Utc::now().timestamp_millis() - ttl * 1000;

            let tree = self.db.open_tree(game_id)?;
            let old_keys: Vec<_> = tree
                .iter()
                .filter_map(|res| res.ok())
                .filter_map(|(key, _)| {
                    if key.len() >= 8 {
                        let ts = i64::from_be_bytes(key[..8].try_into().unwrap());
                        if ts < expiry_time { Some(key) } else { None }
                    } else {
                        None
                    }
                })
                .collect();

            for key in old_keys {
                let _ = tree.remove(key);
            }
        }
        Ok(())
    }
}

impl ScoreStore for SledScoreStore {
    fn current_identity(&self) -> Identity {
        self.identity.clone()
    }

    fn submit_score(
        &self,
        game_id: &str,
        player_name: &str,
        score: i64,
    ) -> Result<ScoreEvent, SyncError> {
        let event = ScoreEvent::new(game_id, player_name, score);
        self.store_event(&event)?;
        Ok(event)
    }

    fn fetch_leaderboard(
        &self,
        game_id: &str,
        period: Period,
        limit: usize,
    ) -> Result<Vec<LeaderboardEntry>, SyncError> {
        let mut scores = self.load_scores(game_id)?;
        if let Some(cutoff) = period.cutoff_millis(Utc::now().timestamp_millis()) {
            scores.retain(|s| s.created_at >= cutoff);
        }
        // stable sort keeps arrival order within equal scores
        scores.sort_by(|a, b| b.score.cmp(&a.score));
        Ok(scores
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(i, s)| LeaderboardEntry {
                id: s.id,
                player_name: s.player_name,
                score: s.score,
                rank: i + 1,
            })
            .collect())
    }

    fn fetch_recent_scores(
        &self,
        game_id: &str,
        limit: usize,
    ) -> Result<Vec<ScoreEvent>, SyncError> {
        let mut scores = self.load_scores(game_id)?;
        scores.reverse();
        scores.truncate(limit);
        Ok(scores)
    }
}

impl std::fmt::Debug for SledScoreStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SledScoreStore")
            .field("db", &"sled::Db")
            .field("identity", &self.identity)
            .finish()
    }
}
