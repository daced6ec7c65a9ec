use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use crate::config::Settings;
use crate::leaderboard::Period;
use crate::service::SyncService;
use crate::storage::{ScoreStore, SledScoreStore};

/// Full simulated-mode pass: the generator posts demo scores, they surface
/// on the score ticker and the polled leaderboard, presence reconciles
/// local and simulated participants, and shutdown silences all of it.
#[tokio::test]
async fn simulated_mode_end_to_end() {
    let dir = tempfile::tempdir().expect("create tempdir");
    let mut settings = Settings::default();
    settings.simulation.score_min_secs = 0;
    settings.simulation.score_max_secs = 1;
    settings.simulation.demo_game = "snake".to_string();
    settings.leaderboard.poll_secs = 1;
    settings.storage.path = dir.path().join("db").to_string_lossy().into_owned();

    let store = Arc::new(SledScoreStore::from_settings(&settings.storage).expect("open store"));
    let service = SyncService::new(settings, store as Arc<dyn ScoreStore>);
    assert!(!service.is_live());

    // the generator's scores reach the ticker
    let mut scores = service.subscribe_to_scores("snake");
    let first = timeout(Duration::from_secs(5), scores.recv())
        .await
        .expect("a generated score in time")
        .expect("stream open");
    assert_eq!(first.game_id, "snake");

    // and land in the store, so the polled leaderboard reflects them
    let mut leaderboard = service.subscribe_to_leaderboard("snake", Period::AllTime);
    let entries = timeout(Duration::from_secs(3), leaderboard.recv())
        .await
        .expect("a snapshot within the poll interval")
        .expect("stream open");
    assert!(!entries.is_empty());
    for (i, entry) in entries.iter().enumerate() {
        assert_eq!(entry.rank, i + 1);
        if i > 0 {
            assert!(entries[i - 1].score >= entry.score);
        }
    }

    // presence reconciles the local player plus a simulated one
    let identity = service.identity();
    let mut presence = service.track_presence("snake", &identity);
    let roster = presence.recv().await.expect("initial roster");
    assert!(roster.iter().any(|r| r.user_id == identity.id));

    service
        .simulator()
        .expect("simulated mode")
        .simulate_presence_join("snake");
    let grown = timeout(Duration::from_secs(2), async {
        while let Some(roster) = presence.recv().await {
            if roster.len() == 2 {
                return;
            }
        }
        panic!("presence stream closed early");
    })
    .await;
    assert!(grown.is_ok());
    assert_eq!(service.online_count("snake"), 2);

    presence.release();
    assert_eq!(service.online_count("snake"), 1);

    // shutdown releases every channel; the ticker goes quiet for good
    service.shutdown();
    let drained = timeout(Duration::from_secs(2), async {
        while scores.recv().await.is_some() {}
    })
    .await;
    assert!(drained.is_ok());
}
