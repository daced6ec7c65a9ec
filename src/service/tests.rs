use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use super::facade::SyncService;
use crate::channels::topic;
use crate::config::Settings;
use crate::events::{GameEvent, GameEventKind, ScoreEvent};
use crate::leaderboard::Period;
use crate::storage::{ScoreStore, SledScoreStore};
use crate::transport::TransportEvent;

fn quiet_settings(dir: &tempfile::TempDir) -> Settings {
    let mut settings = Settings::default();
    // generator interval far beyond any test timeout
    settings.simulation.score_min_secs = 600;
    settings.simulation.score_max_secs = 900;
    settings.leaderboard.poll_secs = 1;
    settings.storage.path = dir.path().join("db").to_string_lossy().into_owned();
    settings
}

fn test_service() -> (tempfile::TempDir, Arc<SledScoreStore>, SyncService) {
    let dir = tempfile::tempdir().expect("create tempdir");
    let settings = quiet_settings(&dir);
    let store = Arc::new(SledScoreStore::from_settings(&settings.storage).expect("open store"));
    let service = SyncService::new(settings, Arc::clone(&store) as Arc<dyn ScoreStore>);
    (dir, store, service)
}

#[tokio::test]
async fn selects_the_simulator_when_no_backend_is_configured() {
    let (_dir, _store, service) = test_service();
    assert!(!service.is_live());
    assert!(service.simulator().is_some());
}

#[tokio::test]
async fn selects_the_live_transport_when_configured() {
    let dir = tempfile::tempdir().expect("create tempdir");
    let mut settings = quiet_settings(&dir);
    settings.realtime.endpoint = "ws://127.0.0.1:9/socket".to_string();
    settings.realtime.api_key = "srv-1234".to_string();
    let store = Arc::new(SledScoreStore::from_settings(&settings.storage).expect("open store"));

    let service = SyncService::new(settings, store as Arc<dyn ScoreStore>);
    assert!(service.is_live());
    assert!(service.simulator().is_none());
    service.shutdown();
}

#[tokio::test]
async fn score_subscribers_see_their_game_only() {
    let (_dir, _store, service) = test_service();
    let mut scores = service.subscribe_to_scores("snake");

    let simulator = service.simulator().expect("simulated mode");
    simulator.broadcast(
        &topic::scores("tetris"),
        TransportEvent::Score(ScoreEvent::new("tetris", "Bo", 900)),
    );
    simulator.broadcast(
        &topic::scores("snake"),
        TransportEvent::Score(ScoreEvent::new("snake", "Ava", 500)),
    );

    let received = timeout(Duration::from_secs(1), scores.recv())
        .await
        .expect("delivery in time")
        .expect("stream open");
    assert_eq!(received.game_id, "snake");
    assert_eq!(received.score, 500);
    assert!(scores.try_recv().is_none());
}

#[tokio::test]
async fn presence_flows_through_the_facade() {
    let (_dir, _store, service) = test_service();
    let identity = service.identity();

    let mut presence = service.track_presence("pong", &identity);
    let roster = presence.recv().await.expect("initial roster");
    assert_eq!(roster.len(), 1);
    assert_eq!(service.online_count("pong"), 1);

    // a duplicate registration of the same user must not double-count
    let _again = service.track_presence("pong", &identity);
    assert_eq!(service.online_count("pong"), 1);

    service
        .simulator()
        .expect("simulated mode")
        .simulate_presence_join("pong");
    let grown = timeout(Duration::from_secs(2), async {
        loop {
            if service.online_count("pong") == 2 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(grown.is_ok());
    assert_eq!(service.presence_snapshot("pong").len(), 2);

    presence.release();
}

#[tokio::test]
async fn game_events_flow_through_the_facade() {
    let (_dir, _store, service) = test_service();

    let mut events = service.subscribe_to_game_events("pong");
    service.broadcast_game_event(GameEvent::started("pong"));

    let event = timeout(Duration::from_secs(1), events.recv())
        .await
        .expect("delivery in time")
        .expect("stream open");
    assert_eq!(event.kind, GameEventKind::GameStarted);
}

#[tokio::test]
async fn leaderboard_snapshots_flow_through_the_facade() {
    let (_dir, store, service) = test_service();
    store.submit_score("snake", "Ava", 300).unwrap();
    store.submit_score("snake", "Bo", 100).unwrap();

    let mut leaderboard = service.subscribe_to_leaderboard("snake", Period::AllTime);
    let entries = timeout(Duration::from_secs(2), leaderboard.recv())
        .await
        .expect("snapshot within the poll interval")
        .expect("stream open");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].player_name, "Ava");
    assert_eq!(entries[0].rank, 1);
}

#[tokio::test]
async fn recent_scores_come_from_the_store() {
    let (_dir, store, service) = test_service();
    store.submit_score("snake", "Ava", 100).unwrap();

    let recent = service.recent_scores("snake", 10).unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].player_name, "Ava");
}

#[tokio::test]
async fn shutdown_silences_everything_and_is_idempotent() {
    let (_dir, _store, service) = test_service();
    let mut scores = service.subscribe_to_scores("snake");

    service.shutdown();
    service.shutdown();

    service
        .simulator()
        .expect("simulated mode")
        .broadcast(
            &topic::scores("snake"),
            TransportEvent::Score(ScoreEvent::new("snake", "Ava", 500)),
        );
    assert!(scores.recv().await.is_none());
}
