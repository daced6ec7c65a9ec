use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use super::broadcaster::EventBroadcaster;
use super::message::{GameEvent, GameEventKind};
use crate::channels::ChannelRegistry;
use crate::config::SimulationSettings;
use crate::storage::{ScoreStore, SledScoreStore};
use crate::transport::{SimulatedTransport, Transport};

fn setup() -> (tempfile::TempDir, Arc<SimulatedTransport>, EventBroadcaster) {
    let dir = tempfile::tempdir().expect("create tempdir");
    let store = Arc::new(
        SledScoreStore::new(dir.path().to_str().unwrap(), None, None).expect("open store"),
    );
    let settings = SimulationSettings {
        score_min_secs: 600,
        score_max_secs: 900,
        demo_game: "snake".to_string(),
    };
    let sim = Arc::new(SimulatedTransport::new(
        settings,
        store as Arc<dyn ScoreStore>,
    ));
    sim.connect();
    let registry = ChannelRegistry::new(Arc::clone(&sim) as Arc<dyn Transport>);
    let broadcaster = EventBroadcaster::new(registry, Arc::clone(&sim) as Arc<dyn Transport>);
    (dir, sim, broadcaster)
}

#[test]
fn constructors_fill_in_the_details() {
    let started = GameEvent::started("pong");
    assert_eq!(started.kind, GameEventKind::GameStarted);
    assert_eq!(started.game_id, "pong");
    assert!(started.player_name.is_none());
    assert!(started.data.is_null());

    let joined = GameEvent::player_joined("pong", "Ava");
    assert_eq!(joined.kind, GameEventKind::PlayerJoined);
    assert_eq!(joined.player_name.as_deref(), Some("Ava"));

    let update = GameEvent::score_update("pong", "Ava", 500);
    assert_eq!(update.kind, GameEventKind::ScoreUpdate);
    assert_eq!(update.data["score"], 500);
}

#[tokio::test]
async fn broadcast_reaches_subscribers() {
    let (_dir, _sim, broadcaster) = setup();

    let mut sub = broadcaster.subscribe("pong");
    broadcaster.broadcast(GameEvent::started("pong"));

    let event = timeout(Duration::from_secs(1), sub.recv())
        .await
        .expect("delivery in time")
        .expect("stream open");
    assert_eq!(event.kind, GameEventKind::GameStarted);
    assert_eq!(event.game_id, "pong");
}

#[tokio::test]
async fn events_arrive_in_broadcast_order() {
    let (_dir, _sim, broadcaster) = setup();
    let mut sub = broadcaster.subscribe("pong");

    broadcaster.broadcast(GameEvent::started("pong"));
    broadcaster.broadcast(GameEvent::score_update("pong", "Ava", 500));
    broadcaster.broadcast(GameEvent::ended("pong"));

    let kinds = [
        GameEventKind::GameStarted,
        GameEventKind::ScoreUpdate,
        GameEventKind::GameEnded,
    ];
    for expected in kinds {
        let event = sub.recv().await.expect("stream open");
        assert_eq!(event.kind, expected);
    }
}

#[tokio::test]
async fn events_do_not_cross_game_rooms() {
    let (_dir, _sim, broadcaster) = setup();
    let mut pong = broadcaster.subscribe("pong");
    let _tetris = broadcaster.subscribe("tetris");

    broadcaster.broadcast(GameEvent::started("tetris"));
    broadcaster.broadcast(GameEvent::started("pong"));

    let event = pong.recv().await.expect("stream open");
    assert_eq!(event.game_id, "pong");
    assert!(pong.try_recv().is_none());
}

#[tokio::test]
async fn an_event_before_subscribing_is_lost() {
    let (_dir, _sim, broadcaster) = setup();

    broadcaster.broadcast(GameEvent::started("pong"));

    let mut sub = broadcaster.subscribe("pong");
    broadcaster.broadcast(GameEvent::ended("pong"));

    let event = sub.recv().await.expect("stream open");
    assert_eq!(event.kind, GameEventKind::GameEnded);
}

#[tokio::test]
async fn cancel_stops_delivery() {
    let (_dir, _sim, broadcaster) = setup();

    let mut sub = broadcaster.subscribe("pong");
    sub.cancel();
    broadcaster.broadcast(GameEvent::started("pong"));

    assert!(sub.recv().await.is_none());
}
