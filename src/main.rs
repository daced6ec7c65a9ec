use std::sync::Arc;

use playsync::config::load_config;
use playsync::events::GameEvent;
use playsync::leaderboard::Period;
use playsync::service::SyncService;
use playsync::storage::SledScoreStore;
use playsync::utils::logging;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let settings = load_config()?;
    logging::init(&settings.log.level);

    let store = Arc::new(SledScoreStore::from_settings(&settings.storage)?);
    let service = SyncService::new(settings.clone(), store);
    let identity = service.identity();
    info!(
        player = %identity.display_name,
        live = service.is_live(),
        "sync service started"
    );

    let game = settings.simulation.demo_game.clone();

    let mut scores = service.subscribe_to_scores(&game);
    tokio::spawn(async move {
        while let Some(score) = scores.recv().await {
            info!(player = %score.player_name, points = score.score, "score posted");
        }
    });

    let mut presence = service.track_presence(&game, &identity);
    tokio::spawn(async move {
        while let Some(roster) = presence.recv().await {
            info!(online = roster.len(), "presence updated");
        }
    });

    let mut leaderboard = service.subscribe_to_leaderboard(&game, Period::Daily);
    tokio::spawn(async move {
        while let Some(entries) = leaderboard.recv().await {
            if let Some(top) = entries.first() {
                info!(leader = %top.player_name, score = top.score, "leaderboard refreshed");
            }
        }
    });

    service.broadcast_game_event(GameEvent::started(&game));

    // populate the demo room so the presence feed has company
    if let Some(simulator) = service.simulator() {
        simulator.simulate_presence_join(&game);
        simulator.simulate_presence_join(&game);
    }

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received, exiting gracefully");
    service.shutdown();
    Ok(())
}
