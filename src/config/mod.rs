mod settings;

use crate::config::settings::PartialSettings;
use config::{Config, ConfigError, Environment, File};

pub use settings::{
    API_KEY_PLACEHOLDER, ENDPOINT_PLACEHOLDER, LeaderboardSettings, LogSettings, RealtimeSettings,
    Settings, SimulationSettings, StorageSettings,
};

/// Loads the configuration from the default file and environment variables
/// Merges the configuration with default values
/// Returns a `Settings` struct containing all section configurations
pub fn load_config() -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(Environment::default().separator("__"));

    let config = builder.build()?;

    // Try to deserialize what is available
    let partial: PartialSettings = config.try_deserialize()?;

    // Merge with defaults
    let default = Settings::default();

    Ok(Settings {
        realtime: RealtimeSettings {
            endpoint: partial
                .realtime
                .as_ref()
                .and_then(|r| r.endpoint.clone())
                .unwrap_or(default.realtime.endpoint),
            api_key: partial
                .realtime
                .as_ref()
                .and_then(|r| r.api_key.clone())
                .unwrap_or(default.realtime.api_key),
        },
        simulation: SimulationSettings {
            score_min_secs: partial
                .simulation
                .as_ref()
                .and_then(|s| s.score_min_secs)
                .unwrap_or(default.simulation.score_min_secs),
            score_max_secs: partial
                .simulation
                .as_ref()
                .and_then(|s| s.score_max_secs)
                .unwrap_or(default.simulation.score_max_secs),
            demo_game: partial
                .simulation
                .as_ref()
                .and_then(|s| s.demo_game.clone())
                .unwrap_or(default.simulation.demo_game),
        },
        leaderboard: LeaderboardSettings {
            poll_secs: partial
                .leaderboard
                .as_ref()
                .and_then(|l| l.poll_secs)
                .unwrap_or(default.leaderboard.poll_secs),
            limit: partial
                .leaderboard
                .as_ref()
                .and_then(|l| l.limit)
                .unwrap_or(default.leaderboard.limit),
        },
        storage: StorageSettings {
            path: partial
                .storage
                .as_ref()
                .and_then(|s| s.path.clone())
                .unwrap_or(default.storage.path),
            score_ttl_secs: partial
                .storage
                .as_ref()
                .and_then(|s| s.score_ttl_secs)
                .or(default.storage.score_ttl_secs),
            max_scores_per_game: partial
                .storage
                .as_ref()
                .and_then(|s| s.max_scores_per_game)
                .or(default.storage.max_scores_per_game),
        },
        log: LogSettings {
            level: partial
                .log
                .as_ref()
                .and_then(|l| l.level.clone())
                .unwrap_or(default.log.level),
        },
    })
}

#[cfg(test)]
mod tests;
