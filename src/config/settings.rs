use serde::Deserialize;

/// Placeholder endpoint shipped in `.env.example`; treated the same as an
/// absent value when deciding whether a live backend is configured.
pub const ENDPOINT_PLACEHOLDER: &str = "wss://your-project.example.com/realtime";

/// Placeholder credential shipped in `.env.example`.
pub const API_KEY_PLACEHOLDER: &str = "your-anon-key";

/// Top-level configuration settings for the application.
///
/// Covers the live backend, the local simulator, leaderboard delivery,
/// the score store, and logging.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub realtime: RealtimeSettings,
    pub simulation: SimulationSettings,
    pub leaderboard: LeaderboardSettings,
    pub storage: StorageSettings,
    pub log: LogSettings,
}

/// Connection settings for the hosted real-time backend.
///
/// Both values must be present and different from the placeholders for the
/// live transport to be selected.
#[derive(Debug, Deserialize, Clone)]
pub struct RealtimeSettings {
    pub endpoint: String,
    pub api_key: String,
}

/// Settings for the simulated transport's demo traffic generator.
#[derive(Debug, Deserialize, Clone)]
pub struct SimulationSettings {
    pub score_min_secs: u64,
    pub score_max_secs: u64,
    pub demo_game: String,
}

/// Settings for leaderboard delivery.
///
/// `poll_secs` only applies in simulated mode, where no push notifications
/// exist and snapshots are re-fetched on a fixed interval.
#[derive(Debug, Deserialize, Clone)]
pub struct LeaderboardSettings {
    pub poll_secs: u64,
    pub limit: usize,
}

/// Settings for the local score store stand-in.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageSettings {
    pub path: String,
    pub score_ttl_secs: Option<i64>,
    pub max_scores_per_game: Option<usize>,
}

/// Logging settings.
#[derive(Debug, Deserialize, Clone)]
pub struct LogSettings {
    pub level: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Allows partial specification of settings. Missing values can be filled using defaults.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub realtime: Option<PartialRealtimeSettings>,
    pub simulation: Option<PartialSimulationSettings>,
    pub leaderboard: Option<PartialLeaderboardSettings>,
    pub storage: Option<PartialStorageSettings>,
    pub log: Option<PartialLogSettings>,
}

/// Partial real-time backend settings.
#[derive(Debug, Deserialize)]
pub struct PartialRealtimeSettings {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
}

/// Partial simulator settings.
#[derive(Debug, Deserialize)]
pub struct PartialSimulationSettings {
    pub score_min_secs: Option<u64>,
    pub score_max_secs: Option<u64>,
    pub demo_game: Option<String>,
}

/// Partial leaderboard settings.
#[derive(Debug, Deserialize)]
pub struct PartialLeaderboardSettings {
    pub poll_secs: Option<u64>,
    pub limit: Option<usize>,
}

/// Partial storage settings.
#[derive(Debug, Deserialize)]
pub struct PartialStorageSettings {
    pub path: Option<String>,
    pub score_ttl_secs: Option<i64>,
    pub max_scores_per_game: Option<usize>,
}

/// Partial logging settings.
#[derive(Debug, Deserialize)]
pub struct PartialLogSettings {
    pub level: Option<String>,
}

impl Settings {
    /// Whether a live backend is usable: endpoint and credential both present
    /// and not equal to the known placeholder values.
    ///
    /// Evaluated once at service construction; the choice of transport is
    /// never revisited mid-session.
    pub fn live_configured(&self) -> bool {
        !self.realtime.endpoint.is_empty()
            && !self.realtime.api_key.is_empty()
            && self.realtime.endpoint != ENDPOINT_PLACEHOLDER
            && self.realtime.api_key != API_KEY_PLACEHOLDER
    }
}

/// Provides default values for `Settings`.
///
/// Ensures the application has sensible defaults if no configuration is provided.
impl Default for Settings {
    fn default() -> Self {
        Self {
            realtime: RealtimeSettings {
                endpoint: String::new(),
                api_key: String::new(),
            },
            simulation: SimulationSettings {
                score_min_secs: 5,
                score_max_secs: 15,
                demo_game: "snake".to_string(),
            },
            leaderboard: LeaderboardSettings {
                poll_secs: 10,
                limit: 10,
            },
            storage: StorageSettings {
                path: "playsync_db".to_string(),
                score_ttl_secs: Some(7 * 24 * 3600),
                max_scores_per_game: Some(1000),
            },
            log: LogSettings {
                level: "info".to_string(),
            },
        }
    }
}
