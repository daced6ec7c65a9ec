use super::*;
use serial_test::serial;
use std::env;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_default_settings() {
    let settings = Settings::default();
    assert_eq!(settings.realtime.endpoint, "");
    assert_eq!(settings.realtime.api_key, "");
    assert_eq!(settings.simulation.score_min_secs, 5);
    assert_eq!(settings.simulation.score_max_secs, 15);
    assert_eq!(settings.simulation.demo_game, "snake");
    assert_eq!(settings.leaderboard.poll_secs, 10);
    assert_eq!(settings.leaderboard.limit, 10);
    assert_eq!(settings.storage.path, "playsync_db");
    assert_eq!(settings.log.level, "info");
}

#[test]
fn live_not_configured_by_default() {
    let settings = Settings::default();
    assert!(!settings.live_configured());
}

#[test]
fn live_not_configured_with_placeholders() {
    let mut settings = Settings::default();
    settings.realtime.endpoint = ENDPOINT_PLACEHOLDER.to_string();
    settings.realtime.api_key = API_KEY_PLACEHOLDER.to_string();
    assert!(!settings.live_configured());
}

#[test]
fn live_not_configured_with_only_endpoint() {
    let mut settings = Settings::default();
    settings.realtime.endpoint = "wss://realtime.playsync.gg/socket".to_string();
    assert!(!settings.live_configured());
}

#[test]
fn live_configured_with_real_values() {
    let mut settings = Settings::default();
    settings.realtime.endpoint = "wss://realtime.playsync.gg/socket".to_string();
    settings.realtime.api_key = "srv-1234".to_string();
    assert!(settings.live_configured());
}

#[test]
#[serial]
fn load_config_from_file_overrides_defaults() {
    // Create a temporary directory and set it as current dir so load_config
    // will pick up config/default.toml from there.
    let tmp = TempDir::new().expect("create tempdir");
    let orig = env::current_dir().expect("current_dir");
    env::set_current_dir(tmp.path()).expect("set current dir");

    // create config dir and default.toml
    fs::create_dir_all("config").expect("create config dir");
    let toml = r#"
        [realtime]
        endpoint = "wss://realtime.playsync.gg/socket"
        api_key = "srv-1234"

        [simulation]
        score_min_secs = 1
        score_max_secs = 2
        demo_game = "tetris"

        [leaderboard]
        poll_secs = 3
        limit = 5

        [storage]
        path = "scores_db"

        [log]
        level = "debug"
    "#;
    fs::write("config/default.toml", toml).expect("write config file");

    let cfg = load_config().expect("load_config failed");
    assert_eq!(cfg.realtime.endpoint, "wss://realtime.playsync.gg/socket");
    assert_eq!(cfg.realtime.api_key, "srv-1234");
    assert!(cfg.live_configured());
    assert_eq!(cfg.simulation.score_min_secs, 1);
    assert_eq!(cfg.simulation.score_max_secs, 2);
    assert_eq!(cfg.simulation.demo_game, "tetris");
    assert_eq!(cfg.leaderboard.poll_secs, 3);
    assert_eq!(cfg.leaderboard.limit, 5);
    assert_eq!(cfg.storage.path, "scores_db");
    // unset values keep their defaults
    assert_eq!(cfg.storage.score_ttl_secs, Some(7 * 24 * 3600));
    assert_eq!(cfg.log.level, "debug");

    // restore cwd
    env::set_current_dir(orig).expect("restore cwd");
}

#[test]
#[serial]
fn load_config_from_environment() {
    temp_env::with_vars(
        [
            (
                "REALTIME__ENDPOINT",
                Some("wss://realtime.playsync.gg/socket"),
            ),
            ("REALTIME__API_KEY", Some("env-key")),
            ("LOG__LEVEL", Some("trace")),
        ],
        || {
            let cfg = load_config().expect("load_config failed");
            assert_eq!(cfg.realtime.endpoint, "wss://realtime.playsync.gg/socket");
            assert_eq!(cfg.realtime.api_key, "env-key");
            assert_eq!(cfg.log.level, "trace");
            // untouched sections keep defaults
            assert_eq!(cfg.simulation.demo_game, "snake");
        },
    );
}
