//! Configuration layering: JSON file, environment overrides, validation.

use std::sync::Mutex;

use tempfile::NamedTempFile;

use dialread::{DialConfig, ReadStrategy};

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "DIALREAD_CONFIG",
        "DIALREAD_DETECTOR_MODEL",
        "DIALREAD_HANDS_MODEL",
        "DIALREAD_STRATEGY",
        "DIALREAD_SCORE_THRESHOLD",
        "DIALREAD_REMOTE_URL",
        "DIALREAD_REMOTE_MODEL",
        "DIALREAD_REMOTE_API_KEY",
        "DIALREAD_REMOTE_TIMEOUT_SECS",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "detector_model": "stub://clock_detector",
        "hands_model": "stub://watch_hands",
        "strategy": "local-then-remote",
        "score_threshold": 0.45,
        "display": { "width": 1080, "height": 1920 },
        "remote": {
            "url": "https://example.com/v1/chat/completions",
            "model": "vlm-test",
            "timeout_secs": 5
        }
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("DIALREAD_CONFIG", file.path());
    std::env::set_var("DIALREAD_STRATEGY", "remote");
    std::env::set_var("DIALREAD_REMOTE_TIMEOUT_SECS", "9");
    std::env::set_var("DIALREAD_REMOTE_API_KEY", "secret-token");

    let cfg = DialConfig::load().expect("load config");

    assert_eq!(cfg.detector_model, "stub://clock_detector");
    assert_eq!(cfg.hands_model, "stub://watch_hands");
    assert_eq!(cfg.strategy, ReadStrategy::Remote);
    assert_eq!(cfg.score_threshold, 0.45);
    let display = cfg.display.expect("display config");
    assert_eq!((display.width, display.height), (1080, 1920));
    assert_eq!(
        cfg.remote.url.as_deref(),
        Some("https://example.com/v1/chat/completions")
    );
    assert_eq!(cfg.remote.model, "vlm-test");
    assert_eq!(cfg.remote.api_key.as_deref(), Some("secret-token"));
    assert_eq!(cfg.remote.timeout.as_secs(), 9);

    clear_env();
}

#[test]
fn defaults_apply_without_file_or_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = DialConfig::load().expect("load defaults");

    assert_eq!(cfg.strategy, ReadStrategy::Local);
    assert_eq!(cfg.detector_model, "models/clock_detector.onnx");
    assert_eq!(cfg.hands_model, "models/watch_hands.onnx");
    assert!(cfg.display.is_none());
    assert!(cfg.remote.url.is_none());

    clear_env();
}

#[test]
fn remote_strategy_without_url_fails_validation() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("DIALREAD_STRATEGY", "remote");
    let err = DialConfig::load().unwrap_err();
    assert!(format!("{}", err).contains("remote.url"));

    clear_env();
}

#[test]
fn unknown_strategy_is_rejected() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("DIALREAD_STRATEGY", "cloud");
    assert!(DialConfig::load().is_err());

    clear_env();
}
