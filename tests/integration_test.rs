use chatline::config::Config;
use std::path::PathBuf;

#[test]
fn test_config_validation_rejects_invalid_log_filter() {
    let config = Config {
        log_filter: "chatline=shouting".to_string(),
        log_path: None,
        debug_payload: false,
    };

    assert!(config.validate().is_err());
}

#[test]
fn test_config_validation_accepts_file_log_path() {
    let config = Config {
        log_filter: "chatline=debug,warn".to_string(),
        log_path: Some(PathBuf::from("/tmp/chatline-integration.log")),
        debug_payload: true,
    };

    assert!(config.validate().is_ok());
}
