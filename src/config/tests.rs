#![cfg(test)]

use crate::config::config::{Config, ConfigError};

/// Parse a TOML string into a `Config` and run validation
fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    let cfg: Config = toml::from_str(toml_str).expect("TOML parse error");
    cfg.validate()?;
    Ok(cfg)
}

#[test]
fn test_empty_config_uses_defaults() {
    let cfg = load_config_from_str("").expect("defaults are valid");
    assert!(!cfg.logging.log_to_file);
    assert_eq!(cfg.logging.level, "info");
    assert_eq!(cfg.schema.default_version, "2.7.1");
    assert_eq!(cfg.schema.max_lines_for_descriptions, 200);
    assert!(cfg.sender.is_none());
    assert_eq!(cfg.listener.port, 2575);
    assert_eq!(cfg.batch.header_token, "MSH");
    assert_eq!(cfg.batch.threshold, 100);
}

#[test]
fn test_full_config() {
    let toml = r#"
        [logging]
        log_to_file = true
        log_file_path = "/tmp/hl7tools.log"
        level = "debug,mllp=trace"

        [schema]
        default_version = "2.5.1"
        schema_dir = "./schema"
        custom_segment_schema = "./z.json"
        max_lines_for_descriptions = 50

        [sender]
        host = "10.0.0.5"
        port = 5000
        timeout_ms = 2000
        use_tls = true
        ignore_cert_error = true
        encoding = "latin1"

        [listener]
        bind_addr = "127.0.0.1"
        port = 5001
        max_frame_len = 4096

        [batch]
        header_token = "MSH"
        split_threshold = 10
    "#;

    let cfg = load_config_from_str(toml).expect("valid config");
    assert_eq!(cfg.schema.default_version, "2.5.1");
    assert_eq!(cfg.schema.custom_segment_schema.as_deref(), Some(std::path::Path::new("./z.json")));
    let sender = cfg.sender.expect("sender section");
    assert_eq!(sender.address(), "10.0.0.5:5000");
    assert!(sender.use_tls && sender.ignore_cert_error);
    assert_eq!(sender.encoding, mllp::CharacterEncoding::Latin1);
    assert_eq!(cfg.listener.max_frame_len, 4096);
    assert_eq!(cfg.batch.threshold, 10);
}

#[test]
fn test_unsupported_default_version() {
    let result = load_config_from_str("[schema]\ndefault_version = \"3.0\"\n");
    assert!(matches!(result, Err(ConfigError::UnsupportedVersion(_))));
}

#[test]
fn test_invalid_sender_section() {
    let result = load_config_from_str("[sender]\nhost = \"\"\nport = 5000\n");
    assert!(matches!(result, Err(ConfigError::Transport { section: "sender", .. })));
}

#[test]
fn test_invalid_log_level() {
    let result = load_config_from_str("[logging]\nlevel = \"hl7tools=loud\"\n");
    assert!(matches!(result, Err(ConfigError::InvalidLogLevel(_))));
}
