use std::io::Write;

use hl7tools::config::{Config, ConfigError};
use hl7tools::{SchemaSettings, Session};

fn write_temp(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file
}

#[test]
fn test_config_from_file() {
    let file = write_temp(
        r#"
        [logging]
        level = "warn"

        [listener]
        port = 6661

        [batch]
        split_threshold = 5
    "#,
    );

    let config = Config::from_file(file.path()).expect("valid config");
    assert_eq!(config.logging.level, "warn");
    assert_eq!(config.listener.port, 6661);
    assert_eq!(config.batch.threshold, 5);
    assert_eq!(config.batch.header_token, "MSH");
}

#[test]
fn test_missing_file_and_bad_toml() {
    assert!(matches!(
        Config::from_file("/nonexistent/hl7tools.toml"),
        Err(ConfigError::Read { .. })
    ));
    assert!(matches!(
        Config::from_toml("[schema\ndefault_version = 1"),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn test_listener_validation() {
    let result = Config::from_toml("[listener]\nmax_frame_len = 0\n");
    assert!(matches!(
        result,
        Err(ConfigError::Transport { section: "listener", .. })
    ));
}

#[test]
fn test_schema_section_drives_the_session() {
    let custom = write_temp(
        r#"{ "ZPI": { "desc": "Site Patient Info", "fields": [
            { "desc": "Badge Number", "datatype": "ST", "opt": 2, "rep": 1 }
        ] } }"#,
    );
    let schema_dir = tempfile::tempdir().expect("temp dir");
    let toml = format!(
        "[schema]\ndefault_version = \"2.3\"\nschema_dir = {:?}\ncustom_segment_schema = {:?}\n",
        schema_dir.path().display().to_string(),
        custom.path().display().to_string()
    );
    let config = Config::from_toml(&toml).expect("valid config");

    let settings = SchemaSettings::from_config(&config.schema).expect("custom segments load");
    let session = Session::with_settings("PID|1||123||Doe\rZPI|\r", settings);

    assert_eq!(session.schema().version, "2.3");
    let violations = session.missing_required_fields();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].location, "ZPI-1");
    assert_eq!(violations[0].description, "Badge Number");
}

#[test]
fn test_missing_custom_schema_is_an_error() {
    let config = Config::from_toml("[schema]\ncustom_segment_schema = \"/nonexistent/z.json\"\n")
        .expect("paths are not checked at parse time");
    assert!(SchemaSettings::from_config(&config.schema).is_err());
}
