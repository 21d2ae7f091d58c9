//! ---
//! marax_section: "03-configuration-logging"
//! marax_subsection: "tests"
//! marax_type: "source"
//! marax_scope: "code"
//! marax_description: "Configuration file discovery and parsing."
//! marax_version: "v0.1.0"
//! marax_owner: "tbd"
//! ---
use std::env;
use std::fs;
use std::time::Duration;

use marax_common::config::ExporterConfig;
use marax_common::logging::LogFormat;

const FULL_CONFIG: &str = r#"
[serial]
device = "/dev/ttyUSB0"
baud_rate = 19200
read_timeout_ms = 2000
poll_interval_ms = 250
discard_initial_lines = 3

[metrics]
listen = "127.0.0.1:9100"
path = "/probe"

[logging]
format = "pretty"
directory = "/var/log/marax"
file_prefix = "espresso"
"#;

#[test]
fn full_document_round_trips_every_section() {
    let config: ExporterConfig = FULL_CONFIG.parse().expect("config parses");
    assert_eq!(config.serial.device, "/dev/ttyUSB0");
    assert_eq!(config.serial.baud_rate, 19200);
    assert_eq!(config.serial.read_timeout, Duration::from_secs(2));
    assert_eq!(config.serial.poll_interval, Duration::from_millis(250));
    assert_eq!(config.serial.discard_initial_lines, 3);
    assert_eq!(config.metrics.listen.to_string(), "127.0.0.1:9100");
    assert_eq!(config.metrics.path, "/probe");
    assert_eq!(config.logging.format, LogFormat::Pretty);
    assert_eq!(config.logging.file_prefix.as_deref(), Some("espresso"));
}

#[test]
fn partial_document_keeps_defaults() {
    let config: ExporterConfig = "[serial]\ndevice = \"/dev/ttyAMA0\"\n".parse().unwrap();
    assert_eq!(config.serial.device, "/dev/ttyAMA0");
    assert_eq!(config.serial.baud_rate, 9600);
    assert_eq!(config.metrics.listen.port(), 8080);
    assert_eq!(config.logging.format, LogFormat::StructuredJson);
}

#[test]
fn invalid_values_are_rejected() {
    for doc in [
        "[serial]\ndevice = \"\"\n",
        "[serial]\nbaud_rate = 0\n",
        "[serial]\nread_timeout_ms = 0\n",
        "[serial]\nbaud_rate = \"fast\"\n",
        "[logging]\nformat = \"xml\"\n",
    ] {
        assert!(doc.parse::<ExporterConfig>().is_err(), "accepted: {doc}");
    }
}

#[test]
fn load_prefers_env_then_candidates_then_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.toml");
    let candidate = dir.path().join("candidate.toml");
    let override_path = dir.path().join("override.toml");
    fs::write(&candidate, "[serial]\ndevice = \"/dev/candidate\"\n").unwrap();
    fs::write(&override_path, "[serial]\ndevice = \"/dev/override\"\n").unwrap();

    env::remove_var(ExporterConfig::ENV_CONFIG_PATH);
    let loaded = ExporterConfig::load(&[&missing]).unwrap();
    assert!(loaded.source.is_none());
    assert_eq!(loaded.config, ExporterConfig::default());

    let loaded = ExporterConfig::load(&[&missing, &candidate]).unwrap();
    assert_eq!(loaded.source.as_deref(), Some(candidate.as_path()));
    assert_eq!(loaded.config.serial.device, "/dev/candidate");

    env::set_var(ExporterConfig::ENV_CONFIG_PATH, &override_path);
    let loaded = ExporterConfig::load(&[&candidate]).unwrap();
    env::remove_var(ExporterConfig::ENV_CONFIG_PATH);
    assert_eq!(loaded.source.as_deref(), Some(override_path.as_path()));
    assert_eq!(loaded.config.serial.device, "/dev/override");
}

#[test]
fn unreadable_candidate_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let broken = dir.path().join("broken.toml");
    fs::write(&broken, "[serial\n").unwrap();
    let err = ExporterConfig::from_path(&broken).unwrap_err();
    assert!(format!("{err:#}").contains("broken.toml"));
}
