use std::io::Write;

use chp_lighting_lib::config::{AppSettings, SettingsError};
use chp_lighting_lib::device::protocol::ReadbackMode;

#[test]
fn missing_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let settings = AppSettings::load(&dir.path().join("absent.json")).unwrap();

    assert_eq!(settings.baud_rate, 115200);
    assert_eq!(settings.readback, ReadbackMode::Mirror);
    assert!(settings.auto_connect.is_none());
    assert_eq!(settings.indicators.len(), 3);
}

#[test]
fn partial_file_overrides_selected_fields() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "auto_connect": "COM12",
            "development": false,
            "readback": {{ "mode": "query", "command": "?", "timeout_ms": 250 }}
        }}"#
    )
    .unwrap();

    let settings = AppSettings::load(file.path()).unwrap();
    assert_eq!(settings.auto_connect.as_deref(), Some("COM12"));
    assert_eq!(
        settings.readback,
        ReadbackMode::Query {
            command: "?".to_string(),
            timeout_ms: 250
        }
    );
    assert_eq!(settings.app_info().app_version, env!("CARGO_PKG_VERSION"));
    assert_eq!(settings.baud_rate, 115200);
}

#[test]
fn custom_catalog_is_loaded() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{ "indicators": [ {{
            "Title": "Hazard", "ProperName": "Hazard", "ShortName": "HZ",
            "states": [
                {{ "ProperName": "Off", "ShortName": "OFF", "SerialCommand": "0", "CCommand": "OFF" }},
                {{ "ProperName": "Hazard", "ShortName": "HZ", "SerialCommand": "H", "CCommand": "HAZARD" }}
            ]
        }} ] }}"#
    )
    .unwrap();

    let settings = AppSettings::load(file.path()).unwrap();
    assert_eq!(settings.indicators.len(), 1);
    assert_eq!(settings.indicators[0].active_variant, "warning");
    assert_eq!(settings.indicators[0].states[1].c_command, "HAZARD");
}

#[test]
fn empty_group_is_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{ "indicators": [ {{ "Title": "Broken", "ProperName": "Broken", "ShortName": "B", "states": [] }} ] }}"#
    )
    .unwrap();

    assert!(matches!(AppSettings::load(file.path()), Err(SettingsError::Catalog(_))));
}

#[test]
fn zero_baud_rate_is_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{ "baud_rate": 0 }}"#).unwrap();

    assert!(matches!(AppSettings::load(file.path()), Err(SettingsError::Invalid(_))));
}

#[test]
fn malformed_json_is_a_parse_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{{ not json").unwrap();

    assert!(matches!(AppSettings::load(file.path()), Err(SettingsError::Parse(_))));
}
