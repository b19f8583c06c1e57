mod common;

use std::io::Write;

use binjr_core::{adapters::registry::AdapterRegistry, config::BinjrConfig};
use common::FakeTransport;
use shared_utils::config::ConfigError;

#[test]
fn loads_preferences_and_opens_enabled_adapters() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[adapters.Jrds]
url = "http://jrds.test:8080/jrds/"
zone = "America/New_York"
encoding = "ISO-8859-1"
tree_filter = "servicestab"
"#
    )
    .unwrap();

    let config = BinjrConfig::load(file.path()).unwrap();
    let mut registry = AdapterRegistry::with_builtin(FakeTransport::new());
    registry.apply_preferences(&config);

    let adapters = registry.open_from_config(&config).unwrap();
    assert_eq!(adapters.len(), 1);
    assert_eq!(adapters[0].source_name(), "[JRDS] jrds.test:8080 (America/New_York)");
    assert_eq!(adapters[0].encoding(), encoding_rs::WINDOWS_1252);
}

#[test]
fn disabled_adapters_are_not_opened() {
    let config: BinjrConfig = "[adapters.jrds]\nenabled = false\nurl = \"http://h/jrds\"\n"
        .parse()
        .unwrap();
    let mut registry = AdapterRegistry::with_builtin(FakeTransport::new());
    registry.apply_preferences(&config);
    assert!(registry.active_adapters().is_empty());
    assert!(registry.open_from_config(&config).unwrap().is_empty());
}

#[test]
fn unreadable_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let err = BinjrConfig::load(dir.path().join("missing.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}
