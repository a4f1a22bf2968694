use super::*;

#[test]
fn test_load_defaults_without_sources() {
    temp_env::with_vars_unset(["COSGATE__SERVER__PORT", "COSGATE__STORAGE__BACKEND"], || {
        let config = AppConfig::load().expect("config should load");
        assert_eq!(config.server.port, 2368);
        assert_eq!(config.server.host, "0.0.0.0");
        assert!(config.server.mount_path.is_none());
        assert_eq!(config.storage.backend, StorageBackend::Cos);
        assert!(config.storage.bucket.is_none());
    });
}

#[test]
fn test_load_from_prefixed_environment() {
    temp_env::with_vars(
        [
            ("COSGATE__SERVER__PORT", Some("9000")),
            ("COSGATE__STORAGE__BACKEND", Some("memory")),
            ("COSGATE__STORAGE__BUCKET", Some("assets-1250000000")),
            ("COSGATE__STORAGE__PRIVATE_STORAGE", Some("true")),
        ],
        || {
            let config = AppConfig::load().expect("config should load");
            assert_eq!(config.server.port, 9000);
            assert_eq!(config.storage.backend, StorageBackend::Memory);
            assert_eq!(config.storage.bucket.as_deref(), Some("assets-1250000000"));
            assert_eq!(config.storage.private_storage, Some(true));
        },
    );
}

#[test]
fn test_storage_settings_debug_hides_secrets() {
    let settings = StorageSettings {
        secret_id: Some("AKIDexample".into()),
        secret_key: Some("very-secret".into()),
        ..StorageSettings::default()
    };
    let rendered = format!("{settings:?}");
    assert!(!rendered.contains("AKIDexample"));
    assert!(!rendered.contains("very-secret"));
    assert!(rendered.contains("has_secret_key: true"));
}
