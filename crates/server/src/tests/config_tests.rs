use super::{apply_env, apply_file, normalize_database_url, prepare_database_url, Settings};

use std::collections::HashMap;

fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn defaults_point_at_public_services() {
    let settings = Settings::default();
    assert_eq!(settings.upstream_timeout_secs, 10);
    assert!(!settings.seed_favorites);
    assert!(settings.cities_api_url.contains("opendatasoft"));
    assert!(settings.weather_api_url.ends_with("/data/2.5"));
}

#[test]
fn file_overrides_defaults() {
    let mut settings = Settings::default();
    apply_file(
        &mut settings,
        r#"
bind_addr = "0.0.0.0:9000"
database_url = "sqlite://./tmp/favorites.db"
upstream_timeout_secs = 3
seed_favorites = true
"#,
    );

    assert_eq!(settings.server_bind, "0.0.0.0:9000");
    assert_eq!(settings.database_url, "sqlite://./tmp/favorites.db");
    assert_eq!(settings.upstream_timeout_secs, 3);
    assert!(settings.seed_favorites);
}

#[test]
fn env_overrides_file_and_app_prefix_wins() {
    let mut settings = Settings::default();
    apply_file(
        &mut settings,
        "bind_addr = \"0.0.0.0:9000\"\nopenweather_api_key = \"from-file\"\n",
    );
    apply_env(
        &mut settings,
        env_of(&[
            ("SERVER_BIND", "127.0.0.1:7000"),
            ("APP__BIND_ADDR", "127.0.0.1:7001"),
            ("OPENWEATHER_API_KEY", "from-env"),
            ("APP__UPSTREAM_TIMEOUT_SECS", "25"),
            ("APP__SEED_FAVORITES", "yes"),
        ]),
    );

    assert_eq!(settings.server_bind, "127.0.0.1:7001");
    assert_eq!(settings.openweather_api_key, "from-env");
    assert_eq!(settings.upstream_timeout_secs, 25);
    assert!(settings.seed_favorites);
}

#[test]
fn invalid_values_are_ignored() {
    let mut settings = Settings::default();
    apply_file(&mut settings, "this is = = not toml");
    assert_eq!(settings, Settings::default());

    apply_env(
        &mut settings,
        env_of(&[
            ("APP__UPSTREAM_TIMEOUT_SECS", "soon"),
            ("APP__SEED_FAVORITES", "maybe"),
        ]),
    );
    assert_eq!(settings, Settings::default());
}

#[test]
fn normalizes_plain_file_path_to_sqlite_url() {
    assert_eq!(
        normalize_database_url("./data/test.db"),
        "sqlite://./data/test.db"
    );
    assert_eq!(
        normalize_database_url("sqlite:./data/test.db"),
        "sqlite://./data/test.db"
    );
    assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
    assert_eq!(
        normalize_database_url("   "),
        Settings::default().database_url
    );
}

#[test]
fn creates_parent_dir_for_sqlite_url() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("data").join("test.db");

    prepare_database_url(db_path.to_string_lossy().as_ref()).expect("prepare db url");
    assert!(temp_root.path().join("data").exists());
}
