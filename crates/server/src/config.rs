use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::Deserialize;
use tracing::warn;
use upstream::{cities::DEFAULT_CITIES_URL, weather::DEFAULT_WEATHER_URL};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    pub server_bind: String,
    pub database_url: String,
    pub cities_api_url: String,
    pub weather_api_url: String,
    pub openweather_api_key: String,
    pub upstream_timeout_secs: u64,
    pub seed_favorites: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:5000".into(),
            database_url: "sqlite://./data/weather.db".into(),
            cities_api_url: DEFAULT_CITIES_URL.into(),
            weather_api_url: DEFAULT_WEATHER_URL.into(),
            openweather_api_key: String::new(),
            upstream_timeout_secs: 10,
            seed_favorites: false,
        }
    }
}

/// Defaults, then `server.toml` in the working directory, then the process
/// environment.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("server.toml") {
        apply_file(&mut settings, &raw);
    }
    apply_env(&mut settings, |key| std::env::var(key).ok());

    if settings.openweather_api_key.is_empty() {
        warn!("OPENWEATHER_API_KEY is not set; weather requests will be rejected upstream");
    }
    settings
}

pub(crate) fn apply_file(settings: &mut Settings, raw: &str) {
    let file_cfg = match toml::from_str::<HashMap<String, toml::Value>>(raw) {
        Ok(file_cfg) => file_cfg,
        Err(error) => {
            warn!(%error, "ignoring unreadable server.toml");
            return;
        }
    };
    let get = |key: &str| file_cfg.get(key).and_then(scalar_to_string);

    if let Some(v) = get("bind_addr") {
        settings.server_bind = v;
    }
    if let Some(v) = get("database_url") {
        settings.database_url = v;
    }
    if let Some(v) = get("cities_api_url") {
        settings.cities_api_url = v;
    }
    if let Some(v) = get("weather_api_url") {
        settings.weather_api_url = v;
    }
    if let Some(v) = get("openweather_api_key") {
        settings.openweather_api_key = v;
    }
    if let Some(v) = get("upstream_timeout_secs").and_then(|v| v.parse().ok()) {
        settings.upstream_timeout_secs = v;
    }
    if let Some(v) = get("seed_favorites").and_then(|v| parse_flag(&v)) {
        settings.seed_favorites = v;
    }
}

pub(crate) fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = var("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = var("DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = var("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    if let Some(v) = var("CITIES_API_URL") {
        settings.cities_api_url = v;
    }
    if let Some(v) = var("WEATHER_API_URL") {
        settings.weather_api_url = v;
    }
    if let Some(v) = var("OPENWEATHER_API_KEY") {
        settings.openweather_api_key = v;
    }

    if let Some(v) = var("APP__UPSTREAM_TIMEOUT_SECS") {
        match v.parse::<u64>() {
            Ok(parsed) => settings.upstream_timeout_secs = parsed,
            Err(_) => warn!(value = %v, "ignoring invalid APP__UPSTREAM_TIMEOUT_SECS"),
        }
    }
    if let Some(v) = var("APP__SEED_FAVORITES") {
        if let Some(flag) = parse_flag(&v) {
            settings.seed_favorites = flag;
        }
    }
}

fn scalar_to_string(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Integer(i) => Some(i.to_string()),
        toml::Value::Boolean(b) => Some(b.to_string()),
        _ => None,
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub fn prepare_database_url(raw_database_url: &str) -> anyhow::Result<String> {
    let database_url = normalize_database_url(raw_database_url);
    ensure_parent_dir_exists(&database_url)?;
    Ok(database_url)
}

fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:") || raw_database_url.contains("://") {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        return format!("sqlite://{}", path.replace('\\', "/"));
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

fn ensure_parent_dir_exists(database_url: &str) -> anyhow::Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
