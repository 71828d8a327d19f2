use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use chrono::Duration;
use serde::Deserialize;
use server_api::auth::{AdminCredential, SessionKeys};
use tracing::warn;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server_bind: String,
    pub database_url: String,
    pub admin_password: Option<String>,
    pub admin_password_hash: Option<String>,
    pub session_secret: Option<String>,
    pub session_ttl_days: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8080".into(),
            database_url: "sqlite://./data/garden.db".into(),
            admin_password: None,
            admin_password_hash: None,
            session_secret: None,
            session_ttl_days: 31,
        }
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("server.toml") {
        apply_file(&mut settings, &raw);
    }
    apply_env(&mut settings, |name| std::env::var(name).ok());

    settings
}

fn apply_file(settings: &mut Settings, raw: &str) {
    let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(raw) else {
        warn!("ignoring server.toml: expected flat string keys");
        return;
    };

    if let Some(v) = file_cfg.get("bind_addr") {
        settings.server_bind = v.clone();
    }
    if let Some(v) = file_cfg.get("database_url") {
        settings.database_url = v.clone();
    }
    if let Some(v) = file_cfg.get("admin_password") {
        settings.admin_password = Some(v.clone());
    }
    if let Some(v) = file_cfg.get("admin_password_hash") {
        settings.admin_password_hash = Some(v.clone());
    }
    if let Some(v) = file_cfg.get("session_secret") {
        settings.session_secret = Some(v.clone());
    }
    if let Some(days) = file_cfg.get("session_ttl_days").and_then(|v| v.parse().ok()) {
        settings.session_ttl_days = days;
    }
}

/// Plain names first, then their `APP__` forms, so the prefixed variable wins.
fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    let var = |plain: &str, prefixed: &str| lookup(prefixed).or_else(|| lookup(plain));

    if let Some(v) = var("SERVER_BIND", "APP__BIND_ADDR") {
        settings.server_bind = v;
    }
    if let Some(v) = var("DATABASE_URL", "APP__DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = var("ADMIN_PASSWORD", "APP__ADMIN_PASSWORD") {
        settings.admin_password = Some(v);
    }
    if let Some(v) = var("ADMIN_PASSWORD_HASH", "APP__ADMIN_PASSWORD_HASH") {
        settings.admin_password_hash = Some(v);
    }
    if let Some(v) = var("SESSION_SECRET", "APP__SESSION_SECRET") {
        settings.session_secret = Some(v);
    }
    if let Some(days) = lookup("APP__SESSION_TTL_DAYS").and_then(|v| v.parse().ok()) {
        settings.session_ttl_days = days;
    }
}

pub fn admin_credential(settings: &Settings) -> anyhow::Result<AdminCredential> {
    let hash = settings.admin_password_hash.as_deref().map(str::trim);
    let password = settings.admin_password.as_deref();

    match (hash, password) {
        (Some(hash), _) if !hash.is_empty() => AdminCredential::from_hash(hash)
            .map_err(|e| anyhow::anyhow!("admin_password_hash is not a valid argon2 hash: {e}")),
        (_, Some(password)) if !password.is_empty() => AdminCredential::from_plaintext(password)
            .map_err(|e| anyhow::anyhow!("failed to hash admin_password: {e}")),
        _ => {
            warn!("no admin password configured; admin login is disabled");
            Ok(AdminCredential::disabled())
        }
    }
}

pub fn session_keys(settings: &Settings) -> SessionKeys {
    let ttl = Duration::days(settings.session_ttl_days.max(1));
    match settings.session_secret.as_deref() {
        Some(secret) if !secret.is_empty() => SessionKeys::new(secret.as_bytes(), ttl),
        _ => {
            warn!("no session_secret configured; admin sessions end when the server restarts");
            SessionKeys::ephemeral(ttl)
        }
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

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

fn ensure_parent_dir_exists(database_url: &str) -> anyhow::Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
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
