//! Configuration and session persistence for opsdeck.
//!
//! TOML config merged with `OPSDECK_*` environment variables, the
//! session-token resolution chain (env → keyring → plaintext), and the
//! cached admin profile. Translates to `opsdeck_core::HubConfig` — the
//! core crate never touches disk or environment itself.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use opsdeck_api::transport::TlsMode;
use opsdeck_core::HubConfig;
use opsdeck_core::model::SessionProfile;

const KEYRING_SERVICE: &str = "opsdeck";
const KEYRING_TOKEN_KEY: &str = "session-token";
const TOKEN_ENV_VAR: &str = "OPSDECK_TOKEN";
const PROFILE_CACHE_FILE: &str = "profile.json";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no session token configured -- set OPSDECK_TOKEN or sign in")]
    NoToken,

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("failed to serialize profile cache: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// How to reach the admin backend.
    #[serde(default)]
    pub backend: Backend,

    /// Dashboard behavior defaults.
    #[serde(default)]
    pub dashboard: Dashboard,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Backend {
    /// REST base URL, typically ending in `/api`.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Skip TLS verification (self-signed dev backends).
    #[serde(default)]
    pub insecure: bool,

    /// Path to a custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Session token (plaintext -- prefer keyring or env var).
    pub token: Option<String>,
}

impl Default for Backend {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            timeout: default_timeout(),
            insecure: false,
            ca_cert: None,
            token: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Dashboard {
    /// Whether incoming alert events are recorded.
    #[serde(default = "default_true")]
    pub alerts_enabled: bool,

    /// Whether high/critical alerts raise a sound cue.
    #[serde(default = "default_true")]
    pub sound_enabled: bool,

    /// Default auto-refresh interval in seconds.
    #[serde(default = "default_refresh")]
    pub refresh_interval: u64,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self {
            alerts_enabled: true,
            sound_enabled: true,
            refresh_interval: default_refresh(),
        }
    }
}

fn default_api_base() -> String {
    "http://localhost:5000/api".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_refresh() -> u64 {
    30
}
fn default_true() -> bool {
    true
}

// ── Paths ───────────────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "opsdeck", "opsdeck").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Resolve the cached-profile path in the platform data dir.
pub fn profile_cache_path() -> PathBuf {
    ProjectDirs::from("com", "opsdeck", "opsdeck").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push(PROFILE_CACHE_FILE);
            p
        },
        |dirs| dirs.data_dir().join(PROFILE_CACHE_FILE),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("opsdeck");
    p
}

// ── Config loading / saving ─────────────────────────────────────────

/// Load the full Config from file + environment.
///
/// Environment variables use the `OPSDECK_` prefix with `__` as the
/// section separator, e.g. `OPSDECK_BACKEND__API_BASE`.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from an explicit path (still merged with environment).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("OPSDECK_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning defaults if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

/// Serialize config to TOML at an explicit path.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Session-token resolution ────────────────────────────────────────

/// Resolve the session token from the credential chain:
/// `OPSDECK_TOKEN` env var → system keyring → plaintext in config.
pub fn resolve_token(config: &Config) -> Result<SecretString, ConfigError> {
    // 1. Environment
    if let Ok(val) = std::env::var(TOKEN_ENV_VAR) {
        if !val.is_empty() {
            return Ok(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, KEYRING_TOKEN_KEY) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    if let Some(ref token) = config.backend.token {
        return Ok(SecretString::from(token.clone()));
    }

    Err(ConfigError::NoToken)
}

/// Store the session token in the system keyring.
pub fn store_token(token: &SecretString) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, KEYRING_TOKEN_KEY)?;
    entry.set_password(token.expose_secret())?;
    Ok(())
}

/// Remove the session token from the system keyring. Missing entries
/// are not an error -- sign-out must be idempotent.
pub fn clear_token() -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, KEYRING_TOKEN_KEY)?;
    match entry.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

// ── Profile cache ───────────────────────────────────────────────────

/// Persist the signed-in admin's profile for the next startup.
pub fn save_profile(profile: &SessionProfile) -> Result<(), ConfigError> {
    save_profile_to(profile, &profile_cache_path())
}

pub fn save_profile_to(profile: &SessionProfile, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_vec_pretty(profile)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Read the cached profile, if one exists and parses.
pub fn load_profile() -> Option<SessionProfile> {
    load_profile_from(&profile_cache_path())
}

pub fn load_profile_from(path: &Path) -> Option<SessionProfile> {
    let bytes = std::fs::read(path).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Delete the cached profile. Called on sign-out; a missing file is fine.
pub fn clear_profile() -> Result<(), ConfigError> {
    clear_profile_at(&profile_cache_path())
}

pub fn clear_profile_at(path: &Path) -> Result<(), ConfigError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

// ── Translation to HubConfig ────────────────────────────────────────

/// Build a [`HubConfig`] from the loaded config.
pub fn to_hub_config(config: &Config) -> Result<HubConfig, ConfigError> {
    let api_base: url::Url =
        config
            .backend
            .api_base
            .parse()
            .map_err(|_| ConfigError::Validation {
                field: "backend.api_base".into(),
                reason: format!("invalid URL: {}", config.backend.api_base),
            })?;

    let tls = if config.backend.insecure {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca_path) = config.backend.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else {
        TlsMode::System
    };

    Ok(HubConfig {
        api_base,
        tls,
        timeout: Duration::from_secs(config.backend.timeout),
        reconnect: opsdeck_api::realtime::ReconnectConfig::default(),
        alerts_enabled: config.dashboard.alerts_enabled,
        sound_enabled: config.dashboard.sound_enabled,
    })
}

// ── Tests ───────────────────────────────────────────────────────────
