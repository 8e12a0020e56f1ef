//! Configuration Management
//!
//! Resolves the connection settings and tunables for a session.
//!
//! # Configuration Locations
//! - Local: `.library-admin/config.json` (per working directory)
//! - Global: `~/.config/library-admin/config.json` (per user)
//!
//! # Resolution Precedence
//! 1. Explicit command-line flags (highest priority)
//! 2. Environment variables (`DB_HOST`, `DB_PORT`, `DB_NAME`, `DB_USER`, `DB_PASSWORD`)
//! 3. Local config file
//! 4. Global config file
//! 5. Built-in defaults (`localhost:5432`, database `library`, user/password `postgres`)

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::engine::{ConnectionConfig, RetryPolicy};
use crate::error::{LibraryError, Result};

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 5432;
pub const DEFAULT_DATABASE: &str = "library";
pub const DEFAULT_USER: &str = "postgres";
pub const DEFAULT_PASSWORD: &str = "postgres";
pub const DEFAULT_CONNECT_ATTEMPTS: u32 = 20;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;
pub const DEFAULT_FINE_PER_DAY: i32 = 10;

pub const ENV_HOST: &str = "DB_HOST";
pub const ENV_PORT: &str = "DB_PORT";
pub const ENV_DATABASE: &str = "DB_NAME";
pub const ENV_USER: &str = "DB_USER";
pub const ENV_PASSWORD: &str = "DB_PASSWORD";

/// Connection section of a config file. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConnection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// WARNING: Sensitive data, prefer `password_env`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Environment variable name for password (if not storing password directly)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,
}

/// On-disk configuration (`config.json`)
///
/// Example:
/// ```json
/// {
///   "connection": { "host": "db.local", "database": "library", "password_env": "LIB_PW" },
///   "connect_attempts": 5,
///   "fine_per_day": 15
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub connection: FileConnection,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_attempts: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_delay_ms: Option<u64>,

    /// Fine charged per overdue day when a loan is returned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fine_per_day: Option<i32>,
}

impl FileConfig {
    /// Overlay `other` on top of `self`; fields set in `other` win
    #[must_use]
    pub fn merged_with(self, other: Self) -> Self {
        Self {
            connection: FileConnection {
                host: other.connection.host.or(self.connection.host),
                port: other.connection.port.or(self.connection.port),
                database: other.connection.database.or(self.connection.database),
                user: other.connection.user.or(self.connection.user),
                password: other.connection.password.or(self.connection.password),
                password_env: other.connection.password_env.or(self.connection.password_env),
            },
            connect_attempts: other.connect_attempts.or(self.connect_attempts),
            retry_delay_ms: other.retry_delay_ms.or(self.retry_delay_ms),
            fine_per_day: other.fine_per_day.or(self.fine_per_day),
        }
    }
}

/// Connection parameters given explicitly on the command line
#[derive(Debug, Clone, Default)]
pub struct ConnectionOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
}

/// Fully resolved settings for one session
#[derive(Debug, Clone)]
pub struct Settings {
    pub connection: ConnectionConfig,
    pub retry: RetryPolicy,
    pub fine_per_day: i32,
}

/// Get path to local config file (`.library-admin/config.json`)
pub fn local_config_path() -> Result<PathBuf> {
    let current_dir = std::env::current_dir().map_err(|e| {
        LibraryError::config_error(format!("Could not determine current directory: {e}"))
    })?;

    Ok(current_dir.join(".library-admin").join("config.json"))
}

/// Get path to global config file (`~/.config/library-admin/config.json`)
pub fn global_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| LibraryError::config_error("Could not determine user config directory"))?;

    Ok(config_dir.join("library-admin").join("config.json"))
}

/// Load a config file; a missing file yields an empty config
pub fn load_file_config(path: &Path) -> Result<FileConfig> {
    if !path.exists() {
        return Ok(FileConfig::default());
    }

    let contents = fs::read_to_string(path)
        .map_err(|e| LibraryError::config_error(format!("Could not read config file: {e}")))?;

    serde_json::from_str(&contents)
        .map_err(|e| LibraryError::config_error(format!("Invalid config file format: {e}")))
}

/// Load global then local config, local taking precedence
pub fn load_with_precedence() -> Result<FileConfig> {
    let global = load_file_config(&global_config_path()?)?;
    let local = load_file_config(&local_config_path()?)?;
    Ok(global.merged_with(local))
}

/// Resolve settings from the config files, the process environment and CLI flags
pub fn resolve_settings(overrides: &ConnectionOverrides) -> Result<Settings> {
    let file = load_with_precedence()?;
    resolve_from(file, |key| std::env::var(key).ok(), overrides)
}

/// Resolve settings from explicit sources
///
/// `env` looks up a variable by name; empty values count as unset.
pub fn resolve_from<F>(
    file: FileConfig,
    env: F,
    overrides: &ConnectionOverrides,
) -> Result<Settings>
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| env(key).filter(|v| !v.is_empty());

    let env_port = match lookup(ENV_PORT) {
        Some(raw) => Some(raw.trim().parse::<u16>().map_err(|_| {
            LibraryError::config_error(format!("{ENV_PORT} must be a port number, got '{raw}'"))
        })?),
        None => None,
    };

    // `password_env` is only consulted when no flag or DB_PASSWORD is given
    let password = match overrides.password.clone().or_else(|| lookup(ENV_PASSWORD)) {
        Some(password) => password,
        None => match &file.connection.password_env {
            Some(var) => lookup(var).ok_or_else(|| {
                LibraryError::config_error(format!(
                    "Environment variable {var} not found for password"
                ))
            })?,
            None => file
                .connection
                .password
                .clone()
                .unwrap_or_else(|| DEFAULT_PASSWORD.to_string()),
        },
    };

    let connection = ConnectionConfig {
        host: overrides
            .host
            .clone()
            .or_else(|| lookup(ENV_HOST))
            .or(file.connection.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string()),
        port: overrides.port.or(env_port).or(file.connection.port).unwrap_or(DEFAULT_PORT),
        database: overrides
            .database
            .clone()
            .or_else(|| lookup(ENV_DATABASE))
            .or(file.connection.database)
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
        user: overrides
            .user
            .clone()
            .or_else(|| lookup(ENV_USER))
            .or(file.connection.user)
            .unwrap_or_else(|| DEFAULT_USER.to_string()),
        password,
    };

    let attempts = file.connect_attempts.unwrap_or(DEFAULT_CONNECT_ATTEMPTS);
    if attempts == 0 {
        return Err(LibraryError::config_error("connect_attempts must be at least 1"));
    }

    let fine_per_day = file.fine_per_day.unwrap_or(DEFAULT_FINE_PER_DAY);
    if fine_per_day < 0 {
        return Err(LibraryError::config_error("fine_per_day cannot be negative"));
    }

    Ok(Settings {
        connection,
        retry: RetryPolicy {
            attempts,
            delay: Duration::from_millis(file.retry_delay_ms.unwrap_or(DEFAULT_RETRY_DELAY_MS)),
        },
        fine_per_day,
    })
}
