// src/utils/config.rs
//! Layered configuration for the render pool
//!
//! Precedence, lowest first: built-in defaults, an optional config file,
//! `RENDER_POOL__*` environment variables, then the legacy deployment
//! variables (`MESOS_TASK_ID`, `REDIS_HOST`, `REDIS_PORT`).
//!
//! Environment is read once by [`PoolSettings::load`]; the pool itself only
//! ever sees the resolved [`PoolConfig`] and [`DebugSinkConfig`].

use crate::utils::errors::{PoolError, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::ffi::OsString;
use std::path::Path;
use std::time::Duration;

pub const TASK_ID_VAR: &str = "MESOS_TASK_ID";
pub const REDIS_HOST_VAR: &str = "REDIS_HOST";
pub const REDIS_PORT_VAR: &str = "REDIS_PORT";

const ENV_PREFIX: &str = "RENDER_POOL";
const DEFAULT_SLOTS: usize = 4;
const DEFAULT_VERBOSITY: u8 = 1;
const DEFAULT_REDIS_HOST: &str = "127.0.0.1";
const DEFAULT_REDIS_PORT: u16 = 6379;
const DEFAULT_STORE_TIMEOUT_SECS: u64 = 10;
const DEFAULT_KEY_PREFIX: &str = "render-urls";

/// Top-level settings
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct PoolSettings {
    pub pool: PoolConfig,
    pub debug: DebugSinkConfig,
    pub logging: LoggingSettings,
}

/// Slot pool configuration
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PoolConfig {
    /// Number of concurrent render slots (default: 4)
    pub slots: usize,

    /// Log chattiness; lifecycle events are emitted from 2 upwards
    pub verbosity: u8,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            slots: DEFAULT_SLOTS,
            verbosity: DEFAULT_VERBOSITY,
        }
    }
}

impl PoolConfig {
    pub fn with_slots(slots: usize) -> Self {
        Self {
            slots,
            ..Default::default()
        }
    }

    pub fn verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.slots == 0 {
            return Err(PoolError::invalid_config("pool.slots must be at least 1"));
        }
        Ok(())
    }
}

/// Debug snapshot store configuration
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DebugSinkConfig {
    /// Publish snapshots to the store at all
    pub enabled: bool,

    pub host: String,
    pub port: u16,
    pub db: i64,

    /// Deployment task identifier; a fresh ULID is used when absent
    pub task_id: Option<String>,

    pub key_prefix: String,
    pub connect_timeout_secs: u64,
    pub io_timeout_secs: u64,
}

impl Default for DebugSinkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: DEFAULT_REDIS_HOST.to_string(),
            port: DEFAULT_REDIS_PORT,
            db: 0,
            task_id: None,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            connect_timeout_secs: DEFAULT_STORE_TIMEOUT_SECS,
            io_timeout_secs: DEFAULT_STORE_TIMEOUT_SECS,
        }
    }
}

impl DebugSinkConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn io_timeout(&self) -> Duration {
        Duration::from_secs(self.io_timeout_secs)
    }

    pub fn redis_url(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db)
    }

    /// Store key for this process, fixed for the lifetime of the pool
    pub fn debug_key(&self) -> String {
        let task_id = self
            .task_id
            .clone()
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| ulid::Ulid::new().to_string());
        format!("{}-{}", self.key_prefix, task_id)
    }

    pub fn validate(&self) -> Result<()> {
        if self.enabled && (self.connect_timeout_secs == 0 || self.io_timeout_secs == 0) {
            return Err(PoolError::invalid_config(
                "debug store timeouts must be greater than zero",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default directive when `RUST_LOG` is not set
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

impl PoolSettings {
    /// Load settings from defaults, an optional file and the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        let mut settings: PoolSettings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.apply_legacy_env(utf8_vars(std::env::vars_os()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Apply the deployment variables the debug store has always honoured
    pub fn apply_legacy_env<I>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (name, value) in vars {
            match name.as_str() {
                TASK_ID_VAR if !value.is_empty() => self.debug.task_id = Some(value),
                REDIS_HOST_VAR if !value.is_empty() => self.debug.host = value,
                REDIS_PORT_VAR if !value.is_empty() => {
                    self.debug.port = value.parse().map_err(|_| {
                        PoolError::invalid_config(format!(
                            "{REDIS_PORT_VAR} is not a port: {value}"
                        ))
                    })?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.pool.validate()?;
        self.debug.validate()
    }
}

/// Environment entries whose name or value is not valid UTF-8 are skipped
fn utf8_vars<I>(vars: I) -> impl Iterator<Item = (String, String)>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    vars.into_iter()
        .filter_map(|(name, value)| Some((name.into_string().ok()?, value.into_string().ok()?)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let settings = PoolSettings::default();
        assert_eq!(settings.pool.slots, 4);
        assert_eq!(settings.pool.verbosity, 1);
        assert_eq!(settings.debug.host, "127.0.0.1");
        assert_eq!(settings.debug.port, 6379);
        assert_eq!(settings.debug.connect_timeout(), Duration::from_secs(10));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_zero_slots_rejected() {
        let config = PoolConfig::with_slots(0);
        assert!(matches!(config.validate(), Err(PoolError::InvalidConfig(_))));
    }

    #[test]
    fn test_legacy_env_overrides() {
        let mut settings = PoolSettings::default();
        settings
            .apply_legacy_env(vars(&[
                ("MESOS_TASK_ID", "task-42"),
                ("REDIS_HOST", "redis.internal"),
                ("REDIS_PORT", "6380"),
                ("UNRELATED", "x"),
            ]))
            .unwrap();

        assert_eq!(settings.debug.task_id.as_deref(), Some("task-42"));
        assert_eq!(settings.debug.host, "redis.internal");
        assert_eq!(settings.debug.port, 6380);
        assert_eq!(settings.debug.debug_key(), "render-urls-task-42");
    }

    #[test]
    fn test_empty_legacy_port_keeps_default() {
        let mut settings = PoolSettings::default();
        settings.apply_legacy_env(vars(&[("REDIS_PORT", "")])).unwrap();
        assert_eq!(settings.debug.port, 6379);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_env_entries_are_skipped() {
        use std::os::unix::ffi::OsStringExt;

        let raw = vec![
            (
                OsString::from("MESOS_TASK_ID"),
                OsString::from_vec(vec![0x74, 0xff, 0x31]),
            ),
            (OsString::from_vec(vec![0xfe, 0x41]), OsString::from("x")),
            (OsString::from("REDIS_HOST"), OsString::from("redis.internal")),
        ];

        let mut settings = PoolSettings::default();
        settings.apply_legacy_env(utf8_vars(raw)).unwrap();

        assert_eq!(settings.debug.task_id, None);
        assert_eq!(settings.debug.host, "redis.internal");
    }

    #[test]
    fn test_bad_legacy_port() {
        let mut settings = PoolSettings::default();
        let result = settings.apply_legacy_env(vars(&[("REDIS_PORT", "redis")]));
        assert!(matches!(result, Err(PoolError::InvalidConfig(_))));
    }

    #[test]
    fn test_debug_key_without_task_id_is_unique() {
        let config = DebugSinkConfig::default();
        let a = config.debug_key();
        let b = config.debug_key();
        assert!(a.starts_with("render-urls-"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[pool]
slots = 8
verbosity = 2

[debug]
enabled = false
key_prefix = "splash-urls"

[logging]
format = "json"
"#
        )
        .unwrap();

        let settings = PoolSettings::load(Some(file.path())).unwrap();
        assert_eq!(settings.pool.slots, 8);
        assert_eq!(settings.pool.verbosity, 2);
        assert!(!settings.debug.enabled);
        assert_eq!(settings.debug.key_prefix, "splash-urls");
        assert_eq!(settings.logging.format, LogFormat::Json);
    }
}
