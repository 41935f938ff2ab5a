//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `soundboard.toml` in the working directory. Every field has a
//! default so the file is optional. Environment variables take precedence
//! over file values.

use std::path::PathBuf;

use chrono_tz::Tz;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub engine: EngineConfig,
    pub sounds: SoundsConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL.
    pub url: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Routine engine settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// IANA zone the `time` and `date` condition atoms are evaluated in.
    pub timezone: String,
    pub voice_bus_capacity: usize,
    pub effect_bus_capacity: usize,
}

/// Sound library layout: `<dir>/<guild id>/` then `<dir>/global/`.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SoundsConfig {
    pub dir: PathBuf,
}

impl Config {
    /// Load configuration from `soundboard.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("soundboard.toml")?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("SOUNDBOARD_HOST") {
            self.server.host = val;
        }
        if let Some(port) = var("SOUNDBOARD_PORT").and_then(|val| val.parse().ok()) {
            self.server.port = port;
        }
        if let Some(val) = var("SOUNDBOARD_BIND")
            && let Some((host, port)) = val.rsplit_once(':')
        {
            self.server.host = host.to_string();
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = var("SOUNDBOARD_DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = var("SOUNDBOARD_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("SOUNDBOARD_TIMEZONE") {
            self.engine.timezone = val;
        }
        if let Some(val) = var("SOUNDBOARD_SOUNDS_DIR") {
            self.sounds.dir = PathBuf::from(val);
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.engine.voice_bus_capacity == 0 || self.engine.effect_bus_capacity == 0 {
            return Err(ConfigError::Validation(
                "bus capacities must be non-zero".to_string(),
            ));
        }
        self.timezone()?;
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// The configured time zone.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for an unknown zone name.
    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        self.engine.timezone.parse().map_err(|_| {
            ConfigError::Validation(format!("unknown time zone {:?}", self.engine.timezone))
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:soundboard.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "soundboardd=info,soundboard=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
            voice_bus_capacity: 256,
            effect_bus_capacity: 256,
        }
    }
}

impl Default for SoundsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("sounds"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
        assert_eq!(config.database.url, "sqlite:soundboard.db?mode=rwc");
        assert_eq!(config.timezone().unwrap(), Tz::UTC);
        assert_eq!(config.engine.voice_bus_capacity, 256);
        assert_eq!(config.sounds.dir, PathBuf::from("sounds"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [server]
            host = '127.0.0.1'
            port = 9090

            [database]
            url = 'sqlite:test.db'

            [logging]
            filter = 'debug'

            [engine]
            timezone = 'Europe/Paris'
            voice_bus_capacity = 32
            effect_bus_capacity = 64

            [sounds]
            dir = '/srv/sounds'
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:9090");
        assert_eq!(config.database.url, "sqlite:test.db");
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(config.timezone().unwrap(), chrono_tz::Europe::Paris);
        assert_eq!(config.engine.effect_bus_capacity, 64);
        assert_eq!(config.sounds.dir, PathBuf::from("/srv/sounds"));
    }

    #[test]
    fn should_parse_partial_toml_with_defaults() {
        let config: Config = toml::from_str("[server]\nport = 8080").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.engine.timezone, "UTC");
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        assert!(toml::from_str::<Config>("invalid {{{").is_err());
    }

    #[test]
    fn should_let_environment_override_file_values() {
        let mut config = Config::default();
        config.apply_env_overrides(env(&[
            ("SOUNDBOARD_BIND", "127.0.0.1:4000"),
            ("SOUNDBOARD_DATABASE_URL", "sqlite::memory:"),
            ("SOUNDBOARD_TIMEZONE", "America/New_York"),
            ("SOUNDBOARD_SOUNDS_DIR", "/tmp/sounds"),
            ("SOUNDBOARD_LOG", "warn"),
        ]));
        assert_eq!(config.bind_addr(), "127.0.0.1:4000");
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.timezone().unwrap(), chrono_tz::America::New_York);
        assert_eq!(config.sounds.dir, PathBuf::from("/tmp/sounds"));
        assert_eq!(config.logging.filter, "warn");
    }

    #[test]
    fn should_prefer_rust_log_over_soundboard_log() {
        let mut config = Config::default();
        config.apply_env_overrides(env(&[("SOUNDBOARD_LOG", "warn"), ("RUST_LOG", "trace")]));
        assert_eq!(config.logging.filter, "trace");
    }

    #[test]
    fn should_ignore_unparseable_port_override() {
        let mut config = Config::default();
        config.apply_env_overrides(env(&[("SOUNDBOARD_PORT", "eighty")]));
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn should_reject_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_unknown_timezone() {
        let mut config = Config::default();
        config.engine.timezone = "Mars/Olympus".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(msg)) if msg.contains("Mars/Olympus")
        ));
    }

    #[test]
    fn should_reject_zero_capacity() {
        let mut config = Config::default();
        config.engine.voice_bus_capacity = 0;
        assert!(config.validate().is_err());
    }
}
