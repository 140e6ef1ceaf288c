//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `knobhub.toml` in the working directory, or the file named by
//! `KNOBHUB_CONFIG`. Every field has a sensible default so the file is
//! optional. Environment variables take precedence over file values.
//!
//! App slots are kept as raw TOML tables and deserialised one by one, so a
//! malformed `[[apps]]` entry is skipped instead of failing the whole file.

use serde::Deserialize;

use knobhub_domain::slot::AppSlot;

const DEFAULT_PATH: &str = "knobhub.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Knob and render loop settings.
    pub knob: KnobConfig,
    /// Raw `[[apps]]` entries.
    pub apps: Vec<toml::Value>,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Knob configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct KnobConfig {
    /// Interval between two render samples, in milliseconds.
    pub render_interval_ms: u64,
    /// App to activate at startup. Defaults to the first one in the menu.
    pub initial_app: Option<String>,
}

impl Config {
    /// Load configuration from `knobhub.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("KNOBHUB_CONFIG").unwrap_or_else(|_| DEFAULT_PATH.to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_env_overrides();
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

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("KNOBHUB_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("KNOBHUB_RENDER_INTERVAL_MS") {
            if let Ok(interval) = val.parse() {
                self.knob.render_interval_ms = interval;
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.knob.render_interval_ms == 0 {
            return Err(ConfigError::Validation(
                "render interval must be non-zero".to_string(),
            ));
        }
        if self
            .knob
            .initial_app
            .as_deref()
            .is_some_and(str::is_empty)
        {
            return Err(ConfigError::Validation(
                "initial app must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// The `[[apps]]` entries that deserialise into slots.
    ///
    /// Malformed entries are logged and skipped. Kind and id checks happen
    /// later, when the registry builds the apps.
    #[must_use]
    pub fn app_slots(&self) -> Vec<AppSlot> {
        self.apps
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| match entry.clone().try_into::<AppSlot>() {
                Ok(slot) => Some(slot),
                Err(err) => {
                    tracing::warn!(index, error = %err, "skipping malformed app entry");
                    None
                }
            })
            .collect()
    }

    /// Render loop interval.
    #[must_use]
    pub fn render_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.knob.render_interval_ms)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "knobhubd=info,knobhub_app=info".to_string(),
        }
    }
}

impl Default for KnobConfig {
    fn default() -> Self {
        Self {
            render_interval_ms: 100,
            initial_app: None,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
