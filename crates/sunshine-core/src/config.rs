use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a message summarizing all errors
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application configuration directory
    pub config_dir: PathBuf,

    /// Companion sync settings
    #[serde(default)]
    pub sync: SyncConfig,

    /// Watch face layout, colors and timing
    #[serde(default)]
    pub face: FaceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Data item path carrying today's weather
    #[serde(default = "default_weather_path")]
    pub weather_path: String,

    /// Upper bound on a blocking connect to the sync channel
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_weather_path() -> String {
    "/today-weather".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    30
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            weather_path: default_weather_path(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl SyncConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Layout dimensions are in pixels, colors are ARGB.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceConfig {
    /// Redraw period while interactive
    pub interactive_update_ms: u64,

    pub x_offset: f32,
    pub x_offset_round: f32,
    pub y_offset: f32,

    /// Clock text size
    pub text_size: f32,
    pub text_size_round: f32,

    pub date_text_size: f32,
    pub temp_text_size: f32,

    /// Vertical gap between the clock baseline and the date
    pub line_height: f32,
    /// Vertical gap below the rule under the date
    pub line_width: f32,
    /// Horizontal gap between high, low and the condition label
    pub temp_space_width: f32,

    pub time_color: u32,
    pub background_color: u32,
    /// Background color after an odd number of taps
    pub background_color_alt: u32,
}

impl Default for FaceConfig {
    fn default() -> Self {
        Self {
            interactive_update_ms: 1000,
            x_offset: 15.0,
            x_offset_round: 25.0,
            y_offset: 80.0,
            text_size: 40.0,
            text_size_round: 45.0,
            date_text_size: 20.0,
            temp_text_size: 24.0,
            line_height: 25.0,
            line_width: 10.0,
            temp_space_width: 10.0,
            time_color: 0xFFFF_FFFF,
            background_color: 0xFF00_00FF,
            background_color_alt: 0xFF1E_88E5,
        }
    }
}

impl FaceConfig {
    pub fn interactive_update_rate(&self) -> Duration {
        Duration::from_millis(self.interactive_update_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sunshine-wear");

        Self {
            config_dir,
            sync: SyncConfig::default(),
            face: FaceConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, creating default if it doesn't exist
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            let mut config = Self::default();
            if let Some(parent) = config_path.parent() {
                config.config_dir = parent.to_path_buf();
            }
            config.save_to(config_path)?;
            return Ok(config);
        }

        let contents =
            std::fs::read_to_string(config_path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        if !self.sync.weather_path.starts_with('/') {
            result.add_error(
                "sync.weather_path",
                format!(
                    "Data item path must be absolute, got: {:?}",
                    self.sync.weather_path
                ),
            );
        }

        if self.sync.connect_timeout_secs == 0 {
            result.add_error(
                "sync.connect_timeout_secs",
                "Connect timeout must be greater than 0",
            );
        } else if self.sync.connect_timeout_secs > 120 {
            result.add_warning(
                "sync.connect_timeout_secs",
                "Connect timeout is unusually long (>120s)",
            );
        }

        if self.face.interactive_update_ms == 0 {
            result.add_error(
                "face.interactive_update_ms",
                "Update interval must be greater than 0",
            );
        } else if self.face.interactive_update_ms > 60_000 {
            result.add_warning(
                "face.interactive_update_ms",
                "Update interval is more than a minute; seconds will lag",
            );
        }

        let text_sizes = [
            ("face.text_size", self.face.text_size),
            ("face.text_size_round", self.face.text_size_round),
            ("face.date_text_size", self.face.date_text_size),
            ("face.temp_text_size", self.face.temp_text_size),
        ];
        for (field, size) in text_sizes {
            if size.is_nan() || size <= 0.0 {
                result.add_error(field, "Text size must be positive");
            }
        }

        if self.face.background_color == self.face.background_color_alt {
            result.add_warning(
                "face.background_color_alt",
                "Tap accent color equals the background; taps will have no visible effect",
            );
        }

        result
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Ensure config directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("sunshine-wear");

        Ok(config_dir.join("config.toml"))
    }
}
