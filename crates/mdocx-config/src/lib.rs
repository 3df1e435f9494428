//! Configuration management for mdocx.
//!
//! Parses `mdocx.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use mdocx_diagrams::{
    DEFAULT_COMMAND, DEFAULT_HEIGHT_PX, DEFAULT_MAX_CONCURRENT, DEFAULT_SERVICE_URL,
    DEFAULT_TIMEOUT, DEFAULT_WIDTH_PX, RenderingConfig, StrategyKind,
};

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "mdocx.toml";

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the strategy fallback order.
    pub strategy_order: Option<Vec<String>>,
    /// Override the remote rendering service URL.
    pub service_url: Option<String>,
    /// Override the Mermaid CLI command.
    pub command: Option<String>,
    /// Override the per-strategy timeout in seconds.
    pub timeout_secs: Option<u64>,
}

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Diagram rendering configuration.
    pub rendering: RenderingSection,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// The `[rendering]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RenderingSection {
    /// Strategies to attempt, in order.
    pub strategy_order: Vec<String>,
    /// Per-strategy timeout in seconds.
    pub timeout_secs: u64,
    /// Target image width in pixels.
    pub width_px: u32,
    /// Target image height in pixels.
    pub height_px: u32,
    /// Bound on concurrent render attempts within one document.
    pub max_concurrent: usize,
    /// Optional deadline for a whole conversion, in seconds.
    pub conversion_timeout_secs: Option<u64>,
    /// Base URL of the remote rendering service.
    pub service_url: String,
    /// Mermaid CLI command.
    pub command: String,
}

impl Default for RenderingSection {
    fn default() -> Self {
        Self {
            strategy_order: vec!["local".to_owned(), "remote".to_owned()],
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            width_px: DEFAULT_WIDTH_PX,
            height_px: DEFAULT_HEIGHT_PX,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            conversion_timeout_secs: None,
            service_url: DEFAULT_SERVICE_URL.to_owned(),
            command: DEFAULT_COMMAND.to_owned(),
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `mdocx.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading, allowing CLI arguments to
    /// take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the resulting configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(order) = &settings.strategy_order {
            self.rendering.strategy_order.clone_from(order);
        }
        if let Some(service_url) = &settings.service_url {
            self.rendering.service_url.clone_from(service_url);
        }
        if let Some(command) = &settings.command {
            self.rendering.command.clone_from(command);
        }
        if let Some(timeout_secs) = settings.timeout_secs {
            self.rendering.timeout_secs = timeout_secs;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let r = &self.rendering;

        if r.strategy_order.is_empty() {
            return Err(ConfigError::Validation(
                "rendering.strategy_order cannot be empty".to_owned(),
            ));
        }
        for name in &r.strategy_order {
            if StrategyKind::parse(name).is_none() {
                return Err(ConfigError::Validation(format!(
                    "rendering.strategy_order: unknown strategy '{name}' (expected 'local' or 'remote')"
                )));
            }
        }

        if r.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "rendering.timeout_secs must be greater than 0".to_owned(),
            ));
        }
        if r.width_px == 0 || r.height_px == 0 {
            return Err(ConfigError::Validation(
                "rendering.width_px and rendering.height_px must be greater than 0".to_owned(),
            ));
        }
        if r.max_concurrent == 0 {
            return Err(ConfigError::Validation(
                "rendering.max_concurrent must be greater than 0".to_owned(),
            ));
        }
        if r.conversion_timeout_secs == Some(0) {
            return Err(ConfigError::Validation(
                "rendering.conversion_timeout_secs must be greater than 0".to_owned(),
            ));
        }

        require_non_empty(&r.service_url, "rendering.service_url")?;
        require_http_url(&r.service_url, "rendering.service_url")?;
        require_non_empty(&r.command, "rendering.command")?;

        Ok(())
    }

    /// Build the rendering configuration for one conversion.
    ///
    /// Call [`validate`](Self::validate) first (done by [`load`](Self::load));
    /// unknown strategy names are silently dropped here.
    #[must_use]
    pub fn to_rendering_config(&self) -> RenderingConfig {
        let r = &self.rendering;
        RenderingConfig {
            strategy_order: r
                .strategy_order
                .iter()
                .filter_map(|name| StrategyKind::parse(name))
                .collect(),
            per_strategy_timeout: Duration::from_secs(r.timeout_secs),
            image_width_px: r.width_px,
            image_height_px: r.height_px,
            max_concurrent_renders: r.max_concurrent,
            conversion_timeout: r.conversion_timeout_secs.map(Duration::from_secs),
            service_url: r.service_url.clone(),
            command: r.command.clone(),
        }
    }
}
