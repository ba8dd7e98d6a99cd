//! Configuration file loading and management.
//!
//! Loads configuration from:
//! - Linux: `~/.config/flowsense/config.toml`
//! - macOS: `~/Library/Application Support/com.flowsense.flowsense/config.toml`
//! - Windows: `%APPDATA%/flowsense/flowsense/config/config.toml`
//!
//! ## Precedence
//!
//! Settings are resolved with the following precedence (highest first):
//! 1. CLI flags
//! 2. Environment variables
//! 3. Config file
//! 4. Built-in defaults
//!
//! ## Environment Variables
//!
//! - `FLOWSENSE_CONFIG`: Override config file path
//! - `FLOWSENSE_DB`: Record database path
//! - `FLOWSENSE_FORMAT`: Output format (human, json, md)
//! - `FLOWSENSE_TIMEOUT`: Extraction timeout in seconds
//! - `FLOWSENSE_NO_COLOR` or `NO_COLOR`: Disable colors
//! - `FLOWSENSE_PRETTY`: Pretty-print JSON output
//! - `OPENAI_API_KEY`: Vision API key (variable name configurable)
//! - `FLOWSENSE_VISION_MODEL`, `FLOWSENSE_VISION_BASE_URL`: Vision endpoint
//! - `FLOWSENSE_OCR_ENABLED`, `FLOWSENSE_OCR_BINARY`: OCR fallback

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::cli::args::{Cli, OutputFormat};
use crate::core::ocr;
use crate::core::pipeline::ExtractionConfig;
use crate::core::vision;
use crate::error::{FlowError, Result};

// =============================================================================
// Environment Variable Names
// =============================================================================

/// Environment variable to override config file path.
pub const ENV_CONFIG: &str = "FLOWSENSE_CONFIG";
/// Environment variable for the database path.
pub const ENV_DB: &str = "FLOWSENSE_DB";
/// Environment variable for output format.
pub const ENV_FORMAT: &str = "FLOWSENSE_FORMAT";
/// Environment variable for extraction timeout in seconds.
pub const ENV_TIMEOUT: &str = "FLOWSENSE_TIMEOUT";
/// Environment variable to disable colors.
pub const ENV_NO_COLOR: &str = "FLOWSENSE_NO_COLOR";
/// Standard environment variable to disable colors.
pub const ENV_NO_COLOR_STD: &str = "NO_COLOR";
/// Environment variable for pretty JSON output.
pub const ENV_PRETTY: &str = "FLOWSENSE_PRETTY";
pub const ENV_VISION_MODEL: &str = "FLOWSENSE_VISION_MODEL";
pub const ENV_VISION_BASE_URL: &str = "FLOWSENSE_VISION_BASE_URL";
pub const ENV_OCR_ENABLED: &str = "FLOWSENSE_OCR_ENABLED";
pub const ENV_OCR_BINARY: &str = "FLOWSENSE_OCR_BINARY";
/// Default name of the variable holding the vision API key.
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Accepted timeout range in seconds.
pub const MIN_TIMEOUT_SECS: u64 = 1;
pub const MAX_TIMEOUT_SECS: u64 = 300;

// =============================================================================
// Resolved Configuration
// =============================================================================

/// Fully resolved configuration after merging CLI, env vars, and config file.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Config file that was consulted (it may not exist).
    pub config_path: PathBuf,
    /// Record database file.
    pub database_path: PathBuf,
    pub format: OutputFormat,
    /// Caller-level extraction timeout.
    pub timeout: Duration,
    pub no_color: bool,
    pub pretty: bool,
    /// Settings for building the extraction pipeline.
    pub extraction: ExtractionConfig,
    /// Source of each setting for debugging.
    pub sources: ConfigSources,
}

/// Tracks the source of each configuration value.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    pub database: ConfigSource,
    pub format: ConfigSource,
    pub timeout: ConfigSource,
    pub no_color: ConfigSource,
    pub pretty: ConfigSource,
    pub api_key: ConfigSource,
    pub ocr_enabled: ConfigSource,
}

/// Where a configuration value came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Value from CLI flag.
    Cli,
    /// Value from environment variable.
    Env,
    /// Value from config file.
    ConfigFile,
    /// Built-in default.
    #[default]
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI flag"),
            Self::Env => write!(f, "environment variable"),
            Self::ConfigFile => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

impl ResolvedConfig {
    /// Resolve final configuration from CLI args, the process environment,
    /// and the config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but is invalid, or any
    /// resolved value is out of range.
    pub fn resolve(cli: &Cli) -> Result<Self> {
        Self::resolve_with(cli, |key| std::env::var(key).ok())
    }

    /// Resolve against an explicit environment lookup.
    ///
    /// # Errors
    ///
    /// Same as [`Self::resolve`].
    pub fn resolve_with(cli: &Cli, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let config_path = Config::locate(&env);
        let config = Config::load_from(&config_path)?;
        config.validate()?;

        let mut sources = ConfigSources::default();

        let database_path = Self::resolve_database(cli, &config, &env, &mut sources.database);
        let format = Self::resolve_format(cli, &config, &env, &mut sources.format)?;
        let timeout = Self::resolve_timeout(&config, &env, &mut sources.timeout)?;
        let no_color = Self::resolve_no_color(cli, &config, &env, &mut sources.no_color);
        let pretty = Self::resolve_pretty(cli, &config, &env, &mut sources.pretty);
        let extraction = Self::resolve_extraction(&config, &env, &mut sources)?;

        tracing::debug!(
            config = %config_path.display(),
            database = %database_path.display(),
            database_source = %sources.database,
            timeout_secs = timeout.as_secs(),
            api_key_source = %sources.api_key,
            "Configuration resolved"
        );

        Ok(Self {
            config_path,
            database_path,
            format,
            timeout,
            no_color,
            pretty,
            extraction,
            sources,
        })
    }

    fn resolve_database(
        cli: &Cli,
        config: &Config,
        env: &impl Fn(&str) -> Option<String>,
        source: &mut ConfigSource,
    ) -> PathBuf {
        if let Some(path) = &cli.db {
            *source = ConfigSource::Cli;
            return path.clone();
        }

        if let Some(path) = env(ENV_DB).filter(|p| !p.trim().is_empty()) {
            *source = ConfigSource::Env;
            return PathBuf::from(path);
        }

        if let Some(path) = &config.storage.database_path {
            *source = ConfigSource::ConfigFile;
            return path.clone();
        }

        *source = ConfigSource::Default;
        AppPaths::new().database_file()
    }

    fn resolve_format(
        cli: &Cli,
        config: &Config,
        env: &impl Fn(&str) -> Option<String>,
        source: &mut ConfigSource,
    ) -> Result<OutputFormat> {
        // --json is shorthand for --format json
        if cli.json {
            *source = ConfigSource::Cli;
            return Ok(OutputFormat::Json);
        }

        if let Some(format) = cli.format {
            *source = ConfigSource::Cli;
            return Ok(format);
        }

        if let Some(format_env) = env(ENV_FORMAT) {
            *source = ConfigSource::Env;
            return parse_format(ENV_FORMAT, &format_env);
        }

        if let Some(format_str) = &config.output.format {
            *source = ConfigSource::ConfigFile;
            return parse_format("output.format", format_str);
        }

        *source = ConfigSource::Default;
        Ok(OutputFormat::Human)
    }

    fn resolve_timeout(
        config: &Config,
        env: &impl Fn(&str) -> Option<String>,
        source: &mut ConfigSource,
    ) -> Result<Duration> {
        if let Some(timeout_env) = env(ENV_TIMEOUT) {
            let seconds = timeout_env
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|s| (MIN_TIMEOUT_SECS..=MAX_TIMEOUT_SECS).contains(s))
                .ok_or_else(|| FlowError::ConfigInvalid {
                    key: ENV_TIMEOUT.to_string(),
                    value: timeout_env.clone(),
                    message: format!(
                        "must be a whole number of seconds between {MIN_TIMEOUT_SECS} and {MAX_TIMEOUT_SECS}"
                    ),
                })?;
            *source = ConfigSource::Env;
            return Ok(Duration::from_secs(seconds));
        }

        *source = ConfigSource::ConfigFile;
        Ok(Duration::from_secs(config.general.timeout_seconds))
    }

    fn resolve_no_color(
        cli: &Cli,
        config: &Config,
        env: &impl Fn(&str) -> Option<String>,
        source: &mut ConfigSource,
    ) -> bool {
        if cli.no_color {
            *source = ConfigSource::Cli;
            return true;
        }

        if is_truthy(env(ENV_NO_COLOR).as_deref()) || env(ENV_NO_COLOR_STD).is_some() {
            *source = ConfigSource::Env;
            return true;
        }

        // config.output.color = false means no_color = true
        if !config.output.color {
            *source = ConfigSource::ConfigFile;
            return true;
        }

        *source = ConfigSource::Default;
        false
    }

    fn resolve_pretty(
        cli: &Cli,
        config: &Config,
        env: &impl Fn(&str) -> Option<String>,
        source: &mut ConfigSource,
    ) -> bool {
        if cli.pretty {
            *source = ConfigSource::Cli;
            return true;
        }

        if is_truthy(env(ENV_PRETTY).as_deref()) {
            *source = ConfigSource::Env;
            return true;
        }

        if config.output.pretty {
            *source = ConfigSource::ConfigFile;
            return true;
        }

        *source = ConfigSource::Default;
        false
    }

    fn resolve_extraction(
        config: &Config,
        env: &impl Fn(&str) -> Option<String>,
        sources: &mut ConfigSources,
    ) -> Result<ExtractionConfig> {
        let api_key = env(&config.vision.api_key_env).filter(|key| !key.trim().is_empty());
        sources.api_key = if api_key.is_some() {
            ConfigSource::Env
        } else {
            ConfigSource::Default
        };

        let model = env(ENV_VISION_MODEL).unwrap_or_else(|| config.vision.model.clone());
        if model.trim().is_empty() {
            return Err(FlowError::ConfigInvalid {
                key: ENV_VISION_MODEL.to_string(),
                value: model,
                message: "model name must not be empty".to_string(),
            });
        }

        let ocr_enabled = match env(ENV_OCR_ENABLED) {
            Some(value) => {
                sources.ocr_enabled = ConfigSource::Env;
                is_truthy(Some(&value))
            }
            None => {
                sources.ocr_enabled = ConfigSource::ConfigFile;
                config.ocr.enabled
            }
        };

        Ok(ExtractionConfig {
            vision_enabled: config.vision.enabled,
            api_key,
            model,
            base_url: env(ENV_VISION_BASE_URL).unwrap_or_else(|| config.vision.base_url.clone()),
            max_tokens: config.vision.max_tokens,
            temperature: config.vision.temperature,
            ocr_enabled,
            ocr_binary: env(ENV_OCR_BINARY).unwrap_or_else(|| config.ocr.binary.clone()),
            ocr_language: config.ocr.language.clone(),
        })
    }
}

/// Parse a format string into `OutputFormat`.
fn parse_format(key: &str, s: &str) -> Result<OutputFormat> {
    match s.trim().to_lowercase().as_str() {
        "human" => Ok(OutputFormat::Human),
        "json" => Ok(OutputFormat::Json),
        "md" | "markdown" => Ok(OutputFormat::Md),
        _ => Err(FlowError::ConfigInvalid {
            key: key.to_string(),
            value: s.to_string(),
            message: "valid formats: human, json, md".to_string(),
        }),
    }
}

/// Whether an environment value reads as "on".
fn is_truthy(value: Option<&str>) -> bool {
    value.is_some_and(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

// =============================================================================
// Config File
// =============================================================================

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub vision: VisionConfig,
    pub ocr: OcrConfig,
    pub storage: StorageConfig,
    pub output: OutputConfig,
}

/// General application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Caller-level extraction timeout in seconds.
    pub timeout_seconds: u64,
}

/// Vision extraction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    pub enabled: bool,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// OCR fallback settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    pub enabled: bool,
    pub binary: String,
    pub language: String,
}

/// Record storage settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Database file; defaults to the platform data directory.
    pub database_path: Option<PathBuf>,
}

/// Output formatting configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format (human, json, md).
    pub format: Option<String>,
    /// Whether to use colors in output.
    pub color: bool,
    /// Whether to pretty-print JSON output.
    pub pretty: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
        }
    }
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            model: vision::DEFAULT_MODEL.to_string(),
            base_url: vision::DEFAULT_BASE_URL.to_string(),
            max_tokens: vision::DEFAULT_MAX_TOKENS,
            temperature: vision::DEFAULT_TEMPERATURE,
        }
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            binary: ocr::DEFAULT_BINARY.to_string(),
            language: ocr::DEFAULT_LANGUAGE.to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: None,
            color: true,
            pretty: false,
        }
    }
}

impl Config {
    /// Load configuration from a specific path.
    ///
    /// Returns default config if the file doesn't exist.
    /// Returns error only if the file exists but is invalid.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(?path, "Config file not found, using defaults");
            return Ok(Self::default());
        }

        tracing::debug!(?path, "Loading config file");
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| FlowError::ConfigParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| FlowError::Config(format!("Failed to serialize config: {e}")))?;

        fs::write(path, content)?;
        tracing::debug!(?path, "Config file saved");
        Ok(())
    }

    /// Get the default config file path.
    #[must_use]
    pub fn config_path() -> PathBuf {
        AppPaths::new().config_file()
    }

    /// Config file named by `FLOWSENSE_CONFIG`, else the default path.
    #[must_use]
    pub fn locate(env: impl Fn(&str) -> Option<String>) -> PathBuf {
        env(ENV_CONFIG).map_or_else(Self::config_path, PathBuf::from)
    }

    /// Validate configuration values.
    ///
    /// Checks that:
    /// - Output format is valid (human, json, md)
    /// - Timeout is within 1-300 seconds
    /// - Vision model and key variable are named
    /// - Sampling settings are usable
    pub fn validate(&self) -> Result<()> {
        if let Some(format) = &self.output.format {
            parse_format("output.format", format)?;
        }

        let timeout = self.general.timeout_seconds;
        if !(MIN_TIMEOUT_SECS..=MAX_TIMEOUT_SECS).contains(&timeout) {
            return Err(invalid(
                "general.timeout_seconds",
                timeout,
                "Timeout must be between 1 and 300 seconds",
            ));
        }

        if self.vision.model.trim().is_empty() {
            return Err(invalid("vision.model", "", "model name must not be empty"));
        }
        if self.vision.api_key_env.trim().is_empty() {
            return Err(invalid(
                "vision.api_key_env",
                "",
                "must name an environment variable",
            ));
        }
        if self.vision.max_tokens == 0 {
            return Err(invalid("vision.max_tokens", 0, "must be greater than 0"));
        }
        if !(0.0..=2.0).contains(&self.vision.temperature) {
            return Err(invalid(
                "vision.temperature",
                self.vision.temperature,
                "must be between 0.0 and 2.0",
            ));
        }
        if self.ocr.binary.trim().is_empty() {
            return Err(invalid("ocr.binary", "", "must not be empty"));
        }

        Ok(())
    }
}

fn invalid(key: &str, value: impl ToString, message: &str) -> FlowError {
    FlowError::ConfigInvalid {
        key: key.to_string(),
        value: value.to_string(),
        message: message.to_string(),
    }
}
