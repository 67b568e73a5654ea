#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for pkgmend
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/pkgmend/config.toml)
//! - Environment variables
//! - CLI flags

pub mod constants;

use pkgmend_errors::{ConfigError, Error};
use pkgmend_types::{ColorChoice, OutputFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub repair: RepairConfig,

    #[serde(default)]
    pub paths: PathConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub classify: ClassifyConfig,

    #[serde(default)]
    pub builder: BuilderConfig,
}

/// General configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_output_format")]
    pub default_output: OutputFormat,
    #[serde(default = "default_color_choice")]
    pub color: ColorChoice,
}

/// Round loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairConfig {
    #[serde(default = "default_round_cap")]
    pub round_cap: u32,
    /// Literal line that ends transcript processing with success
    #[serde(default = "default_success_banner")]
    pub success_banner: String,
    /// Clean-phase marker treated as success when the build exited zero
    #[serde(default = "default_clean_marker")]
    pub clean_marker: String,
}

/// Path configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PathConfig {
    pub output_dir: Option<PathBuf>,
    pub build_root: Option<PathBuf>,
}

/// Rule catalog sources
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CatalogConfig {
    /// Extra rule files merged over the built-in catalog, in order
    #[serde(default)]
    pub rule_files: Vec<PathBuf>,
    /// TOML table mapping installed file paths to owning packages
    pub file_owners: Option<PathBuf>,
}

/// File classification inputs
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ClassifyConfig {
    /// Ordered classification rules replacing the built-in list
    pub rule_file: Option<PathBuf>,
    #[serde(default)]
    pub setuid: Vec<String>,
    #[serde(default)]
    pub excludes: Vec<String>,
}

/// External build driver
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BuilderConfig {
    /// Program and arguments; the program receives the session through
    /// `PKGMEND_*` environment variables
    #[serde(default)]
    pub command: Vec<String>,
    /// Reverse-dependency query run after a successful session; the package
    /// name is appended as the last argument
    #[serde(default)]
    pub whatrequires: Vec<String>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_output: OutputFormat::Tty,
            color: ColorChoice::Auto,
        }
    }
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            round_cap: constants::DEFAULT_ROUND_CAP,
            success_banner: constants::DEFAULT_SUCCESS_BANNER.to_string(),
            clean_marker: constants::DEFAULT_CLEAN_MARKER.to_string(),
        }
    }
}

// Default value functions for serde
fn default_output_format() -> OutputFormat {
    OutputFormat::Tty
}

fn default_color_choice() -> ColorChoice {
    ColorChoice::Auto
}

fn default_round_cap() -> u32 {
    constants::DEFAULT_ROUND_CAP
}

fn default_success_banner() -> String {
    constants::DEFAULT_SUCCESS_BANNER.to_string()
}

fn default_clean_marker() -> String {
    constants::DEFAULT_CLEAN_MARKER.to_string()
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir
            .join(constants::CONFIG_DIR_NAME)
            .join(constants::CONFIG_FILE_NAME))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, contains invalid TOML,
    /// or carries values that fail validation.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        let config: Self = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if fs::try_exists(&config_path).await.unwrap_or(false) {
            Self::load_from_file(&config_path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        if let Ok(output) = std::env::var("PKGMEND_OUTPUT") {
            self.general.default_output = match output.as_str() {
                "plain" => OutputFormat::Plain,
                "tty" => OutputFormat::Tty,
                "json" => OutputFormat::Json,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "PKGMEND_OUTPUT".to_string(),
                        value: output,
                    }
                    .into())
                }
            };
        }

        if let Ok(color) = std::env::var("PKGMEND_COLOR") {
            self.general.color = match color.as_str() {
                "always" => ColorChoice::Always,
                "auto" => ColorChoice::Auto,
                "never" => ColorChoice::Never,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "PKGMEND_COLOR".to_string(),
                        value: color,
                    }
                    .into())
                }
            };
        }

        if let Ok(cap) = std::env::var("PKGMEND_ROUND_CAP") {
            self.repair.round_cap = cap
                .parse()
                .ok()
                .filter(|cap| *cap > 0)
                .ok_or(ConfigError::InvalidValue {
                    field: "PKGMEND_ROUND_CAP".to_string(),
                    value: cap,
                })?;
        }

        if let Ok(dir) = std::env::var("PKGMEND_OUTPUT_DIR") {
            if dir.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "PKGMEND_OUTPUT_DIR".to_string(),
                    value: dir,
                }
                .into());
            }
            self.paths.output_dir = Some(PathBuf::from(dir));
        }

        if let Ok(root) = std::env::var("PKGMEND_BUILD_ROOT") {
            if root.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "PKGMEND_BUILD_ROOT".to_string(),
                    value: root,
                }
                .into());
            }
            self.paths.build_root = Some(PathBuf::from(root));
        }

        if let Ok(command) = std::env::var("PKGMEND_BUILD_COMMAND") {
            let argv: Vec<String> = command.split_whitespace().map(str::to_string).collect();
            if argv.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "PKGMEND_BUILD_COMMAND".to_string(),
                    value: command,
                }
                .into());
            }
            self.builder.command = argv;
        }

        Ok(())
    }

    /// Check values that parse but cannot drive a session
    ///
    /// # Errors
    ///
    /// Returns an error naming the first offending field.
    pub fn validate(&self) -> Result<(), Error> {
        if self.repair.round_cap == 0 {
            return Err(ConfigError::InvalidValue {
                field: "repair.round_cap".to_string(),
                value: "0".to_string(),
            }
            .into());
        }
        if self.repair.success_banner.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: "repair.success_banner must not be empty".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Get the output directory (with default)
    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.paths
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(constants::DEFAULT_OUTPUT_DIR))
    }

    /// Get the build root (with default under the output directory)
    #[must_use]
    pub fn build_root(&self) -> PathBuf {
        self.paths
            .build_root
            .clone()
            .unwrap_or_else(|| self.output_dir().join(constants::BUILD_ROOT_DIR))
    }

    /// Directory the build driver writes its transcripts to
    #[must_use]
    pub fn results_dir(&self) -> PathBuf {
        self.output_dir().join(constants::RESULTS_DIR)
    }
}
