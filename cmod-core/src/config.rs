//! Configuration file loading and management
//!
//! This module handles loading and parsing the runtime configuration from
//! `$XDG_CONFIG_HOME/cmod/config.toml`. If the configuration file doesn't
//! exist, a default configuration is created with documented comments.
//! Command line options override values from the file.

use crate::core_info::DEFAULT_CONFIG_DIR;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default modules directory, relative to the base directory.
pub const DEFAULT_MODULES_DIR: &str = "modules";

/// Default libraries directory, relative to the base directory.
pub const DEFAULT_LIBRARIES_DIR: &str = "libraries";

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Runtime configuration
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// Runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Application name reported to modules
    /// Default: "cmod"
    pub application_name: String,
    /// Base directory; relative directories below are resolved against it.
    /// If None, the current working directory is used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_dir: Option<PathBuf>,
    /// Directory scanned for `*.cmod.jar` archives
    /// Default: "<base_dir>/modules"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modules_dir: Option<PathBuf>,
    /// Directory holding the libraries modules declare
    /// Default: "<base_dir>/libraries"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub libraries_dir: Option<PathBuf>,
    /// Directory holding the `<name>.yml` files modules read through
    /// `core::IConfigService`
    /// Default: "<base_dir>/config"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_dir: Option<PathBuf>,
    /// Module booted after resolution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_module: Option<String>,
    /// Log level (trace, debug, info, warn, error)
    /// Default: "info"
    pub log_level: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            application_name: "cmod".to_string(),
            base_dir: None,
            modules_dir: None,
            libraries_dir: None,
            config_dir: None,
            entry_module: None,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the specified path
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// The parsed configuration or an error if loading/parsing fails
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the default XDG config location
    ///
    /// If the configuration file doesn't exist, creates a default configuration
    /// file with documented comments.
    pub fn load_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_file(&config_path)?;
        }

        Self::load(&config_path)
    }

    /// Get the default configuration file path
    ///
    /// Returns `$XDG_CONFIG_HOME/cmod/config.toml`
    pub fn default_config_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "raibid-labs", "cmod")
            .context("Failed to determine project directories")?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Create a default configuration file with documented comments
    fn create_default_file(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(path, Self::default_config_content())
            .with_context(|| format!("Failed to write default config file: {}", path.display()))?;

        tracing::info!("Created default configuration file at: {}", path.display());
        Ok(())
    }

    /// Generate the default configuration file content with comments
    fn default_config_content() -> String {
        r#"# cmod Runtime Configuration
# This file configures module discovery and boot.

[runtime]
# Application name reported to modules through core::ICoreInfo
# Default: "cmod"
application_name = "cmod"

# Base directory; relative directories below are resolved against it.
# If not specified, the current working directory is used.
# base_dir = "/opt/my-app"

# Directory scanned for *.cmod.jar module archives
# Default: "<base_dir>/modules"
# modules_dir = "modules"

# Directory holding the libraries modules declare
# Default: "<base_dir>/libraries"
# libraries_dir = "libraries"

# Directory holding the <name>.yml files modules read as their configuration
# Default: "<base_dir>/config"
# config_dir = "config"

# Module whose boot class is started once all modules are resolved.
# Can be overridden with --boot.
# entry_module = "hello"

# Log level: trace, debug, info, warn, error
# Default: "info"
log_level = "info"
"#
        .to_string()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !VALID_LOG_LEVELS.contains(&self.runtime.log_level.as_str()) {
            anyhow::bail!(
                "Invalid log_level: {}. Must be one of: {}",
                self.runtime.log_level,
                VALID_LOG_LEVELS.join(", ")
            );
        }

        if self.runtime.application_name.trim().is_empty() {
            anyhow::bail!("application_name must not be empty");
        }

        if let Some(entry) = &self.runtime.entry_module {
            cmod_runtime::ModuleName::parse(entry)
                .with_context(|| format!("Invalid entry_module: {entry}"))?;
        }

        Ok(())
    }

    /// The base directory: configured, or the current working directory
    pub fn base_dir(&self) -> Result<PathBuf> {
        match &self.runtime.base_dir {
            Some(dir) => Ok(dir.clone()),
            None => std::env::current_dir().context("Failed to determine working directory"),
        }
    }

    /// The modules directory, resolved against the base directory
    pub fn modules_dir(&self) -> Result<PathBuf> {
        self.resolve_dir(self.runtime.modules_dir.as_deref(), DEFAULT_MODULES_DIR)
    }

    /// The libraries directory, resolved against the base directory
    pub fn libraries_dir(&self) -> Result<PathBuf> {
        self.resolve_dir(self.runtime.libraries_dir.as_deref(), DEFAULT_LIBRARIES_DIR)
    }

    /// The module configuration directory, resolved against the base directory
    pub fn config_dir(&self) -> Result<PathBuf> {
        self.resolve_dir(self.runtime.config_dir.as_deref(), DEFAULT_CONFIG_DIR)
    }

    fn resolve_dir(&self, configured: Option<&Path>, default: &str) -> Result<PathBuf> {
        let dir = configured.unwrap_or_else(|| Path::new(default));
        if dir.is_absolute() {
            return Ok(dir.to_path_buf());
        }
        Ok(self.base_dir()?.join(dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.runtime.application_name, "cmod");
        assert_eq!(config.runtime.log_level, "info");
        assert!(config.runtime.entry_module.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_content_parses() {
        let config: Config = toml::from_str(&Config::default_config_content()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[runtime]
application_name = "demo"
base_dir = "/opt/demo"
modules_dir = "mods"
libraries_dir = "/usr/share/demo/libs"
config_dir = "etc"
entry_module = "Hello"
log_level = "debug"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(config_content.as_bytes()).unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.runtime.application_name, "demo");
        assert_eq!(config.runtime.entry_module.as_deref(), Some("Hello"));
        assert_eq!(config.modules_dir().unwrap(), Path::new("/opt/demo/mods"));
        assert_eq!(
            config.libraries_dir().unwrap(),
            Path::new("/usr/share/demo/libs")
        );
        assert_eq!(config.config_dir().unwrap(), Path::new("/opt/demo/etc"));
    }

    #[test]
    fn test_load_empty_config() {
        let temp_file = NamedTempFile::new().unwrap();
        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_default_directories() {
        let mut config = Config::default();
        config.runtime.base_dir = Some(PathBuf::from("/srv/app"));
        assert_eq!(config.modules_dir().unwrap(), Path::new("/srv/app/modules"));
        assert_eq!(
            config.libraries_dir().unwrap(),
            Path::new("/srv/app/libraries")
        );
        assert_eq!(config.config_dir().unwrap(), Path::new("/srv/app/config"));
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.runtime.log_level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_invalid_entry_module() {
        let mut config = Config::default();
        config.runtime.entry_module = Some("base:1.0".to_string());
        assert!(config.validate().is_err());
    }
}
