//! YAML configuration files for modules.
//!
//! Modules receive the service as [`CONFIG_SERVICE`] and read
//! `<config_dir>/<name>.yml` into their own config types.

use anyhow::Context;
use cmod_container::contract::{CONFIG_SERVICE, CORE_INFO};
use cmod_container::{ConfigLookup, CoreInfo, TypeDef};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Implementation name of [`YamlConfigService`].
pub const YAML_CONFIG_SERVICE: &str = "core::ConfigService";

/// Extension of configuration files.
pub const CONFIG_SUFFIX: &str = "yml";

/// Reads configuration files from one directory.
#[derive(Debug, Clone)]
pub struct YamlConfigService {
    config_dir: PathBuf,
}

impl YamlConfigService {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// File holding the config `name`.
    pub fn path_of(&self, name: &str) -> anyhow::Result<PathBuf> {
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            anyhow::bail!("invalid config name '{name}'");
        }
        Ok(self.config_dir.join(format!("{name}.{CONFIG_SUFFIX}")))
    }
}

impl ConfigLookup for YamlConfigService {
    fn load_value(&self, name: &str) -> anyhow::Result<Option<serde_yaml::Value>> {
        let path = self.path_of(name)?;

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("Config {} not found at {:?}", name, path);
                return Ok(None);
            }
            Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
        };

        debug!("Loaded config {} from {:?}", name, path);
        let value = serde_yaml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("config {} in {}: {}", name, path.display(), e))?;
        Ok(Some(value))
    }
}

/// Type definition of [`YamlConfigService`], built from [`CORE_INFO`].
pub fn config_service_def() -> TypeDef {
    TypeDef::of::<YamlConfigService>(YAML_CONFIG_SERVICE)
        .implements::<dyn ConfigLookup>(CONFIG_SERVICE, |service| service)
        .constructor(&[CORE_INFO], |args| {
            let info = args.next::<dyn CoreInfo>()?;
            Ok(YamlConfigService::new(info.config_dir()))
        })
        .build()
}
