//! Contracts shared by the core and module code.
//!
//! Module crates depend on these traits and names instead of on the core
//! crate itself.

use crate::catalog::CapabilityDef;
use crate::tags::{SpecialKind, Tag};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Capability of the entry module's boot class. Multi-valued: every module
/// may ship a boot class, only the entry module's is started.
pub const BOOT_MODULE: &str = "core::BootModule";

/// Capability of the process-wide [`CoreInfo`].
pub const CORE_INFO: &str = "core::ICoreInfo";

/// Capability of the process-wide [`ConfigLookup`].
pub const CONFIG_SERVICE: &str = "core::IConfigService";

/// Special capability resolving to the current module's [`LocaleLookup`].
pub const LOCALE_SERVICE: &str = "core::ILocaleService";

/// Special capability resolving to the current module's descriptor.
pub const MODULE: &str = "core::IModule";

/// Started once, when its module is the entry module.
pub trait BootModule: Send + Sync {
    fn boot(&self) -> anyhow::Result<()>;
}

/// Message lookup for one module.
pub trait LocaleLookup: Send + Sync {
    /// The message for `key`, or `key` itself when there is none.
    fn get(&self, key: &str) -> String;

    /// The message for `key` with `{0}`, `{1}`, ... replaced by `args`.
    fn format(&self, key: &str, args: &[&str]) -> String {
        args.iter()
            .enumerate()
            .fold(self.get(key), |text, (i, arg)| {
                text.replace(&format!("{{{i}}}"), arg)
            })
    }
}

/// Facts about the running application.
pub trait CoreInfo: Send + Sync {
    fn application_name(&self) -> &str;
    fn base_dir(&self) -> &Path;
    fn module_dir(&self) -> &Path;
    fn library_dir(&self) -> Option<&Path>;
    /// Directory holding the `<name>.yml` configuration files.
    fn config_dir(&self) -> &Path;
}

/// Named YAML configuration files.
pub trait ConfigLookup: Send + Sync {
    /// The parsed config `name`, or `None` when no such file exists.
    fn load_value(&self, name: &str) -> anyhow::Result<Option<serde_yaml::Value>>;
}

impl<'a> dyn ConfigLookup + 'a {
    /// The config `name` deserialized as `T`.
    pub fn load<T: DeserializeOwned>(&self, name: &str) -> anyhow::Result<Option<T>> {
        match self.load_value(name)? {
            Some(value) => Ok(Some(serde_yaml::from_value(value)?)),
            None => Ok(None),
        }
    }
}

/// Definitions of the well-known capabilities.
pub fn core_capabilities() -> Vec<CapabilityDef> {
    vec![
        CapabilityDef::new(BOOT_MODULE).tag(Tag::MultiValued),
        CapabilityDef::new(CORE_INFO),
        CapabilityDef::new(CONFIG_SERVICE),
        CapabilityDef::new(LOCALE_SERVICE).tag(Tag::Special(SpecialKind::Locale)),
        CapabilityDef::new(MODULE).tag(Tag::Special(SpecialKind::Module)),
    ]
}
