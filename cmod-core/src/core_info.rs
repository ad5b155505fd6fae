//! Core information and the core code bundle.

use crate::config_service::config_service_def;
use cmod_container::contract::{self, CORE_INFO};
use cmod_container::{CodeBundle, CoreInfo, Tag, TypeDef};
use std::path::{Path, PathBuf};

/// Implementation name of [`RuntimeInfo`].
pub const RUNTIME_INFO: &str = "core::RuntimeInfo";

/// Config directory below the base directory, unless configured otherwise.
pub const DEFAULT_CONFIG_DIR: &str = "config";

/// Application name, directories and the like, provided to modules as
/// [`CORE_INFO`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeInfo {
    pub application_name: String,
    pub base_dir: PathBuf,
    pub module_dir: PathBuf,
    pub library_dir: Option<PathBuf>,
    pub config_dir: PathBuf,
}

impl RuntimeInfo {
    /// Info for modules living in `module_dir`, with `base_dir` as its parent
    /// and configs in `<base_dir>/config`.
    pub fn for_module_dir(application_name: impl Into<String>, module_dir: &Path) -> Self {
        let base_dir = module_dir
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| module_dir.to_path_buf());

        Self {
            application_name: application_name.into(),
            config_dir: base_dir.join(DEFAULT_CONFIG_DIR),
            base_dir,
            module_dir: module_dir.to_path_buf(),
            library_dir: None,
        }
    }
}

impl CoreInfo for RuntimeInfo {
    fn application_name(&self) -> &str {
        &self.application_name
    }

    fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn module_dir(&self) -> &Path {
        &self.module_dir
    }

    fn library_dir(&self) -> Option<&Path> {
        self.library_dir.as_deref()
    }

    fn config_dir(&self) -> &Path {
        &self.config_dir
    }
}

/// Type definition of [`RuntimeInfo`]; never constructed by the engine.
pub fn runtime_info_def() -> TypeDef {
    TypeDef::of::<RuntimeInfo>(RUNTIME_INFO)
        .implements::<dyn CoreInfo>(CORE_INFO, |info| info)
        .tag(Tag::NoDependency)
        .build()
}

/// Definitions injected before any library or module code.
pub fn core_bundle() -> CodeBundle {
    contract::core_capabilities()
        .into_iter()
        .fold(CodeBundle::new("core"), CodeBundle::with_capability)
        .with_type(runtime_info_def())
        .with_type(config_service_def())
}
