//! cmod core library
//!
//! The module lifecycle, the [`ModuleOrchestrator`] driving modules from
//! discovery to boot, and the configuration used by the `cmod` binary.

pub mod cli;
pub mod config;
pub mod config_service;
pub mod core_info;
pub mod error;
pub mod locale;
pub mod module;
pub mod orchestrator;

pub use config::{Config, RuntimeConfig};
pub use config_service::{config_service_def, YamlConfigService, YAML_CONFIG_SERVICE};
pub use core_info::{core_bundle, runtime_info_def, RuntimeInfo, DEFAULT_CONFIG_DIR, RUNTIME_INFO};
pub use error::{BootError, BootResult, StuckModule};
pub use locale::{ModuleLocale, MODULE_LOCALE};
pub use module::{Module, ModuleState};
pub use orchestrator::{ModuleOrchestrator, ResolutionReport, MODULE_REF};
