//! Per-module locale lookup.

use cmod_container::contract::LOCALE_SERVICE;
use cmod_container::{Instance, LocaleLookup};
use cmod_runtime::{Messages, ModuleName};
use std::sync::Arc;
use tracing::warn;

/// Implementation name of the locale marker.
pub const MODULE_LOCALE: &str = "core::ModuleLocale";

/// Messages of one module.
#[derive(Debug, Clone)]
pub struct ModuleLocale {
    module: ModuleName,
    messages: Messages,
}

impl ModuleLocale {
    pub fn new(module: ModuleName, messages: Messages) -> Self {
        Self { module, messages }
    }

    /// Session marker exposing this lookup as the locale service.
    pub fn into_marker(self) -> Instance {
        let lookup: Arc<dyn LocaleLookup> = Arc::new(self);
        Instance::new(MODULE_LOCALE, Arc::clone(&lookup)).with_view(LOCALE_SERVICE, lookup)
    }
}

impl LocaleLookup for ModuleLocale {
    fn get(&self, key: &str) -> String {
        match self.messages.get(key) {
            Some(message) => message.clone(),
            None => {
                warn!("Module {}: no message for key '{}'", self.module, key);
                key.to_string()
            }
        }
    }
}
