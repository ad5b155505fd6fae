//! Module lifecycle.
//!
//! ```text
//! Discovered -> DescriptorLoaded -> CodeInjected -> Resolved -> Booted
//! ```
//!
//! Every transition moves exactly one step forward; anything else is an
//! [`BootError::InvalidState`].

use crate::error::{BootError, BootResult};
use cmod_runtime::{Messages, ModuleDescriptor, ModuleSource};
use tracing::debug;

/// Lifecycle state of a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ModuleState {
    Discovered,
    DescriptorLoaded,
    CodeInjected,
    Resolved,
    Booted,
}

/// One module known to the orchestrator.
#[derive(Debug, Clone)]
pub struct Module {
    source: ModuleSource,
    descriptor: Option<ModuleDescriptor>,
    messages: Messages,
    state: ModuleState,
}

impl Module {
    /// A discovered module whose manifest has not been read yet.
    pub fn new(source: ModuleSource) -> Self {
        Self {
            source,
            descriptor: None,
            messages: Messages::new(),
            state: ModuleState::Discovered,
        }
    }

    /// Read and validate the manifest and locale messages.
    pub fn load_descriptor(&mut self) -> BootResult<&ModuleDescriptor> {
        self.expect_state(ModuleState::Discovered)?;

        let descriptor = self.source.load_descriptor()?;
        self.messages = self.source.load_messages(&descriptor)?;
        debug!(
            "Loaded descriptor {} from {} ({} message(s))",
            descriptor.display_name(),
            self.source,
            self.messages.len()
        );

        self.state = ModuleState::DescriptorLoaded;
        Ok(self.descriptor.insert(descriptor))
    }

    pub fn mark_injected(&mut self) -> BootResult<()> {
        self.advance(ModuleState::DescriptorLoaded, ModuleState::CodeInjected)
    }

    pub fn mark_resolved(&mut self) -> BootResult<()> {
        self.advance(ModuleState::CodeInjected, ModuleState::Resolved)
    }

    pub fn mark_booted(&mut self) -> BootResult<()> {
        self.advance(ModuleState::Resolved, ModuleState::Booted)
    }

    pub fn state(&self) -> ModuleState {
        self.state
    }

    pub fn source(&self) -> &ModuleSource {
        &self.source
    }

    /// The descriptor, once loaded.
    pub fn descriptor(&self) -> Option<&ModuleDescriptor> {
        self.descriptor.as_ref()
    }

    pub fn messages(&self) -> &Messages {
        &self.messages
    }

    /// Normalized module name, or the source label before the manifest is read.
    pub fn name(&self) -> String {
        match &self.descriptor {
            Some(descriptor) => descriptor.name().to_string(),
            None => self.source.to_string(),
        }
    }

    fn advance(&mut self, from: ModuleState, to: ModuleState) -> BootResult<()> {
        self.expect_state(from)?;
        debug!("Module {}: {:?} -> {:?}", self.name(), from, to);
        self.state = to;
        Ok(())
    }

    fn expect_state(&self, expected: ModuleState) -> BootResult<()> {
        if self.state != expected {
            return Err(BootError::InvalidState {
                module: self.name(),
                actual: self.state,
                expected,
            });
        }
        Ok(())
    }
}
