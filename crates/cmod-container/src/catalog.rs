//! Code bundles, the linker and the type catalog.
//!
//! Module and library code is linked into the binary ahead of time. Each
//! crate that contributes code exposes a [`CodeBundle`]; the [`Linker`]
//! collects the bundles available to one process. "Injecting" code means
//! registering a bundle's definitions in the [`TypeCatalog`], which happens
//! at most once per [`CodeOrigin`].

use crate::error::{ContainerError, ContainerResult};
use crate::tags::{Tag, TagSet};
use crate::type_def::TypeDef;
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::{debug, info};

/// A named contract implementations can be viewed as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityDef {
    name: String,
    tags: TagSet,
}

impl CapabilityDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tags: TagSet::new(),
        }
    }

    pub fn tag(mut self, tag: Tag) -> Self {
        self.tags.add(tag);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    /// Exclusive capabilities may be bound by at most one instance.
    pub fn is_exclusive(&self) -> bool {
        !self.tags.is_multi_valued()
    }
}

/// Definitions contributed by one module, library or the core.
#[derive(Debug, Clone, Default)]
pub struct CodeBundle {
    id: String,
    types: Vec<TypeDef>,
    capabilities: Vec<CapabilityDef>,
}

impl CodeBundle {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            types: Vec::new(),
            capabilities: Vec::new(),
        }
    }

    pub fn with_type(mut self, def: TypeDef) -> Self {
        self.types.push(def);
        self
    }

    pub fn with_capability(mut self, capability: CapabilityDef) -> Self {
        self.capabilities.push(capability);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn types(&self) -> &[TypeDef] {
        &self.types
    }

    pub fn capabilities(&self) -> &[CapabilityDef] {
        &self.capabilities
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.capabilities.is_empty()
    }
}

/// Where injected code came from. Each origin is injected at most once.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CodeOrigin {
    Core,
    Library(String),
    Module(String),
}

impl fmt::Display for CodeOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodeOrigin::Core => f.write_str("core"),
            CodeOrigin::Library(id) => write!(f, "library '{id}'"),
            CodeOrigin::Module(name) => write!(f, "module '{name}'"),
        }
    }
}

/// Bundles linked into the running binary, keyed by bundle id.
///
/// Module bundles use the module name as id, library bundles the library
/// file name.
#[derive(Debug, Clone, Default)]
pub struct Linker {
    bundles: HashMap<String, CodeBundle>,
}

impl Linker {
    pub fn new() -> Self {
        Self {
            bundles: HashMap::new(),
        }
    }

    pub fn with_bundle(mut self, bundle: CodeBundle) -> Self {
        self.link(bundle);
        self
    }

    /// Make `bundle` available. A bundle with the same id is replaced.
    pub fn link(&mut self, bundle: CodeBundle) {
        debug!("Linked bundle: {}", bundle.id());
        self.bundles.insert(bundle.id().to_string(), bundle);
    }

    pub fn get(&self, id: &str) -> Option<&CodeBundle> {
        self.bundles.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.bundles.contains_key(id)
    }

    /// Linked bundle ids, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<_> = self.bundles.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

/// All injected type and capability definitions.
#[derive(Debug, Default)]
pub struct TypeCatalog {
    types: HashMap<String, TypeDef>,
    capabilities: HashMap<String, CapabilityDef>,
    injected: HashSet<CodeOrigin>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every definition of `bundle` on behalf of `origin`.
    ///
    /// All or nothing: on error the catalog is unchanged.
    pub fn inject(&mut self, origin: CodeOrigin, bundle: &CodeBundle) -> ContainerResult<()> {
        if self.injected.contains(&origin) {
            return Err(ContainerError::AlreadyInjected(origin.to_string()));
        }

        let mut seen = HashSet::new();
        let names = bundle
            .types()
            .iter()
            .map(TypeDef::name)
            .chain(bundle.capabilities().iter().map(CapabilityDef::name));

        for name in names {
            if !seen.insert(name) || self.defines(name) {
                return Err(ContainerError::DuplicateDefinition {
                    name: name.to_string(),
                    origin: origin.to_string(),
                });
            }
        }

        for def in bundle.types() {
            self.types.insert(def.name().to_string(), def.clone());
        }
        for capability in bundle.capabilities() {
            self.capabilities
                .insert(capability.name().to_string(), capability.clone());
        }

        info!(
            "Injected {} ({} type(s), {} capability(ies))",
            origin,
            bundle.types().len(),
            bundle.capabilities().len()
        );
        self.injected.insert(origin);
        Ok(())
    }

    pub fn is_injected(&self, origin: &CodeOrigin) -> bool {
        self.injected.contains(origin)
    }

    /// Whether `name` is a known type or capability.
    pub fn defines(&self, name: &str) -> bool {
        self.types.contains_key(name) || self.capabilities.contains_key(name)
    }

    pub fn type_def(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    pub fn capability(&self, name: &str) -> Option<&CapabilityDef> {
        self.capabilities.get(name)
    }

    /// Tags that apply when looking up `name`.
    pub fn tags_for(&self, name: &str) -> TagSet {
        let from_type = self.types.get(name).map(|d| d.tags().clone());
        let from_capability = self.capabilities.get(name).map(|c| c.tags().clone());

        match (from_type, from_capability) {
            (Some(a), Some(b)) => a.union(&b),
            (Some(tags), None) | (None, Some(tags)) => tags,
            (None, None) => TagSet::new(),
        }
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn capability_count(&self) -> usize {
        self.capabilities.len()
    }
}
