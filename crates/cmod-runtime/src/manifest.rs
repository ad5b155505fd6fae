//! Module manifest parsing.
//!
//! Each module archive embeds a `cmod.yml` manifest describing the module's
//! name, version, the modules it depends on, the external libraries it needs,
//! the types it contributes and an optional boot class:
//!
//! ```yaml
//! name: Addon
//! version: "1.0.0"
//! dependencies:
//!   - "base:>=1.0.0,<2.0.0"
//! libraries:
//!   - json-lib.jar
//! typeInfos:
//!   - type: addon::Service
//!     api: addon::IService
//! bootClass: addon::App
//! ```
//!
//! [`ModuleManifest`] is the raw deserialized form; [`ModuleDescriptor`] is
//! the validated, immutable result.

use crate::error::{RuntimeError, RuntimeResult};
use crate::version::{all_satisfy, Constraint, Version};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Separates a dependency's module name from its constraint list.
pub const CONSTRAINT_DELIMITER: char = ':';

/// Separates individual constraints of one dependency.
pub const CONSTRAINT_SEPARATOR: char = ',';

/// Raw manifest structure as found in `cmod.yml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleManifest {
    /// Display name; normalized into a [`ModuleName`].
    pub name: String,

    /// Dot-separated version string.
    pub version: String,

    /// Dependency strings, `name[:constraint(,constraint)*]`.
    #[serde(default)]
    pub dependencies: Vec<String>,

    /// External library file names.
    #[serde(default)]
    pub libraries: Vec<String>,

    /// Types this module contributes.
    #[serde(default)]
    pub type_infos: Vec<TypeInfo>,

    /// Type started when this module is the entry module.
    #[serde(default)]
    pub boot_class: Option<String>,
}

/// Raw `typeInfos` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeInfo {
    /// Implementation type identifier.
    #[serde(rename = "type")]
    pub type_name: String,

    /// Capability the implementation must expose.
    #[serde(default)]
    pub api: Option<String>,
}

impl ModuleManifest {
    /// Load a manifest from a YAML file.
    pub fn from_file(path: &Path) -> RuntimeResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse a manifest from a YAML string. No validation happens here.
    pub fn parse(content: &str) -> RuntimeResult<Self> {
        serde_yaml::from_str(content).map_err(|e| RuntimeError::ManifestInvalid(e.to_string()))
    }

    /// Validate the manifest and turn it into a descriptor.
    pub fn into_descriptor(self) -> RuntimeResult<ModuleDescriptor> {
        let name = ModuleName::parse(&self.name)?;

        let version = Version::parse(self.version.trim()).map_err(|e| {
            RuntimeError::ManifestInvalid(format!("module '{name}': bad version: {e}"))
        })?;

        let dependencies = self
            .dependencies
            .iter()
            .map(|d| DependencyReference::parse(d))
            .collect::<RuntimeResult<Vec<_>>>()?;

        let mut types = Vec::with_capacity(self.type_infos.len());
        for info in self.type_infos {
            let type_name = info.type_name.trim();
            if type_name.is_empty() {
                return Err(RuntimeError::ManifestInvalid(format!(
                    "module '{name}': typeInfos entry without a type"
                )));
            }
            types.push(TypeDescriptor::new(type_name, non_blank(info.api)));
        }

        let libraries = self
            .libraries
            .into_iter()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();

        Ok(ModuleDescriptor {
            name,
            version,
            dependencies,
            libraries,
            types,
            boot_class: non_blank(self.boot_class),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Normalized module name: trimmed, lowercase, spaces replaced by `_`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleName(String);

impl ModuleName {
    pub fn parse(raw: &str) -> RuntimeResult<Self> {
        let normalized = raw.trim().to_lowercase().replace(' ', "_");

        if normalized.is_empty() || normalized.contains(CONSTRAINT_DELIMITER) {
            return Err(RuntimeError::InvalidModuleName(raw.to_string()));
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ModuleName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ModuleName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ModuleName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// A module this module depends on, with the versions it accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyReference {
    pub name: ModuleName,
    pub constraints: Vec<Constraint>,
}

impl DependencyReference {
    /// Parse `name[:constraint(,constraint)*]`.
    pub fn parse(text: &str) -> RuntimeResult<Self> {
        let (raw_name, raw_constraints) = match text.split_once(CONSTRAINT_DELIMITER) {
            Some((name, constraints)) => (name, Some(constraints)),
            None => (text, None),
        };

        let name = ModuleName::parse(raw_name)?;

        let mut constraints = Vec::new();
        for item in raw_constraints
            .into_iter()
            .flat_map(|c| c.split(CONSTRAINT_SEPARATOR))
            .map(str::trim)
            .filter(|c| !c.is_empty())
        {
            let constraint = Constraint::parse(item).map_err(|e| {
                RuntimeError::ManifestInvalid(format!(
                    "dependency '{text}': constraint '{item}' could not be resolved: {e}"
                ))
            })?;
            constraints.push(constraint);
        }

        Ok(Self { name, constraints })
    }

    /// Whether `version` satisfies every constraint.
    pub fn is_satisfied_by(&self, version: &Version) -> bool {
        all_satisfy(&self.constraints, version)
    }

    /// First constraint `version` violates.
    pub fn unmet_constraint(&self, version: &Version) -> Option<&Constraint> {
        self.constraints.iter().find(|c| !c.is_satisfied_by(version))
    }
}

impl fmt::Display for DependencyReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.constraints.is_empty() {
            let list = self
                .constraints
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(",");
            write!(f, "{CONSTRAINT_DELIMITER}{list}")?;
        }
        Ok(())
    }
}

/// An implementation type a module contributes, with the capability it must expose.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    pub type_name: String,
    pub capability: Option<String>,
}

impl TypeDescriptor {
    pub fn new(type_name: impl Into<String>, capability: Option<String>) -> Self {
        Self {
            type_name: type_name.into(),
            capability,
        }
    }

    /// Whether this descriptor provides `type_name`, by implementation or capability.
    pub fn provides(&self, type_name: &str) -> bool {
        self.type_name == type_name || self.capability.as_deref() == Some(type_name)
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.capability {
            Some(capability) => write!(f, "{} as {}", self.type_name, capability),
            None => f.write_str(&self.type_name),
        }
    }
}

/// Validated module descriptor. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDescriptor {
    name: ModuleName,
    version: Version,
    dependencies: Vec<DependencyReference>,
    libraries: Vec<String>,
    types: Vec<TypeDescriptor>,
    boot_class: Option<String>,
}

impl ModuleDescriptor {
    /// Parse and validate a YAML manifest.
    pub fn from_yaml(content: &str) -> RuntimeResult<Self> {
        ModuleManifest::parse(content)?.into_descriptor()
    }

    /// Start building a descriptor in code.
    pub fn builder(name: &str, version: &str) -> ModuleDescriptorBuilder {
        ModuleDescriptorBuilder {
            manifest: ModuleManifest {
                name: name.to_string(),
                version: version.to_string(),
                ..Default::default()
            },
        }
    }

    pub fn name(&self) -> &ModuleName {
        &self.name
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    pub fn dependencies(&self) -> &[DependencyReference] {
        &self.dependencies
    }

    pub fn libraries(&self) -> &[String] {
        &self.libraries
    }

    pub fn types(&self) -> &[TypeDescriptor] {
        &self.types
    }

    pub fn boot_class(&self) -> Option<&str> {
        self.boot_class.as_deref()
    }

    /// `"<name> (<version>)"`.
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.name, self.version)
    }
}

/// Builds a [`ModuleDescriptor`] through the same validation as a manifest.
#[derive(Debug, Clone)]
pub struct ModuleDescriptorBuilder {
    manifest: ModuleManifest,
}

impl ModuleDescriptorBuilder {
    pub fn dependency(mut self, dependency: &str) -> Self {
        self.manifest.dependencies.push(dependency.to_string());
        self
    }

    pub fn library(mut self, library: &str) -> Self {
        self.manifest.libraries.push(library.to_string());
        self
    }

    /// Contribute an implementation type without a capability.
    pub fn provides(mut self, type_name: &str) -> Self {
        self.manifest.type_infos.push(TypeInfo {
            type_name: type_name.to_string(),
            api: None,
        });
        self
    }

    /// Contribute an implementation type bound to a capability.
    pub fn provides_as(mut self, type_name: &str, capability: &str) -> Self {
        self.manifest.type_infos.push(TypeInfo {
            type_name: type_name.to_string(),
            api: Some(capability.to_string()),
        });
        self
    }

    pub fn boot_class(mut self, boot_class: &str) -> Self {
        self.manifest.boot_class = Some(boot_class.to_string());
        self
    }

    pub fn build(self) -> RuntimeResult<ModuleDescriptor> {
        self.manifest.into_descriptor()
    }
}
