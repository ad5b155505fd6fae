//! # cmod-runtime
//!
//! Module archives and manifests for the cmod application runtime.
//!
//! This crate provides:
//! - Version numbers and version constraints
//! - Module manifest parsing and validation
//! - Module archive reading
//! - Module discovery from a modules directory
//!
//! ## Module Structure
//!
//! A module is a zip archive named `<anything>.cmod.jar` containing:
//! - `cmod.yml` - Module name, version, dependencies, libraries, types and boot class
//! - `resources/<name>.yml` - Locale messages (optional)
//!
//! Dependencies are written as `name[:constraint(,constraint)*]`, for
//! example `base:>=1.0.0,<2.0.0`.

pub mod archive;
pub mod discovery;
pub mod error;
pub mod manifest;
pub mod version;

pub use archive::{
    messages_entry, parse_messages, ArchiveBuilder, ArchiveLoader, Messages, ARCHIVE_SUFFIX,
    MANIFEST_ENTRY,
};
pub use discovery::{discover_archives, discover_modules, ModuleSource};
pub use error::{RuntimeError, RuntimeResult};
pub use manifest::{
    DependencyReference, ModuleDescriptor, ModuleDescriptorBuilder, ModuleManifest, ModuleName,
    TypeDescriptor, TypeInfo,
};
pub use version::{all_satisfy, Constraint, Operator, Version};
