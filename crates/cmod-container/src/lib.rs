//! # cmod-container
//!
//! Dependency container for cmod modules.
//!
//! This crate provides:
//! - Explicit type metadata ([`TypeDef`]) in place of runtime reflection
//! - Code bundles, the [`Linker`] and the once-only [`TypeCatalog`]
//! - The [`DependencyRegistry`] of resolved instances, with sessions
//! - The two-phase [`ConstructionEngine`]
//! - Contracts shared between the core and module code
//!
//! ## Module Code
//!
//! Module code is compiled into the binary. A module crate exposes a
//! [`CodeBundle`] describing its types; the core registers the bundle once
//! the module's manifest has been accepted.

pub mod catalog;
pub mod contract;
pub mod engine;
pub mod error;
pub mod instance;
pub mod registry;
pub mod session;
pub mod tags;
pub mod type_def;

pub use catalog::{CapabilityDef, CodeBundle, CodeOrigin, Linker, TypeCatalog};
pub use contract::{BootModule, ConfigLookup, CoreInfo, LocaleLookup};
pub use engine::{ConstructionEngine, Plan, PlannedType};
pub use error::{ContainerError, ContainerResult};
pub use instance::{Arguments, Instance};
pub use registry::{Checkpoint, DependencyRegistry};
pub use session::{Session, SessionContext};
pub use tags::{SpecialKind, Tag, TagSet};
pub use type_def::{Constructor, TypeDef, TypeDefBuilder};
