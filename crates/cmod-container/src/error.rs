//! Error types for the container.

use thiserror::Error;

/// Errors raised while injecting code, looking up instances or constructing types.
#[derive(Error, Debug)]
pub enum ContainerError {
    #[error("Type not found: {0}")]
    TypeNotFound(String),

    #[error("Invalid constructor shape for {type_name}: {reason}")]
    InvalidConstructorShape { type_name: String, reason: String },

    #[error("Capability not found: {0}")]
    CapabilityNotFound(String),

    #[error("Type {type_name} does not implement capability {capability}")]
    CapabilityNotImplemented {
        type_name: String,
        capability: String,
    },

    #[error("Capability {capability} is already bound (requested by {type_name})")]
    CapabilityAlreadyBound {
        capability: String,
        type_name: String,
    },

    #[error("Unresolved dependencies: {}", .0.join(", "))]
    UnresolvedDependency(Vec<String>),

    #[error("Construction deadlock between: {}", .0.join(", "))]
    ConstructionDeadlock(Vec<String>),

    #[error("Construction of {type_name} failed")]
    ConstructionFailed {
        type_name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("No instance registered for {0}")]
    NotResolved(String),

    #[error("Ambiguous lookup for {type_name}: {count} candidates")]
    Ambiguous { type_name: String, count: usize },

    #[error("{0} is multi-valued; use find_all")]
    MultiValued(String),

    #[error("Instance for {type_name} is not a {expected}")]
    TypeMismatch {
        type_name: String,
        expected: &'static str,
    },

    #[error("Constructor of {type_name} has no argument at position {position}")]
    MissingArgument { type_name: String, position: usize },

    #[error("Code already injected: {0}")]
    AlreadyInjected(String),

    #[error("Duplicate definition of {name} in {origin}")]
    DuplicateDefinition { name: String, origin: String },
}

impl ContainerError {
    /// Whether the failure may go away once more instances are registered.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ContainerError::UnresolvedDependency(_))
    }

    /// Names nothing is bound to yet; empty unless retryable.
    pub fn unresolved(&self) -> &[String] {
        match self {
            ContainerError::UnresolvedDependency(names) => names,
            _ => &[],
        }
    }
}

/// Result type for container operations.
pub type ContainerResult<T> = Result<T, ContainerError>;
