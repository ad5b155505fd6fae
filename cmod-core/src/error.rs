//! Errors of the boot pipeline.

use crate::module::ModuleState;
use cmod_container::ContainerError;
use cmod_runtime::RuntimeError;
use std::path::PathBuf;
use thiserror::Error;

/// A module left pending when resolution stopped making progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StuckModule {
    pub module: String,
    pub unresolved: Vec<String>,
}

/// Errors raised while booting. All of them are fatal.
#[derive(Error, Debug)]
pub enum BootError {
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error("Module '{0}' found more than once")]
    DuplicateModule(String),

    #[error("Module '{module}' depends on missing module '{dependency}'")]
    MissingDependency { module: String, dependency: String },

    #[error("Module '{module}' requires {dependency} {constraint}, found {found}")]
    UnmetConstraint {
        module: String,
        dependency: String,
        constraint: String,
        found: String,
    },

    #[error("Library '{library}' of module '{module}' not found at {path:?}")]
    LibraryNotFound {
        module: String,
        library: String,
        path: PathBuf,
    },

    #[error("Resolving module '{module}' failed")]
    ResolutionFailed {
        module: String,
        #[source]
        source: ContainerError,
    },

    #[error("Modules cannot be resolved: {}", describe_stuck(.0))]
    Unresolvable(Vec<StuckModule>),

    #[error("Module not found: {0}")]
    ModuleNotFound(String),

    #[error("Module '{0}' is not resolved")]
    ModuleNotResolved(String),

    #[error("Module '{0}' declares no boot class")]
    NoBootClass(String),

    #[error("Boot class '{class}' of module '{module}' is not bootable")]
    NotBootable { module: String, class: String },

    #[error("Booting module '{module}' failed")]
    BootFailed {
        module: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Module '{module}' is {actual:?}, expected {expected:?}")]
    InvalidState {
        module: String,
        actual: ModuleState,
        expected: ModuleState,
    },
}

fn describe_stuck(stuck: &[StuckModule]) -> String {
    stuck
        .iter()
        .map(|s| format!("{} (needs {})", s.module, s.unresolved.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for boot operations.
pub type BootResult<T> = Result<T, BootError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolvable_lists_modules() {
        let err = BootError::Unresolvable(vec![
            StuckModule {
                module: "a".into(),
                unresolved: vec!["b::IB".into()],
            },
            StuckModule {
                module: "b".into(),
                unresolved: vec!["a::IA".into(), "c::IC".into()],
            },
        ]);

        assert_eq!(
            err.to_string(),
            "Modules cannot be resolved: a (needs b::IB); b (needs a::IA, c::IC)"
        );
    }
}
