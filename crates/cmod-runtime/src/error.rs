//! Error types for the cmod runtime.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading module archives and manifests.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// A version string could not be parsed.
    #[error("Invalid version format: {0}")]
    InvalidVersionFormat(String),

    /// A module name is empty after normalization or contains the constraint delimiter.
    #[error("Invalid module name: '{0}'")]
    InvalidModuleName(String),

    /// The archive carries no manifest entry.
    #[error("Manifest missing in archive: {0}")]
    ManifestMissing(String),

    /// The manifest exists but is malformed.
    #[error("Invalid manifest: {0}")]
    ManifestInvalid(String),

    /// The modules directory does not exist or is not a directory.
    #[error("Module directory not found: {}", .0.display())]
    ModuleDirectoryNotFound(PathBuf),

    /// The archive could not be opened as a zip file.
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = std::result::Result<T, RuntimeError>;
