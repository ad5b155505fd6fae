//! Module discovery.
//!
//! Modules are found in a single modules directory. Every regular file whose
//! name ends in [`ARCHIVE_SUFFIX`](crate::archive::ARCHIVE_SUFFIX) becomes one
//! [`ModuleSource`]. Sources can also be built in memory, which bypasses
//! archive I/O entirely.

use crate::archive::{parse_messages, ArchiveLoader, Messages};
use crate::error::{RuntimeError, RuntimeResult};
use crate::manifest::ModuleDescriptor;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Where a module's manifest comes from.
#[derive(Debug, Clone)]
pub enum ModuleSource {
    /// A `.cmod.jar` archive on disk.
    Archive(PathBuf),

    /// Manifest text held in memory.
    Manifest {
        origin: String,
        yaml: String,
        messages: Messages,
    },

    /// An already validated descriptor.
    Prepared {
        descriptor: ModuleDescriptor,
        messages: Messages,
    },
}

impl ModuleSource {
    /// In-memory manifest without locale messages.
    pub fn manifest(origin: impl Into<String>, yaml: impl Into<String>) -> Self {
        ModuleSource::Manifest {
            origin: origin.into(),
            yaml: yaml.into(),
            messages: Messages::new(),
        }
    }

    /// In-memory manifest with locale messages given as YAML.
    pub fn manifest_with_messages(
        origin: impl Into<String>,
        yaml: impl Into<String>,
        messages_yaml: &str,
    ) -> RuntimeResult<Self> {
        Ok(ModuleSource::Manifest {
            origin: origin.into(),
            yaml: yaml.into(),
            messages: parse_messages(messages_yaml)?,
        })
    }

    /// Pre-built descriptor without locale messages.
    pub fn prepared(descriptor: ModuleDescriptor) -> Self {
        ModuleSource::Prepared {
            descriptor,
            messages: Messages::new(),
        }
    }

    /// Parse and validate this source's manifest.
    pub fn load_descriptor(&self) -> RuntimeResult<ModuleDescriptor> {
        match self {
            ModuleSource::Archive(path) => ArchiveLoader::load_descriptor(path),
            ModuleSource::Manifest { origin, yaml, .. } => ModuleDescriptor::from_yaml(yaml)
                .map_err(|e| match e {
                    RuntimeError::ManifestInvalid(msg) => {
                        RuntimeError::ManifestInvalid(format!("{origin}: {msg}"))
                    }
                    other => other,
                }),
            ModuleSource::Prepared { descriptor, .. } => Ok(descriptor.clone()),
        }
    }

    /// Locale messages for the module described by `descriptor`.
    pub fn load_messages(&self, descriptor: &ModuleDescriptor) -> RuntimeResult<Messages> {
        match self {
            ModuleSource::Archive(path) => ArchiveLoader::read_messages(path, descriptor.name()),
            ModuleSource::Manifest { messages, .. } | ModuleSource::Prepared { messages, .. } => {
                Ok(messages.clone())
            }
        }
    }
}

impl fmt::Display for ModuleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleSource::Archive(path) => write!(f, "{}", path.display()),
            ModuleSource::Manifest { origin, .. } => write!(f, "memory:{origin}"),
            ModuleSource::Prepared { descriptor, .. } => {
                write!(f, "memory:{}", descriptor.name())
            }
        }
    }
}

/// List all module archives in `dir`, sorted by file name.
pub fn discover_archives(dir: &Path) -> RuntimeResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(RuntimeError::ModuleDirectoryNotFound(dir.to_path_buf()));
    }

    debug!("Scanning modules directory: {:?}", dir);

    let mut archives = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();

        if !path.is_file() || !ArchiveLoader::is_archive(&path) {
            debug!("Skipping {:?}: not a module archive", path);
            continue;
        }

        archives.push(path);
    }

    archives.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    info!("Discovered {} module archive(s) in {:?}", archives.len(), dir);
    Ok(archives)
}

/// Discover all modules in `dir`.
pub fn discover_modules(dir: &Path) -> RuntimeResult<Vec<ModuleSource>> {
    Ok(discover_archives(dir)?
        .into_iter()
        .map(ModuleSource::Archive)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::ArchiveBuilder;
    use tempfile::TempDir;

    fn create_test_module(dir: &Path, file_name: &str, name: &str) {
        let manifest = format!("name: {name}\nversion: \"1.0.0\"\n");
        ArchiveBuilder::new(manifest)
            .write_to(&dir.join(file_name))
            .unwrap();
    }

    #[test]
    fn test_discover_in_directory() {
        let temp_dir = TempDir::new().unwrap();

        create_test_module(temp_dir.path(), "b.cmod.jar", "module-b");
        create_test_module(temp_dir.path(), "a.cmod.jar", "module-a");
        std::fs::write(temp_dir.path().join("notes.txt"), "ignored").unwrap();
        std::fs::write(temp_dir.path().join("lib.jar"), "ignored").unwrap();
        std::fs::create_dir(temp_dir.path().join("dir.cmod.jar")).unwrap();

        let archives = discover_archives(temp_dir.path()).unwrap();
        let names: Vec<_> = archives
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, ["a.cmod.jar", "b.cmod.jar"]);
    }

    #[test]
    fn test_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let result = discover_archives(&temp_dir.path().join("nope"));
        assert!(matches!(result, Err(RuntimeError::ModuleDirectoryNotFound(_))));
    }

    #[test]
    fn test_memory_source() {
        let source = ModuleSource::manifest_with_messages(
            "base",
            "name: Base\nversion: \"2.1\"\n",
            "hello: Hallo",
        )
        .unwrap();

        let descriptor = source.load_descriptor().unwrap();
        assert_eq!(descriptor.version().to_string(), "2.1");
        let messages = source.load_messages(&descriptor).unwrap();
        assert_eq!(messages.get("hello").map(String::as_str), Some("Hallo"));
        assert_eq!(source.to_string(), "memory:base");
    }
}
