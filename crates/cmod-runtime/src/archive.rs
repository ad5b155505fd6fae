//! Module archive format and loader.
//!
//! A module archive is a zip file whose name ends in [`ARCHIVE_SUFFIX`]:
//!
//! ```text
//! base.cmod.jar
//! ├── cmod.yml                 manifest (required)
//! └── resources/<name>.yml     locale messages (optional, flat string map)
//! ```
//!
//! The archive itself never carries executable code. Types named by the
//! manifest are provided by statically linked bundles, see `cmod-container`.

use crate::error::{RuntimeError, RuntimeResult};
use crate::manifest::{ModuleDescriptor, ModuleManifest, ModuleName};
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::debug;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

/// File name suffix identifying module archives.
pub const ARCHIVE_SUFFIX: &str = ".cmod.jar";

/// Manifest entry inside an archive.
pub const MANIFEST_ENTRY: &str = "cmod.yml";

/// Directory inside an archive holding locale messages.
pub const RESOURCES_DIR: &str = "resources";

/// Locale messages of one module, keyed by message key.
pub type Messages = HashMap<String, String>;

/// Archive loader.
pub struct ArchiveLoader;

impl ArchiveLoader {
    /// Whether `path` names a module archive.
    pub fn is_archive(path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.ends_with(ARCHIVE_SUFFIX))
            .unwrap_or(false)
    }

    /// Read the raw manifest of an archive.
    pub fn read_manifest(path: &Path) -> RuntimeResult<ModuleManifest> {
        match Self::read_entry(path, MANIFEST_ENTRY)? {
            Some(content) => ModuleManifest::parse(&content).map_err(|e| match e {
                RuntimeError::ManifestInvalid(msg) => {
                    RuntimeError::ManifestInvalid(format!("{}: {}", path.display(), msg))
                }
                other => other,
            }),
            None => Err(RuntimeError::ManifestMissing(path.display().to_string())),
        }
    }

    /// Read and validate the manifest of an archive.
    pub fn load_descriptor(path: &Path) -> RuntimeResult<ModuleDescriptor> {
        debug!("Reading manifest from {:?}", path);
        Self::read_manifest(path)?.into_descriptor()
    }

    /// Read the locale messages of `module`. Missing messages yield an empty map.
    pub fn read_messages(path: &Path, module: &ModuleName) -> RuntimeResult<Messages> {
        let entry = messages_entry(module);
        match Self::read_entry(path, &entry)? {
            Some(content) => parse_messages(&content)
                .map_err(|e| RuntimeError::ManifestInvalid(format!("{entry}: {e}"))),
            None => Ok(Messages::new()),
        }
    }

    /// Read a UTF-8 entry. `None` if the archive has no such entry.
    fn read_entry(path: &Path, entry: &str) -> RuntimeResult<Option<String>> {
        let file = File::open(path)?;
        let mut archive = ZipArchive::new(file)?;

        let result = match archive.by_name(entry) {
            Ok(mut file) => {
                let mut content = String::new();
                file.read_to_string(&mut content)?;
                Ok(Some(content))
            }
            Err(ZipError::FileNotFound) => Ok(None),
            Err(e) => Err(e.into()),
        };
        result
    }
}

/// Archive entry name of a module's locale messages.
pub fn messages_entry(module: &ModuleName) -> String {
    format!("{RESOURCES_DIR}/{module}.yml")
}

/// Parse a flat YAML string map.
pub fn parse_messages(content: &str) -> RuntimeResult<Messages> {
    if content.trim().is_empty() {
        return Ok(Messages::new());
    }
    serde_yaml::from_str(content).map_err(|e| RuntimeError::ManifestInvalid(e.to_string()))
}

/// Writes module archives. Used to package modules and in tests.
pub struct ArchiveBuilder {
    manifest: String,
    entries: Vec<(String, String)>,
}

impl ArchiveBuilder {
    /// Start an archive with the given manifest content.
    pub fn new(manifest: impl Into<String>) -> Self {
        Self {
            manifest: manifest.into(),
            entries: Vec::new(),
        }
    }

    /// Add locale messages for `module`.
    pub fn messages(mut self, module: &ModuleName, content: impl Into<String>) -> Self {
        self.entries.push((messages_entry(module), content.into()));
        self
    }

    /// Add an arbitrary entry.
    pub fn entry(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.entries.push((name.into(), content.into()));
        self
    }

    /// Write the archive to `path`.
    pub fn write_to(&self, path: &Path) -> RuntimeResult<()> {
        let file = File::create(path)?;
        let mut writer = ZipWriter::new(file);
        let options = SimpleFileOptions::default();

        writer.start_file(MANIFEST_ENTRY, options)?;
        writer.write_all(self.manifest.as_bytes())?;

        for (name, content) in &self.entries {
            writer.start_file(name.as_str(), options)?;
            writer.write_all(content.as_bytes())?;
        }

        writer.finish()?;
        Ok(())
    }
}
