//! Integration tests for cmod-runtime.
//!
//! These tests cover:
//! - Module discovery from directories
//! - Manifest parsing from archives
//! - Dependency constraints against discovered versions
//! - Locale messages packaged with a module

use cmod_runtime::{
    discover_archives, discover_modules, ArchiveBuilder, ModuleDescriptor, ModuleName,
    ModuleSource, RuntimeError, Version,
};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ==============================================================================
// Test Fixture Helpers
// ==============================================================================

/// Options for a generated `cmod.yml`.
#[derive(Default)]
struct ModuleConfig<'a> {
    version: Option<&'a str>,
    dependencies: Vec<&'a str>,
    types: Vec<(&'a str, Option<&'a str>)>,
    boot_class: Option<&'a str>,
}

/// Create a module archive named `<name>.cmod.jar` in `dir`.
fn create_test_module(dir: &Path, name: &str, config: ModuleConfig) -> PathBuf {
    let mut manifest = format!(
        "name: {name}\nversion: \"{}\"\n",
        config.version.unwrap_or("1.0.0")
    );

    if !config.dependencies.is_empty() {
        manifest.push_str("dependencies:\n");
        for dep in &config.dependencies {
            manifest.push_str(&format!("  - \"{dep}\"\n"));
        }
    }

    if !config.types.is_empty() {
        manifest.push_str("typeInfos:\n");
        for (type_name, api) in &config.types {
            manifest.push_str(&format!("  - type: {type_name}\n"));
            if let Some(api) = api {
                manifest.push_str(&format!("    api: {api}\n"));
            }
        }
    }

    if let Some(boot_class) = config.boot_class {
        manifest.push_str(&format!("bootClass: {boot_class}\n"));
    }

    let path = dir.join(format!("{name}.cmod.jar"));
    ArchiveBuilder::new(manifest).write_to(&path).unwrap();
    path
}

fn load_all(dir: &Path) -> Vec<ModuleDescriptor> {
    discover_modules(dir)
        .unwrap()
        .iter()
        .map(|source| source.load_descriptor().unwrap())
        .collect()
}

// ==============================================================================
// Discovery Tests
// ==============================================================================

#[test]
fn test_discover_multiple_modules() {
    let temp_dir = TempDir::new().unwrap();

    create_test_module(
        temp_dir.path(),
        "base",
        ModuleConfig {
            types: vec![("base::Greeter", Some("base::IGreeter"))],
            ..Default::default()
        },
    );
    create_test_module(
        temp_dir.path(),
        "addon",
        ModuleConfig {
            dependencies: vec!["base:>=1.0.0"],
            types: vec![("addon::App", None)],
            boot_class: Some("addon::App"),
            ..Default::default()
        },
    );

    let descriptors = load_all(temp_dir.path());
    let names: Vec<_> = descriptors.iter().map(|d| d.name().to_string()).collect();
    assert_eq!(names, ["addon", "base"]);

    let addon = &descriptors[0];
    assert_eq!(addon.boot_class(), Some("addon::App"));
    assert_eq!(addon.dependencies()[0].name, "base");
}

#[test]
fn test_discover_empty_directory() {
    let temp_dir = TempDir::new().unwrap();
    assert!(discover_archives(temp_dir.path()).unwrap().is_empty());
}

#[test]
fn test_discover_file_instead_of_directory() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("modules");
    std::fs::write(&file, "not a directory").unwrap();

    assert!(matches!(
        discover_archives(&file),
        Err(RuntimeError::ModuleDirectoryNotFound(_))
    ));
}

#[test]
fn test_invalid_manifest_in_archive() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.cmod.jar");
    ArchiveBuilder::new("name: broken\nversion: \"1.0.x\"\n")
        .write_to(&path)
        .unwrap();

    let source = ModuleSource::Archive(path);
    assert!(matches!(
        source.load_descriptor(),
        Err(RuntimeError::ManifestInvalid(_))
    ));
}

#[test]
fn test_unquoted_version_keeps_literal_text() {
    // A plain scalar is read as written, so 1.10 stays 1.10.
    for literal in ["1.0", "1.10", "2"] {
        let descriptor =
            ModuleDescriptor::from_yaml(&format!("name: base\nversion: {literal}\n")).unwrap();
        assert_eq!(descriptor.version().to_string(), literal);
    }

    let descriptor = ModuleDescriptor::from_yaml("name: base\nversion: 1.10\n").unwrap();
    assert!(*descriptor.version() > Version::parse("1.9").unwrap());
}

// ==============================================================================
// Constraint Tests
// ==============================================================================

#[test]
fn test_constraints_against_discovered_versions() {
    let temp_dir = TempDir::new().unwrap();

    create_test_module(
        temp_dir.path(),
        "base",
        ModuleConfig {
            version: Some("2.0.0"),
            ..Default::default()
        },
    );
    create_test_module(
        temp_dir.path(),
        "addon",
        ModuleConfig {
            dependencies: vec!["base:>2.0.0", "base:>=1.0,<3"],
            ..Default::default()
        },
    );

    let descriptors = load_all(temp_dir.path());
    let addon = descriptors.iter().find(|d| d.name() == &"addon").unwrap();
    let base = descriptors.iter().find(|d| d.name() == &"base").unwrap();

    let strict = &addon.dependencies()[0];
    assert!(!strict.is_satisfied_by(base.version()));
    assert_eq!(
        strict.unmet_constraint(base.version()).unwrap().to_string(),
        ">2.0.0"
    );

    let range = &addon.dependencies()[1];
    assert!(range.is_satisfied_by(base.version()));
}

#[test]
fn test_version_ordering_is_total() {
    let mut versions: Vec<Version> = ["1.10.0", "1.2", "0.9.999", "1.2.0.1", "1"]
        .iter()
        .map(|v| v.parse().unwrap())
        .collect();
    versions.sort();

    let rendered: Vec<_> = versions.iter().map(|v| v.to_string()).collect();
    assert_eq!(rendered, ["0.9.999", "1", "1.2", "1.2.0.1", "1.10.0"]);
}

// ==============================================================================
// Locale Resource Tests
// ==============================================================================

#[test]
fn test_messages_packaged_with_module() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("base.cmod.jar");
    let name = ModuleName::parse("Base").unwrap();

    ArchiveBuilder::new("name: Base\nversion: \"1.0.0\"\n")
        .messages(&name, "greeting: Hello from base\n")
        .write_to(&path)
        .unwrap();

    let source = ModuleSource::Archive(path);
    let descriptor = source.load_descriptor().unwrap();
    let messages = source.load_messages(&descriptor).unwrap();

    assert_eq!(
        messages.get("greeting").map(String::as_str),
        Some("Hello from base")
    );
}
