//! # cmod
//!
//! Boots an application out of versioned modules.
//!
//! The binary:
//! - Discovers `*.cmod.jar` module archives in the modules directory
//! - Checks every module's dependencies and version constraints
//! - Injects declared libraries and module code, each exactly once
//! - Resolves module types in dependency rounds
//! - Starts the boot class of the entry module
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                           cmod                            │
//! │                                                           │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐    │
//! │  │  Discovery   │  │   Linker     │  │ Orchestrator │    │
//! │  │ (*.cmod.jar) │  │  (bundles)   │  │   (rounds)   │    │
//! │  └──────────────┘  └──────────────┘  └──────────────┘    │
//! │                                                           │
//! │  ┌────────────────────────────────────────────────────┐  │
//! │  │      Dependency registry + construction engine      │  │
//! │  └────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//!
//! Reads `$XDG_CONFIG_HOME/cmod/config.toml`; command line options win.
//!
//! ## Running
//!
//! ```bash
//! cargo run --bin cmod -- --modules ./modules --boot hello
//!
//! # With debug logging
//! RUST_LOG=debug cargo run --bin cmod -- --boot hello
//! ```

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use cmod_container::Linker;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use cmod_core::cli::CliArgs;
use cmod_core::config::Config;
use cmod_core::core_info::RuntimeInfo;
use cmod_core::orchestrator::ModuleOrchestrator;

fn main() -> ExitCode {
    let args = CliArgs::parse();

    // The log level may come from the config file, so read it first and
    // report how that went once logging is up.
    let loaded = match &args.config {
        Some(path) => Config::load(path),
        None => Config::load_default(),
    };
    let mut config = match &loaded {
        Ok(config) => config.clone(),
        Err(_) => Config::default(),
    };
    args.apply(&mut config);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.runtime.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .init();

    info!("Starting cmod v{}", env!("CARGO_PKG_VERSION"));

    match loaded {
        Ok(_) => info!("Loaded configuration"),
        Err(e) if args.config.is_some() => {
            error!("{:#}", e);
            return ExitCode::FAILURE;
        }
        Err(e) => warn!("Failed to load config, using defaults: {:#}", e),
    }

    let Some(entry) = config.runtime.entry_module.clone() else {
        CliArgs::command()
            .error(
                ErrorKind::MissingRequiredArgument,
                "no entry module: pass --boot <MODULE> or set runtime.entry_module",
            )
            .exit()
    };

    match run(&config, &entry) {
        Ok(()) => {
            info!("Boot complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Boot failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config, entry: &str) -> Result<()> {
    let modules_dir = config.modules_dir()?;
    let libraries_dir = config.libraries_dir()?;

    let info = RuntimeInfo {
        application_name: config.runtime.application_name.clone(),
        base_dir: config.base_dir()?,
        module_dir: modules_dir.clone(),
        library_dir: Some(libraries_dir),
        config_dir: config.config_dir()?,
    };

    // Module code is linked into the binary; archives only carry manifests
    // and resources.
    let linker = Linker::new()
        .with_bundle(module_base::bundle())
        .with_bundle(module_hello::bundle());
    info!("Linked code bundles: {:?}", linker.ids());

    let mut orchestrator = ModuleOrchestrator::new(linker, info)?;
    let count = orchestrator
        .discover(&modules_dir)
        .with_context(|| format!("Failed to discover modules in {}", modules_dir.display()))?;
    info!("Discovered {} module(s)", count);

    orchestrator
        .boot(entry)
        .with_context(|| format!("Failed to boot module {entry}"))?;

    let report = orchestrator.report();
    info!(
        "Resolved {} module(s) in {} round(s)",
        report.resolved_count(),
        report.rounds().len()
    );
    Ok(())
}
