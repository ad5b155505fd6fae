//! Defines the command-line argument structure using clap.

use crate::config::Config;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None, name = "cmod", bin_name = "cmod")]
pub struct CliArgs {
    /// Directory scanned for *.cmod.jar module archives
    #[arg(short = 's', long = "modules", value_name = "DIR")]
    pub modules_dir: Option<PathBuf>,

    /// Directory holding the libraries modules declare
    #[arg(short = 'L', long = "libraries", value_name = "DIR")]
    pub libraries_dir: Option<PathBuf>,

    /// Directory holding module configuration files (<name>.yml)
    #[arg(long = "config-dir", value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// Module whose boot class is started
    #[arg(short = 'b', long = "boot", value_name = "MODULE")]
    pub entry_module: Option<String>,

    /// Log level, unless RUST_LOG is set
    #[arg(
        short = 'l',
        long,
        value_name = "LEVEL",
        value_parser = ["trace", "debug", "info", "warn", "error"]
    )]
    pub log_level: Option<String>,

    /// Configuration file (default: $XDG_CONFIG_HOME/cmod/config.toml)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl CliArgs {
    /// Override `config` with every option given on the command line.
    pub fn apply(&self, config: &mut Config) {
        let runtime = &mut config.runtime;

        if let Some(dir) = &self.modules_dir {
            runtime.modules_dir = Some(dir.clone());
        }
        if let Some(dir) = &self.libraries_dir {
            runtime.libraries_dir = Some(dir.clone());
        }
        if let Some(dir) = &self.config_dir {
            runtime.config_dir = Some(dir.clone());
        }
        if let Some(entry) = &self.entry_module {
            runtime.entry_module = Some(entry.clone());
        }
        if let Some(level) = &self.log_level {
            runtime.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_short_options() {
        let args = CliArgs::try_parse_from([
            "cmod", "-s", "mods", "-L", "libs", "-b", "hello", "-l", "debug",
        ])
        .unwrap();

        assert_eq!(args.modules_dir.as_deref(), Some(Path::new("mods")));
        assert_eq!(args.libraries_dir.as_deref(), Some(Path::new("libs")));
        assert_eq!(args.entry_module.as_deref(), Some("hello"));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert!(args.config.is_none());
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        assert!(CliArgs::try_parse_from(["cmod", "--log-level", "loud"]).is_err());
    }

    #[test]
    fn test_cli_overrides_config() {
        let mut config = Config::default();
        config.runtime.entry_module = Some("base".to_string());
        config.runtime.modules_dir = Some(PathBuf::from("from-file"));

        let args =
            CliArgs::try_parse_from(["cmod", "--boot", "hello", "--config-dir", "etc"]).unwrap();
        args.apply(&mut config);

        assert_eq!(config.runtime.entry_module.as_deref(), Some("hello"));
        assert_eq!(config.runtime.config_dir.as_deref(), Some(Path::new("etc")));
        assert_eq!(
            config.runtime.modules_dir.as_deref(),
            Some(Path::new("from-file"))
        );
        assert_eq!(config.runtime.log_level, "info");
    }
}
