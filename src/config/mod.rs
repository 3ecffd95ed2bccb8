//! Project configuration management for `caspar-graphics.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── build      # [build]
//! │   ├── project    # [project]
//! │   ├── serve      # [serve]
//! │   └── templates  # [templates]
//! ├── types/         # ConfigError
//! └── mod.rs         # CasparConfig (this file)
//! ```
//!
//! The file is optional. Without one, defaults apply and the current
//! directory is the project root.

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{BuildConfig, ProjectConfig, ServeConfig, TemplatesConfig};
pub use types::ConfigError;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cli::{Cli, Commands, StartArgs};
use crate::server::DevServerOptions;
use crate::utils::path::resolve_path;

/// Default config file name, searched upward from the current directory.
pub const CONFIG_FILE: &str = "caspar-graphics.toml";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing caspar-graphics.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CasparConfig {
    /// Absolute path to the config file; empty when none was found
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file, or cwd
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub project: ProjectConfig,

    #[serde(default)]
    pub templates: TemplatesConfig,

    #[serde(default)]
    pub serve: ServeConfig,

    #[serde(default)]
    pub build: BuildConfig,
}

impl CasparConfig {
    /// Load configuration for a CLI invocation.
    ///
    /// Searches upward from cwd for the config file. Paths from the file
    /// resolve against the project root; paths from flags against cwd.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current working directory")?;

        let mut config = match find_config_file(&cli.config, &cwd) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.config_path = path;
                config
            }
            None => {
                crate::debug!("config"; "{} not found, using defaults", cli.config.display());
                Self::default()
            }
        };

        let root = config
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| cwd.clone());

        config.finalize(&root);
        config.apply_command_options(cli, &cwd);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)
            .with_context(|| format!("invalid config file {}", path.display()))?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        crate::log!("warning"; "ignoring unknown fields in {}:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Set the root and resolve every configured path against it.
    fn finalize(&mut self, root: &Path) {
        self.root = root.to_path_buf();
        self.templates.dir = resolve_path(&self.templates.dir, root);
        self.serve.client_dir = resolve_path(&self.serve.client_dir, root);
        self.build.output = resolve_path(&self.build.output, root);

        if self.project.name.is_empty() {
            self.project.name = root
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "caspar-graphics".to_string());
        }
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply command-specific configuration options.
    fn apply_command_options(&mut self, cli: &Cli, cwd: &Path) {
        match &cli.command {
            Commands::Start { args } => self.apply_start_args(args, cwd),
            Commands::Build { .. } => {}
        }
    }

    fn apply_start_args(&mut self, args: &StartArgs, cwd: &Path) {
        Self::update_option(&mut self.serve.host, args.host.as_ref());
        Self::update_option(&mut self.serve.port, args.port.as_ref());
        Self::update_option(&mut self.serve.open, args.open.as_ref());
        Self::update_option(&mut self.project.name, args.name.as_ref());

        if let Some(dir) = &args.templates {
            self.templates.dir = resolve_path(dir, cwd);
        }
        if let Some(dir) = &args.client_dir {
            self.serve.client_dir = resolve_path(dir, cwd);
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(value) = cli_option {
            *config_option = value.clone();
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.serve.host.trim().is_empty() {
            return Err(ConfigError::Validation("[serve] host must not be empty".into()));
        }
        if self.build.command.first().is_some_and(|program| program.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "[build] command must start with a program name".into(),
            ));
        }
        Ok(())
    }

    /// Options for the dev server orchestrator.
    pub fn dev_server_options(&self) -> DevServerOptions {
        DevServerOptions {
            name: self.project.name.clone(),
            host: self.serve.host.clone(),
            port: self.serve.port,
            templates_port: self.serve.templates_port,
            templates_dir: self.templates.dir.clone(),
            client_dir: self.serve.client_dir.clone(),
        }
    }
}

/// Parse config and fail on unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> CasparConfig {
    let (parsed, ignored) = CasparConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn test_unknown_fields_collected() {
        let (_, ignored) =
            CasparConfig::parse_with_ignored("[serve]\nprot = 1\n[extra]\nx = 1").unwrap();
        assert_eq!(ignored, ["serve.prot", "extra"]);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(CasparConfig::parse_with_ignored("[serve\nport = 1").is_err());
        assert!(matches!(
            CasparConfig::parse_with_ignored("[serve]\nport = \"x\""),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn test_finalize_resolves_paths() {
        let mut config = test_parse_config("[templates]\ndir = \"gfx\"\n[build]\noutput = \"../out\"");
        config.finalize(Path::new("/show/project"));

        assert_eq!(config.templates.dir, PathBuf::from("/show/project/gfx"));
        assert_eq!(config.serve.client_dir, PathBuf::from("/show/project/client"));
        assert_eq!(config.build.output, PathBuf::from("/show/out"));
        assert_eq!(config.project.name, "project");
    }

    #[test]
    fn test_finalize_keeps_explicit_name() {
        let mut config = test_parse_config("[project]\nname = \"news\"");
        config.finalize(Path::new("/show/project"));
        assert_eq!(config.project.name, "news");
    }

    #[test]
    fn test_start_flags_override_file() {
        let cli = Cli::parse_from([
            "caspar-graphics",
            "start",
            "--host",
            "0.0.0.0",
            "--port",
            "9000",
            "--templates",
            "elsewhere",
            "--open",
        ]);
        let mut config = test_parse_config("[serve]\nport = 8000");
        config.finalize(Path::new("/show/project"));
        config.apply_command_options(&cli, Path::new("/home/me"));

        assert_eq!(config.serve.host, "0.0.0.0");
        assert_eq!(config.serve.port, 9000);
        assert!(config.serve.open);
        assert_eq!(config.templates.dir, PathBuf::from("/home/me/elsewhere"));
        assert_eq!(config.serve.client_dir, PathBuf::from("/show/project/client"));
    }

    #[test]
    fn test_validate() {
        let mut config = test_parse_config("[build]\ncommand = [\" \"]");
        config.finalize(Path::new("/p"));
        assert!(config.validate().is_err());

        let mut config = test_parse_config("[serve]\nhost = \"\"");
        config.finalize(Path::new("/p"));
        assert!(config.validate().is_err());

        let mut config = test_parse_config("");
        config.finalize(Path::new("/p"));
        assert!(config.validate().is_ok());
    }
}
