//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Development environment for CasparCG HTML graphics templates
#[derive(Parser, Debug, Clone)]
#[command(name = "caspar-graphics", version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file name, searched upward from the current directory
    #[arg(short = 'C', long, global = true, default_value = crate::config::CONFIG_FILE, value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the template dev server with live updates
    Start {
        #[command(flatten)]
        args: StartArgs,
    },

    /// Run the project's build command
    Build {
        #[command(flatten)]
        args: BuildArgs,
    },
}

/// `start` command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct StartArgs {
    /// Host of the UI server (e.g., localhost, 0.0.0.0)
    #[arg(long)]
    pub host: Option<String>,

    /// Port of the UI server
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Template root directory
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub templates: Option<PathBuf>,

    /// Static files of the authoring client
    #[arg(long, value_hint = clap::ValueHint::DirPath)]
    pub client_dir: Option<PathBuf>,

    /// Project name shown by the client
    #[arg(short, long)]
    pub name: Option<String>,

    /// Open the browser once the server is listening
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub open: Option<bool>,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long)]
    pub verbose: bool,
}

/// `build` command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct BuildArgs {
    /// Enable verbose output for debugging
    #[arg(short = 'V', long)]
    pub verbose: bool,

    /// Extra arguments appended to the build command
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

impl Cli {
    pub fn verbose(&self) -> bool {
        match &self.command {
            Commands::Start { args } => args.verbose,
            Commands::Build { args } => args.verbose,
        }
    }
}
