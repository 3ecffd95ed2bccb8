//! caspar-graphics - a local development environment for CasparCG HTML
//! graphics templates.

mod actor;
mod cli;
mod config;
mod core;
mod live;
mod logger;
mod manifest;
mod server;
mod utils;

use std::ffi::OsString;

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands, launcher};
use config::CasparConfig;

fn main() -> Result<()> {
    if !launcher::is_script_mode() {
        let args: Vec<OsString> = std::env::args_os().skip(1).collect();
        let code = launcher::run(&args)?;
        std::process::exit(code);
    }

    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose());

    let config = CasparConfig::load(&cli)?;

    match &cli.command {
        Commands::Start { .. } => run_start(&config),
        Commands::Build { args } => match cli::build::build(&config, args)? {
            0 => Ok(()),
            code => std::process::exit(code),
        },
    }
}

/// Drive the `start` script on a single-threaded runtime.
fn run_start(config: &CasparConfig) -> Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    rt.block_on(cli::start::start(config))
}
