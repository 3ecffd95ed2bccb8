//! `build` script: run the project's configured build command.

use std::ffi::OsString;

use anyhow::{Result, bail};

use crate::cli::BuildArgs;
use crate::config::{CONFIG_FILE, CasparConfig};
use crate::log;
use crate::utils::exec::Cmd;

/// Run the build command in the project root. Returns its exit code.
pub fn build(config: &CasparConfig, args: &BuildArgs) -> Result<i32> {
    if config.build.command.is_empty() {
        bail!("no build command configured; set `[build] command` in {CONFIG_FILE}");
    }

    log!("build"; "running `{}`", config.build.command.join(" "));

    let status = Cmd::from_slice(&config.build.command)
        .args(&args.args)
        .cwd(&config.root)
        .envs(build_env(config))
        .status()?;

    match status.code() {
        Some(0) => {
            log!("build"; "done: {}", config.build.output.display());
            Ok(0)
        }
        Some(code) => {
            log!("build"; "command failed with {}", status);
            Ok(code)
        }
        None => {
            log!("build"; "command failed with {}", status);
            Ok(1)
        }
    }
}

fn build_env(config: &CasparConfig) -> [(&'static str, OsString); 3] {
    [
        ("CASPAR_TEMPLATES_DIR", config.templates.dir.clone().into_os_string()),
        ("CASPAR_OUTPUT_DIR", config.build.output.clone().into_os_string()),
        ("CASPAR_PROJECT_NAME", config.project.name.clone().into()),
    ]
}
