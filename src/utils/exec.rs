//! External command execution.
//!
//! A small builder for running a child process with inherited stdio, used
//! by the launcher (re-running this executable in script mode) and by the
//! `build` script (running the configured build command).
//!
//! # Examples
//!
//! ```ignore
//! use crate::utils::exec::Cmd;
//!
//! let status = Cmd::from_slice(&["npm", "run", "build"])
//!     .cwd(root)
//!     .envs([("CASPAR_OUTPUT_DIR", "dist")])
//!     .status()?;
//! ```

use anyhow::{Context, Result};
use std::{
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
    process::{Command, ExitStatus},
};

/// Command builder for external process execution.
#[derive(Debug, Default)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    envs: Vec<(OsString, OsString)>,
}

impl Cmd {
    /// Create a new command builder.
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            program: program.as_ref().to_owned(),
            ..Default::default()
        }
    }

    /// Create from a command array (e.g., `["npm", "run", "build"]`).
    pub fn from_slice<S: AsRef<OsStr>>(cmd: &[S]) -> Self {
        let mut iter = cmd.iter();
        let program = iter
            .next()
            .map(|s| s.as_ref().to_owned())
            .unwrap_or_default();
        Self::new(program).args(iter)
    }

    /// Add a single argument.
    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        let arg = arg.as_ref();
        if !arg.is_empty() {
            self.args.push(arg.to_owned());
        }
        self
    }

    /// Add multiple arguments. Empty ones are skipped.
    pub fn args<I, S>(self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        args.into_iter().fold(self, |cmd, arg| cmd.arg(arg))
    }

    /// Set working directory.
    pub fn cwd<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.cwd = Some(dir.as_ref().to_owned());
        self
    }

    /// Set environment variables for the subprocess.
    pub fn envs<K, V, I>(mut self, vars: I) -> Self
    where
        K: AsRef<OsStr>,
        V: AsRef<OsStr>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (k, v) in vars {
            self.envs.push((k.as_ref().to_owned(), v.as_ref().to_owned()));
        }
        self
    }

    fn program_name(&self) -> String {
        self.program.to_string_lossy().to_string()
    }

    /// Locate the program, relative to the working directory or on `PATH`.
    fn resolve_program(&self) -> Result<PathBuf> {
        let name = self.program_name();
        if self.program.is_empty() {
            anyhow::bail!("no program given");
        }

        let cwd = match &self.cwd {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().context("failed to get current working directory")?,
        };
        let search_path = std::env::var_os("PATH");
        which::which_in(&self.program, search_path, &cwd)
            .with_context(|| format!("`{name}` not found"))
    }

    /// Run to completion with inherited stdio and return the exit status.
    ///
    /// A non-zero status is not an error; callers decide what it means.
    pub fn status(self) -> Result<ExitStatus> {
        let name = self.program_name();
        let program = self.resolve_program()?;

        let mut cmd = Command::new(program);
        cmd.args(&self.args).envs(self.envs.iter().cloned());
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }

        let shown: Vec<_> = self.args.iter().map(|a| a.to_string_lossy()).collect();
        crate::debug!("exec"; "{} {}", name, shown.join(" "));

        cmd.status()
            .with_context(|| format!("Failed to execute `{name}`"))
    }
}

// ============================================================================
// Tests
// ============================================================================
