//! Process supervisor for `caspar-graphics <start|build>`.
//!
//! The parent invocation re-runs this executable in script mode as a child
//! with inherited stdio, then turns the child's termination into an exit
//! code. A child killed by a signal always yields exit code 1.

use std::ffi::OsString;
use std::process::ExitStatus;

use anyhow::{Context, Result};
use thiserror::Error;

use crate::utils::exec::Cmd;

/// Set in the child's environment to select script mode.
pub const SCRIPT_ENV: &str = "CASPAR_GRAPHICS_SCRIPT";

const SCRIPTS: [&str; 2] = ["start", "build"];

const SIGKILL: i32 = 9;
const SIGTERM: i32 = 15;

/// A script child that did not exit on its own.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChildSignalError {
    #[error(
        "The build failed because the process exited too early. \
         This probably means the system ran out of memory or someone called \
         `kill -9` on the process."
    )]
    Killed,

    #[error(
        "The build failed because the process exited too early. \
         Someone might have called `kill` or `killall`, or the system could \
         be shutting down."
    )]
    Terminated,

    #[error("the process was stopped by signal {0}")]
    Other(i32),
}

impl ChildSignalError {
    pub fn from_signal(signal: i32) -> Self {
        match signal {
            SIGKILL => Self::Killed,
            SIGTERM => Self::Terminated,
            other => Self::Other(other),
        }
    }

    /// Only the two well-known signals get an operator message.
    fn diagnosis(&self) -> Option<String> {
        match self {
            Self::Other(_) => None,
            known => Some(known.to_string()),
        }
    }
}

/// Whether this process is a script child spawned by the launcher.
pub fn is_script_mode() -> bool {
    std::env::var_os(SCRIPT_ENV).is_some()
}

/// Run the launcher with the arguments after the program name.
///
/// Returns the exit code for this process. Unknown scripts are a silent
/// no-op.
pub fn run(args: &[OsString]) -> Result<i32> {
    let Some(script) = args
        .first()
        .and_then(|arg| arg.to_str())
        .filter(|arg| SCRIPTS.contains(arg))
    else {
        return Ok(0);
    };

    // Ctrl+C reaches the child too; the child decides when to exit
    if let Err(e) = ctrlc::set_handler(|| {}) {
        crate::debug!("launcher"; "cannot ignore Ctrl+C: {}", e);
    }

    let exe = std::env::current_exe().context("cannot locate the caspar-graphics executable")?;
    let status = Cmd::new(exe)
        .args(args)
        .envs([(SCRIPT_ENV, script)])
        .status()?;

    Ok(exit_code(status))
}

/// Map a child's termination to this process's exit code.
pub fn exit_code(status: ExitStatus) -> i32 {
    match termination(status) {
        Ok(code) => code,
        Err(signal) => {
            if let Some(message) = signal.diagnosis() {
                println!("{message}");
            }
            1
        }
    }
}

#[cfg(unix)]
fn termination(status: ExitStatus) -> Result<i32, ChildSignalError> {
    use std::os::unix::process::ExitStatusExt;

    match status.signal() {
        Some(signal) => Err(ChildSignalError::from_signal(signal)),
        None => Ok(status.code().unwrap_or(1)),
    }
}

#[cfg(not(unix))]
fn termination(status: ExitStatus) -> Result<i32, ChildSignalError> {
    Ok(status.code().unwrap_or(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_script_is_noop() {
        assert_eq!(run(&[]).unwrap(), 0);
        assert_eq!(run(&["serve".into()]).unwrap(), 0);
        assert_eq!(run(&["--help".into(), "start".into()]).unwrap(), 0);
    }

    #[test]
    fn test_signal_messages() {
        let killed = ChildSignalError::from_signal(9).diagnosis().unwrap();
        assert!(killed.contains("ran out of memory"));
        assert!(killed.contains("`kill -9`"));

        let terminated = ChildSignalError::from_signal(15).diagnosis().unwrap();
        assert!(terminated.contains("`kill` or `killall`"));

        assert_eq!(ChildSignalError::from_signal(2), ChildSignalError::Other(2));
        assert!(ChildSignalError::Other(2).diagnosis().is_none());
    }

    #[cfg(unix)]
    mod unix {
        use std::os::unix::process::ExitStatusExt;

        use super::*;

        #[test]
        fn test_exit_code_forwarded() {
            assert_eq!(exit_code(ExitStatus::from_raw(0)), 0);
            assert_eq!(exit_code(ExitStatus::from_raw(3 << 8)), 3);
        }

        #[test]
        fn test_signals_exit_one() {
            assert_eq!(exit_code(ExitStatus::from_raw(9)), 1);
            assert_eq!(exit_code(ExitStatus::from_raw(15)), 1);
            assert_eq!(exit_code(ExitStatus::from_raw(2)), 1);
        }

        #[test]
        fn test_real_child_killed() {
            let status = Cmd::new("sh").args(["-c", "kill -9 $$"]).status().unwrap();
            assert_eq!(termination(status), Err(ChildSignalError::Killed));
        }
    }
}
