//! Command-line interface module.
//!
//! Without `CASPAR_GRAPHICS_SCRIPT` set, the binary acts as [`launcher`] and
//! re-runs itself as a child; the child parses [`Cli`] and runs a script.

mod args;
pub mod build;
pub mod launcher;
pub mod start;

pub use args::{BuildArgs, Cli, Commands, StartArgs};
