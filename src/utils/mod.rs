//! Utility modules shared by the servers and the CLI.

pub mod exec;
pub mod mime;
pub mod path;
