//! `[build]` section configuration.
//!
//! ```toml
//! [build]
//! command = ["npx", "vite", "build"]   # Run by `caspar-graphics build`
//! output = "dist"
//! ```
//!
//! The command runs in the project root with `CASPAR_TEMPLATES_DIR`,
//! `CASPAR_OUTPUT_DIR` and `CASPAR_PROJECT_NAME` in its environment.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Program and arguments. Empty means no build is configured.
    pub command: Vec<String>,

    /// Output directory, relative to the project root.
    pub output: PathBuf,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            command: Vec::new(),
            output: PathBuf::from("dist"),
        }
    }
}
