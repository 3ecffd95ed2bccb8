//! `[templates]` section configuration.
//!
//! ```toml
//! [templates]
//! dir = "src/templates"   # One sub-directory per template
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplatesConfig {
    /// Template root, relative to the project root.
    pub dir: PathBuf,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("src/templates"),
        }
    }
}
