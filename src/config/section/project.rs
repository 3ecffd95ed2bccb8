//! `[project]` section configuration.
//!
//! ```toml
//! [project]
//! name = "news-graphics"   # Shown in the authoring client (default: root dir name)
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Project name sent to clients. Empty means "use the root directory name".
    pub name: String,
}
