//! `[serve]` section configuration.
//!
//! Contains development server settings.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! host = "localhost"        # Host of the UI/proxy server
//! port = 8080               # Port of the UI/proxy server
//! templates_port = 5173     # Preferred port of the template preview server
//! client_dir = "client"     # Static files of the authoring client
//! open = false              # Open the browser once listening
//! ```
//!
//! Use `host = "0.0.0.0"` to make the server accessible from LAN.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Development server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Host name or address of the UI/proxy server.
    /// - `localhost` (default): this machine only
    /// - `0.0.0.0`: all interfaces (LAN accessible)
    pub host: String,

    /// Public HTTP port.
    pub port: u16,

    /// Preferred port of the preview server; any free port is used when taken.
    pub templates_port: u16,

    /// Built authoring client, relative to the project root.
    pub client_dir: PathBuf,

    /// Open the default browser after the server starts.
    pub open: bool,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 8080,
            templates_port: 5173,
            client_dir: PathBuf::from("client"),
            open: false,
        }
    }
}
