//! Template manifests
//!
//! Every template directory may carry a `manifest.json` describing its
//! configurable properties (`schema`), sample presets (`previewData`) and
//! thumbnails (`previewImages`). The dev server never hands the raw file to
//! the authoring client; it sends the normalized form produced here.
//!
//! ```text
//! manifest.json ──parse──> serde_json::Value ──normalize──> Manifest
//!                                                             │
//!                                            TemplateEntry { name, manifest }
//! ```

mod normalize;


pub use normalize::{normalize, normalize_value};

use serde::Serialize;
#[cfg(test)]
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

/// File name of the per-template manifest.
pub const MANIFEST_FILE: &str = "manifest.json";

/// File name of the template entry point.
pub const INDEX_FILE: &str = "index.html";

/// URL namespace the template preview server is mounted under.
pub const TEMPLATES_BASE: &str = "/templates/";

/// Manifest content is not valid JSON.
#[derive(Debug, Error)]
#[error("invalid manifest JSON: {0}")]
pub struct ManifestParseError(#[from] serde_json::Error);

/// A normalized manifest.
///
/// Wraps the whole JSON document so unknown fields (and their order) reach
/// the client untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Manifest(Value);

#[cfg(test)]
impl Manifest {
    /// Property definitions keyed by property name.
    pub fn schema(&self) -> Option<&Map<String, Value>> {
        self.0.get("schema").and_then(Value::as_object)
    }

    /// Named presets, each mapping property key to a value.
    pub fn preview_data(&self) -> Option<&Map<String, Value>> {
        self.0.get("previewData").and_then(Value::as_object)
    }

    /// A single preset by name.
    pub fn preset(&self, name: &str) -> Option<&Map<String, Value>> {
        self.preview_data()?.get(name).and_then(Value::as_object)
    }

    /// Preview image paths, skipping entries that are not strings.
    pub fn preview_images(&self) -> Option<Vec<&str>> {
        let images = self.0.get("previewImages")?.as_array()?;
        Some(images.iter().filter_map(Value::as_str).collect())
    }

    /// Declared default for a schema property.
    pub fn default_for(&self, key: &str) -> Option<&Value> {
        self.schema()?.get(key)?.get("default")
    }

    pub fn as_json(&self) -> &Value {
        &self.0
    }
}

/// One selectable template, as sent to the authoring client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateEntry {
    /// Last path segment of the template directory.
    pub name: String,
    /// `None` when the directory has no manifest or it failed to parse.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest: Option<Manifest>,
}

/// All templates currently known to the watcher, ordered by name.
pub type Snapshot = Vec<TemplateEntry>;
