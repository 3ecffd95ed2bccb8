//! Live Update Message Protocol
//!
//! JSON text frames sent from the hub to authoring clients.
//!
//! # Message Types
//!
//! - `init`: first frame on every connection, carries the project name
//! - `update`: sent after every settled template change
//!
//! Both carry the full template snapshot; clients never receive diffs.

use serde::Serialize;

use crate::manifest::TemplateEntry;

/// Live update message sent over WebSocket
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "lowercase")]
pub enum LiveMessage<'a> {
    /// Connection established
    Init {
        #[serde(rename = "projectName")]
        project_name: &'a str,
        templates: &'a [TemplateEntry],
    },

    /// Templates changed on disk
    Update { templates: &'a [TemplateEntry] },
}

impl<'a> LiveMessage<'a> {
    pub fn init(project_name: &'a str, templates: &'a [TemplateEntry]) -> Self {
        Self::Init {
            project_name,
            templates,
        }
    }

    pub fn update(templates: &'a [TemplateEntry]) -> Self {
        Self::Update { templates }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> String {
        // Serializing strings and JSON values cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }
}
