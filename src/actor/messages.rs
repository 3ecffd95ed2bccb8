//! Actor Message Definitions
//!
//! Message types for inter-actor communication.
//!
//! ```text
//! FsActor --ChangeBatch--> HubActor --init/update--> Clients
//!                             ^
//! acceptor --Connect----------+
//! ```

use std::path::PathBuf;

use tokio::sync::mpsc;

use crate::manifest::Snapshot;

// =============================================================================
// Watcher output
// =============================================================================

/// One settled group of template file changes.
///
/// Listeners do not need the payload; they pull fresh state through
/// [`TemplateSource::snapshot`]. The paths are kept for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeBatch {
    pub paths: Vec<PathBuf>,
}

/// Something that knows the current templates and reports when they change.
///
/// Implemented by the directory watcher; the hub depends only on this seam.
pub trait TemplateSource: Send + Sync + 'static {
    /// Current templates, recomputed on every call.
    fn snapshot(&self) -> Snapshot;

    /// Register a listener receiving one message per settled change batch.
    fn subscribe(&self) -> mpsc::UnboundedReceiver<ChangeBatch>;
}

// =============================================================================
// HubActor Messages
// =============================================================================

/// Messages to the hub actor
pub enum HubMsg {
    /// A client finished its handshake and wants the live feed
    Connect(Box<dyn crate::actor::ws::Connection>),
    /// Disconnect every client and stop
    Shutdown,
}
