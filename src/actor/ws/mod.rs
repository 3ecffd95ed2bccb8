//! Broadcast Hub Actor
//!
//! Owns every live-update connection:
//! - Sends `init` to each new client before registering it
//! - Sends `update` to all registered clients after each settled change
//! - Drops clients that hang up
//!
//! # Architecture
//!
//! ```text
//! acceptor --[Connect]--> HubActor --[init/update]--> Clients
//!                            ^
//! TemplateSource --[ChangeBatch]
//! ```

mod client_io;
mod delivery;


use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

pub use client_io::WsConnection;

use super::messages::{ChangeBatch, HubMsg, TemplateSource};

/// How often clients are checked for hang-ups.
const CLIENT_POLL_MS: u64 = 100;

/// One open client connection.
///
/// Implemented over a real WebSocket by [`WsConnection`]; tests use an
/// in-memory version.
pub trait Connection: Send {
    /// Queue a text frame.
    fn send_text(&mut self, text: &str) -> tungstenite::Result<()>;

    /// Process incoming frames and flush pending writes.
    /// Returns `false` once the peer is gone.
    fn poll(&mut self) -> bool;

    /// Send a close frame; errors are ignored.
    fn close(&mut self);
}

/// Broadcast Hub Actor - fans template snapshots out to clients
pub struct HubActor {
    rx: mpsc::Receiver<HubMsg>,
    /// The hub's single watcher subscription
    changes: mpsc::UnboundedReceiver<ChangeBatch>,
    source: Arc<dyn TemplateSource>,
    project_name: String,
    clients: Vec<Box<dyn Connection>>,
}

impl HubActor {
    pub fn new(
        rx: mpsc::Receiver<HubMsg>,
        source: Arc<dyn TemplateSource>,
        project_name: impl Into<String>,
    ) -> Self {
        let changes = source.subscribe();
        Self {
            rx,
            changes,
            source,
            project_name: project_name.into(),
            clients: Vec::new(),
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        let mut source_open = true;
        let mut client_poll = tokio::time::interval(Duration::from_millis(CLIENT_POLL_MS));
        client_poll.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                // Drain queued batches before admitting a client
                batch = self.changes.recv(), if source_open => match batch {
                    Some(batch) => {
                        crate::debug!("hub"; "{} path(s) changed", batch.paths.len());
                        self.broadcast_update();
                    }
                    None => {
                        crate::debug!("hub"; "template source closed");
                        source_open = false;
                    }
                },

                msg = self.rx.recv() => match msg {
                    Some(HubMsg::Connect(client)) => self.add_client(client),
                    Some(HubMsg::Shutdown) | None => {
                        crate::debug!("hub"; "shutting down");
                        self.close_all();
                        break;
                    }
                },

                _ = client_poll.tick() => self.poll_clients(),
            }
        }
    }
}
