use crate::live::message::LiveMessage;

use super::{Connection, HubActor};

impl HubActor {
    /// Send `init` to a new client, then register it for updates.
    pub(super) fn add_client(&mut self, mut client: Box<dyn Connection>) {
        let snapshot = self.source.snapshot();
        let init = LiveMessage::init(&self.project_name, &snapshot).to_json();

        if let Err(e) = client.send_text(&init) {
            crate::debug!("hub"; "failed to send init: {}", e);
            return;
        }

        self.clients.push(client);
        crate::debug!("hub"; "client connected (total: {})", self.clients.len());
    }

    /// Broadcast the current snapshot to every open client.
    pub(super) fn broadcast_update(&mut self) {
        if self.clients.is_empty() {
            crate::debug!("hub"; "no clients connected");
            return;
        }

        let snapshot = self.source.snapshot();
        let update = LiveMessage::update(&snapshot).to_json();
        let count = self.clients.len();

        self.clients.retain_mut(|client| match client.send_text(&update) {
            Ok(()) => true,
            Err(e) => {
                crate::debug!("hub"; "client disconnected: {}", e);
                false
            }
        });
        crate::debug!("hub"; "update sent to {} of {} clients", self.clients.len(), count);
    }

    /// Drop clients that hung up.
    pub(super) fn poll_clients(&mut self) {
        let before = self.clients.len();
        self.clients.retain_mut(|client| client.poll());
        let gone = before - self.clients.len();
        if gone > 0 {
            crate::debug!("hub"; "{} client(s) disconnected (total: {})", gone, self.clients.len());
        }
    }

    pub(super) fn close_all(&mut self) {
        for mut client in self.clients.drain(..) {
            client.close();
        }
    }
}
