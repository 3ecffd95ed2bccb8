//! Live template updates for the authoring client.
//!
//! - `message` - `init`/`update` frame format
//! - `server` - WebSocket acceptor feeding the hub actor

pub mod message;
pub mod server;

pub use server::HubServer;
