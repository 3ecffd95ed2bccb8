//! Actor System for Live Template Updates
//!
//! Message-passing concurrency for the dev server:
//!
//! ```text
//! FsActor --ChangeBatch--> HubActor --init/update--> clients
//! (watch)                  (broadcast)
//! ```
//!
//! # Module Structure
//!
//! - `messages` - Message types for inter-actor communication
//! - `fs` - Template directory watcher with debouncing
//! - `ws` - WebSocket broadcast hub

pub mod fs;
pub mod messages;
pub mod ws;
