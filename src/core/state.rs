//! Shutdown state for the `start` session.
//!
//! The Ctrl+C handler is installed once at program start. A running session
//! claims the shutdown signal with [`shutdown_signal`]; a second Ctrl+C while
//! shutdown is in progress exits immediately.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam::channel::{self, Receiver, Sender};

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Shutdown signal sender for the running session
static SHUTDOWN_TX: OnceLock<Sender<()>> = OnceLock::new();

/// Setup the global Ctrl+C handler. Call once at program start
///
/// Without a registered session (e.g. during `build`) the flag is set and
/// the child command is left to react to the signal itself.
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        if SHUTDOWN.swap(true, Ordering::SeqCst) {
            crate::log!("start"; "forced exit");
            std::process::exit(130);
        }

        if let Some(tx) = SHUTDOWN_TX.get() {
            crate::log!("start"; "shutting down...");
            let _ = tx.try_send(());
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Claim the shutdown signal. Receives once Ctrl+C is pressed.
///
/// A Ctrl+C that arrived before the call is delivered immediately.
pub fn shutdown_signal() -> Receiver<()> {
    let (tx, rx) = channel::bounded(1);
    if SHUTDOWN_TX.set(tx).is_err() {
        crate::debug!("start"; "shutdown signal already claimed");
    }
    if is_shutdown()
        && let Some(tx) = SHUTDOWN_TX.get()
    {
        let _ = tx.try_send(());
    }
    rx
}

/// Check if shutdown has been requested
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}
