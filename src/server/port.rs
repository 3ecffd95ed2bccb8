//! Free port discovery.

use std::net::TcpListener;

use super::ServeError;

/// Find a free TCP port on `host`.
///
/// Returns `preferred` when it can be bound, otherwise any port the OS hands
/// out (`Some(0)` counts as no preference). The test socket is released
/// before returning, so the caller binds the port again.
pub fn allocate(host: &str, preferred: Option<u16>) -> Result<u16, ServeError> {
    if let Some(port) = preferred.filter(|&port| port != 0) {
        if TcpListener::bind((host, port)).is_ok() {
            return Ok(port);
        }
        crate::debug!("serve"; "port {} in use, picking a free one", port);
    }

    let error = |source| ServeError::PortAllocation {
        host: host.to_string(),
        source,
    };
    let listener = TcpListener::bind((host, 0)).map_err(error)?;
    let port = listener.local_addr().map_err(error)?.port();
    Ok(port)
}
