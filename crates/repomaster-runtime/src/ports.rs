//! TCP port availability

use std::net::{SocketAddr, TcpListener, ToSocketAddrs};

use tracing::debug;

use crate::error::{Result, RuntimeError};

/// How many ports after a busy one are searched for a suggestion
pub const SUGGESTION_RANGE: u16 = 10;

/// Whether `port` can be bound on `host` right now
///
/// Every address `host` resolves to must be bindable; `localhost` usually
/// maps to both `127.0.0.1` and `::1`. The listeners are dropped
/// immediately, so the answer can go stale before the child binds.
#[must_use]
pub fn is_available(host: &str, port: u16) -> bool {
    match (host, port).to_socket_addrs() {
        Ok(addrs) => all_bindable(&addrs.collect::<Vec<_>>()),
        Err(e) => {
            debug!(host, port, error = %e, "Cannot resolve host");
            false
        }
    }
}

/// True when every address in `addrs` binds; false for an empty list
#[must_use]
pub fn all_bindable(addrs: &[SocketAddr]) -> bool {
    !addrs.is_empty()
        && addrs.iter().all(|addr| match TcpListener::bind(addr) {
            Ok(_) => true,
            Err(e) => {
                debug!(%addr, error = %e, "Port not available");
                false
            }
        })
}

/// First free port in `start..start + count`
#[must_use]
pub fn find_free(host: &str, start: u16, count: u16) -> Option<u16> {
    (0..count)
        .filter_map(|offset| start.checked_add(offset))
        .find(|&p| is_available(host, p))
}

/// Fail with a port conflict when `port` is busy
///
/// The error suggests the next free port among the following
/// [`SUGGESTION_RANGE`] ports.
///
/// # Errors
/// [`RuntimeError::PortInUse`].
pub fn ensure_available(host: &str, port: u16) -> Result<()> {
    if is_available(host, port) {
        return Ok(());
    }
    let suggestion = port
        .checked_add(1)
        .and_then(|next| find_free(host, next, SUGGESTION_RANGE));
    Err(RuntimeError::PortInUse {
        host: host.to_string(),
        port,
        suggestion,
    })
}
