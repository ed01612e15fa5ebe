//! Shutdown signals
//!
//! Ctrl+C and SIGTERM are turned into a [`CancellationToken`] so the
//! supervisor can react without owning the signal handlers.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
///
/// If a handler cannot be installed that branch never completes.
pub async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received SIGTERM signal");
        }
    }
}

/// Background listener that cancels a token on the first shutdown signal
///
/// The listener task is aborted when this value is dropped.
pub struct ShutdownListener {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl ShutdownListener {
    /// Spawn the listener on the current runtime
    #[must_use]
    pub fn install() -> Self {
        let token = CancellationToken::new();
        let trigger = token.clone();
        let handle = tokio::spawn(async move {
            wait_for_shutdown_signal().await;
            trigger.cancel();
        });
        Self { token, handle }
    }

    /// Token cancelled on Ctrl+C or SIGTERM
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

impl Drop for ShutdownListener {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_listener_token_starts_live() {
        let listener = ShutdownListener::install();
        let token = listener.token();
        assert!(!token.is_cancelled());
        drop(listener);
        assert!(!token.is_cancelled());
    }
}
