//! Lazy connection management for the urpmd service socket.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;

use urpmkit_rpc::{ServiceClient, socket_path};

use crate::error::BackendError;

/// Owns the single client connection to the urpmd service.
///
/// Connects lazily on first use and reuses the connection for subsequent
/// calls; a new connection is made only when the previous one is absent or
/// has been observed closed.
pub struct ConnectionManager {
    path: PathBuf,
    slot: Mutex<Option<Arc<ServiceClient>>>,
}

impl ConnectionManager {
    /// Manager for the default service socket (honoring `$URPMD_SOCKET`).
    #[must_use]
    pub fn new() -> Self {
        Self::with_path(socket_path())
    }

    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            slot: Mutex::new(None),
        }
    }

    /// Get a live client, connecting if necessary.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::ServiceUnavailable`] if the socket cannot be
    /// connected.
    pub async fn ensure(&self) -> Result<Arc<ServiceClient>, BackendError> {
        let mut slot = self.slot.lock().await;
        if let Some(client) = slot.as_ref()
            && !client.is_closed()
        {
            return Ok(client.clone());
        }

        let client = ServiceClient::connect_to(self.path.clone())
            .await
            .map_err(|e| BackendError::ServiceUnavailable(e.to_string()))?;
        let client = Arc::new(client);
        *slot = Some(client.clone());
        Ok(client)
    }

    /// Currently held client, if any. Never connects.
    pub async fn current(&self) -> Option<Arc<ServiceClient>> {
        self.slot.lock().await.clone()
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}
