//! RPC dispatch with per-operation timeouts.
//!
//! Two call shapes exist on the service: query methods return a JSON
//! document in a string, mutating methods return a `(success, message)`
//! acknowledgement. Long-running acknowledged calls additionally stream
//! `OperationProgress` notifications, drained here into the caller's
//! progress translator until the response arrives.

use std::time::Duration;

use serde_json::Value;
use tokio::sync::broadcast::error::RecvError;

use urpmkit_types::Ack;

use crate::connection::ConnectionManager;
use crate::error::BackendError;
use crate::job::JobSink;
use crate::progress::ProgressTranslator;

/// Per-operation call deadlines. Fixed design parameters, not configurable.
pub mod timeouts {
    use std::time::Duration;

    /// Metadata and single-name queries.
    pub const DEFAULT: Duration = Duration::from_secs(25);
    /// File listing and reverse-dependency queries.
    pub const FILE_QUERY: Duration = Duration::from_secs(30);
    /// Transaction previews.
    pub const PREVIEW: Duration = Duration::from_secs(60);
    /// Full installed-package enumeration.
    pub const INSTALLED_LIST: Duration = Duration::from_secs(120);
    /// Metadata refresh, removals, and large resolve batches.
    pub const MAINTENANCE: Duration = Duration::from_secs(300);
    /// Installs, downloads, and file installs.
    pub const TRANSACTION: Duration = Duration::from_secs(600);
    /// Full-system upgrade.
    pub const FULL_UPGRADE: Duration = Duration::from_secs(1800);
    /// Best-effort cancellation.
    pub const CANCEL: Duration = Duration::from_secs(5);
}

/// Issues RPC operations over the managed connection.
pub struct Dispatcher {
    connections: ConnectionManager,
}

impl Dispatcher {
    #[must_use]
    pub fn new(connections: ConnectionManager) -> Self {
        Self { connections }
    }

    /// Establish (or reuse) the service connection without calling anything.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::ServiceUnavailable`] if connecting fails.
    pub async fn ensure(&self) -> Result<(), BackendError> {
        self.connections.ensure().await.map(|_| ())
    }

    /// Call a query method returning a JSON document string.
    ///
    /// # Errors
    ///
    /// Connection failures surface as `ServiceUnavailable`, everything else
    /// (transport, timeout, RPC-level errors) as `OperationFailed`.
    pub async fn call_text(
        &self,
        method: &str,
        params: Option<Value>,
        timeout: Duration,
    ) -> Result<String, BackendError> {
        let client = self.connections.ensure().await?;
        client
            .request::<String>(method, params, timeout)
            .await
            .map_err(|e| BackendError::OperationFailed(e.to_string()))
    }

    /// Call an acknowledged method returning `(success, message)`.
    ///
    /// # Errors
    ///
    /// Same mapping as [`Dispatcher::call_text`].
    pub async fn call_ack(
        &self,
        method: &str,
        params: Option<Value>,
        timeout: Duration,
    ) -> Result<Ack, BackendError> {
        let client = self.connections.ensure().await?;
        client
            .request::<Ack>(method, params, timeout)
            .await
            .map_err(|e| BackendError::OperationFailed(e.to_string()))
    }

    /// Call an acknowledged method while feeding progress signals to the
    /// translator.
    ///
    /// The subscription lives only for the duration of this call: it is
    /// taken immediately before the request goes out and dropped on every
    /// exit path, success, failure, and timeout alike.
    ///
    /// # Errors
    ///
    /// Same mapping as [`Dispatcher::call_text`].
    pub async fn call_ack_with_progress<J: JobSink + ?Sized>(
        &self,
        method: &str,
        params: Option<Value>,
        timeout: Duration,
        translator: &mut ProgressTranslator<'_, J>,
    ) -> Result<Ack, BackendError> {
        let client = self.connections.ensure().await?;
        let mut events = client.progress_events();

        let call = client.request::<Ack>(method, params, timeout);
        tokio::pin!(call);

        loop {
            tokio::select! {
                // Buffered signals are applied before the response is taken
                // so late progress is never dropped.
                biased;
                event = events.recv() => match event {
                    Ok(signal) => translator.handle(&signal),
                    Err(RecvError::Lagged(missed)) => {
                        tracing::warn!("dropped {missed} progress signals");
                    }
                    Err(RecvError::Closed) => {
                        return (&mut call)
                            .await
                            .map_err(|e| BackendError::OperationFailed(e.to_string()));
                    }
                },
                result = &mut call => {
                    return result.map_err(|e| BackendError::OperationFailed(e.to_string()));
                }
            }
        }
    }

    /// Fire one call on the existing connection, if any, ignoring the
    /// outcome. Never connects.
    pub async fn call_best_effort(&self, method: &str, timeout: Duration) {
        let Some(client) = self.connections.current().await else {
            return;
        };
        if let Err(e) = client.request::<Value>(method, None, timeout).await {
            tracing::debug!("best-effort {method} call failed: {e}");
        }
    }

    #[must_use]
    pub fn connections(&self) -> &ConnectionManager {
        &self.connections
    }
}
