//! RPC client for the urpmd service.
//!
//! Wraps a Unix-socket connection with request/response correlation and a
//! broadcast subscription for `OperationProgress` notifications. Responses
//! are routed to their waiting callers by request id; progress notifications
//! fan out to whoever holds a subscription at the time.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::UnixStream;
use tokio::sync::{Mutex, broadcast, oneshot};
use tokio_util::codec::Framed;

use urpmkit_types::ProgressSignal;

use crate::error::ClientError;
use crate::protocol::{Message, PROGRESS_SIGNAL, Request, RequestId, Response};
use crate::transport::BusCodec;

/// Default socket of the system urpmd daemon.
const DEFAULT_SOCKET: &str = "/run/urpmd/urpmd.sock";

/// Buffered progress notifications per subscription.
const PROGRESS_CHANNEL_CAPACITY: usize = 64;

/// Get the urpmd service socket path.
///
/// Honors `$URPMD_SOCKET` so tests and sandboxed sessions can point the
/// bridge at a private socket.
#[must_use]
pub fn socket_path() -> PathBuf {
    std::env::var_os("URPMD_SOCKET").map_or_else(|| PathBuf::from(DEFAULT_SOCKET), PathBuf::from)
}

/// Pending request waiting for a response.
type PendingRequest = oneshot::Sender<Result<Response, ClientError>>;

type MessageSink = futures_util::stream::SplitSink<Framed<UnixStream, BusCodec>, Message>;

/// Connected client for the urpmd service socket.
pub struct ServiceClient {
    sender: Mutex<MessageSink>,
    pending: Arc<Mutex<HashMap<RequestId, PendingRequest>>>,
    next_id: AtomicU64,
    progress: broadcast::Sender<ProgressSignal>,
    closed: Arc<AtomicBool>,
}

impl std::fmt::Debug for ServiceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceClient").finish_non_exhaustive()
    }
}

impl ServiceClient {
    /// Connect to the urpmd service at the default socket path.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Io` if the socket connection fails.
    pub async fn connect() -> Result<Self, ClientError> {
        Self::connect_to(socket_path()).await
    }

    /// Connect to the urpmd service at a custom socket path.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Io` if the socket connection fails.
    pub async fn connect_to(path: PathBuf) -> Result<Self, ClientError> {
        let stream = UnixStream::connect(&path).await?;
        let framed = Framed::new(stream, BusCodec::new());
        let (sink, stream) = framed.split();

        let pending: Arc<Mutex<HashMap<RequestId, PendingRequest>>> =
            Arc::new(Mutex::new(HashMap::new()));
        let (progress, _) = broadcast::channel(PROGRESS_CHANNEL_CAPACITY);
        let closed = Arc::new(AtomicBool::new(false));

        let pending_clone = pending.clone();
        let progress_clone = progress.clone();
        let closed_clone = closed.clone();

        tokio::spawn(async move {
            let mut stream = stream;
            while let Some(result) = stream.next().await {
                match result {
                    Ok(Message::Response(resp)) => {
                        let mut pending = pending_clone.lock().await;
                        if let Some(tx) = pending.remove(&resp.id) {
                            let _ = tx.send(Ok(resp));
                        }
                    }
                    Ok(message) => match message.into_notification() {
                        Some((method, params)) if method == PROGRESS_SIGNAL => {
                            match serde_json::from_value::<ProgressSignal>(
                                params.unwrap_or_default(),
                            ) {
                                // No receiver means no operation is listening; fine.
                                Ok(signal) => {
                                    let _ = progress_clone.send(signal);
                                }
                                Err(e) => {
                                    tracing::warn!("Unparseable progress signal: {e}");
                                }
                            }
                        }
                        Some((method, _)) => {
                            tracing::trace!("Ignoring notification '{method}'");
                        }
                        None => {
                            tracing::trace!("Ignoring inbound request");
                        }
                    },
                    Err(e) => {
                        let mut pending = pending_clone.lock().await;
                        for (_, tx) in pending.drain() {
                            let _ = tx.send(Err(ClientError::Codec(
                                crate::transport::CodecError::Io(std::io::Error::other(
                                    e.to_string(),
                                )),
                            )));
                        }
                        break;
                    }
                }
            }

            closed_clone.store(true, Ordering::SeqCst);
            let mut pending = pending_clone.lock().await;
            for (_, tx) in pending.drain() {
                let _ = tx.send(Err(ClientError::ConnectionClosed));
            }
        });

        Ok(Self {
            sender: Mutex::new(sink),
            pending,
            next_id: AtomicU64::new(1),
            progress,
            closed,
        })
    }

    /// Whether the reader task has observed the connection going away.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Subscribe to `OperationProgress` notifications.
    ///
    /// Only signals arriving while the receiver is alive are delivered;
    /// dropping the receiver tears the subscription down.
    #[must_use]
    pub fn progress_events(&self) -> broadcast::Receiver<ProgressSignal> {
        self.progress.subscribe()
    }

    /// Send an RPC request and wait for the response, bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if sending fails, the deadline passes, the
    /// connection closes, the service reports an RPC error, or the result
    /// does not deserialize to `T`.
    pub async fn request<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
        timeout: Duration,
    ) -> Result<T, ClientError> {
        if self.is_closed() {
            return Err(ClientError::ConnectionClosed);
        }

        let id = RequestId::Number(self.next_id.fetch_add(1, Ordering::SeqCst));
        let request = Request::new(method, params, id.clone());

        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().await;
            pending.insert(id.clone(), tx);
        }

        let sent = {
            let mut sender = self.sender.lock().await;
            sender.send(Message::Request(request)).await
        };
        if let Err(e) = sent {
            self.pending.lock().await.remove(&id);
            return Err(e.into());
        }

        let response = match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(result)) => result?,
            Ok(Err(_)) => return Err(ClientError::ConnectionClosed),
            Err(_) => {
                self.pending.lock().await.remove(&id);
                return Err(ClientError::Timeout);
            }
        };

        if let Some(error) = response.error {
            return Err(error.into());
        }

        let result = response.result.ok_or(ClientError::UnexpectedResponse)?;
        Ok(serde_json::from_value(result)?)
    }
}
