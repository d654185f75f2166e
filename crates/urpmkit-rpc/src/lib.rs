//! JSON-RPC transport and client for the urpmd service socket.
//!
//! The urpmd package service exposes its RPC surface as JSON-RPC 2.0 over a
//! Unix stream socket, with length-prefixed frames and an
//! `OperationProgress` notification for long-running transactions. This
//! crate provides:
//!
//! - [`protocol`]: message types and the method-name table
//! - [`transport`]: the framing codec
//! - [`client`]: the connected [`ServiceClient`] with per-call timeouts and
//!   progress subscriptions
//! - [`error`]: the client error type

pub mod client;
pub mod error;
pub mod protocol;
pub mod transport;

pub use client::{ServiceClient, socket_path};
pub use error::{ClientError, Result};
pub use protocol::{
    JSONRPC_VERSION, Message, Notification, PROGRESS_SIGNAL, Request, RequestId, Response,
    RpcError, methods,
};
pub use transport::{BusCodec, CodecError};
