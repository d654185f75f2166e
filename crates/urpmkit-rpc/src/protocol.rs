//! JSON-RPC 2.0 message types for the urpmd service socket.
//!
//! The urpmd service speaks plain JSON-RPC over its socket: named methods
//! with object params, plus the `OperationProgress` notification emitted
//! during long-running transactions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";
pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

/// Signal name of the progress notification.
pub const PROGRESS_SIGNAL: &str = "OperationProgress";

/// Method names of the urpmd RPC surface.
pub mod methods {
    pub const SEARCH_PACKAGES: &str = "SearchPackages";
    pub const GET_UPDATES: &str = "GetUpdates";
    pub const REFRESH_METADATA: &str = "RefreshMetadata";
    pub const RESOLVE_PACKAGES: &str = "ResolvePackages";
    pub const PREVIEW_INSTALL: &str = "PreviewInstall";
    pub const INSTALL_PACKAGES: &str = "InstallPackages";
    pub const REMOVE_PACKAGES: &str = "RemovePackages";
    pub const UPGRADE_PACKAGES: &str = "UpgradePackages";
    pub const GET_PACKAGE_INFO: &str = "GetPackageInfo";
    pub const GET_INSTALLED_PACKAGES: &str = "GetInstalledPackages";
    pub const GET_PACKAGE_FILES: &str = "GetPackageFiles";
    pub const DOWNLOAD_PACKAGES: &str = "DownloadPackages";
    pub const INSTALL_FILES: &str = "InstallFiles";
    pub const SEARCH_FILES: &str = "SearchFiles";
    pub const WHAT_REQUIRES: &str = "WhatRequires";
    pub const CANCEL_OPERATION: &str = "CancelOperation";
}

/// JSON-RPC 2.0 request id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(u64),
    String(String),
}

impl From<u64> for RequestId {
    fn from(n: u64) -> Self {
        RequestId::Number(n)
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestId::Number(n) => write!(f, "{n}"),
            RequestId::String(s) => write!(f, "{s}"),
        }
    }
}

/// JSON-RPC 2.0 request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub jsonrpc: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
}

impl Request {
    #[must_use]
    pub fn new(method: impl Into<String>, params: Option<Value>, id: RequestId) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
            id: Some(id),
        }
    }
}

/// JSON-RPC 2.0 response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
    pub id: RequestId,
}

impl Response {
    #[must_use]
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    #[must_use]
    pub fn error(id: RequestId, error: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: None,
            error: Some(error),
            id,
        }
    }
}

/// JSON-RPC 2.0 notification (signal).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Notification {
    #[must_use]
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
        }
    }
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    #[must_use]
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    #[must_use]
    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self::new(
            METHOD_NOT_FOUND,
            format!("Method not found: {}", method.into()),
        )
    }

    #[must_use]
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(INTERNAL_ERROR, message)
    }
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RPC error {}: {}", self.code, self.message)
    }
}

impl std::error::Error for RpcError {}

/// Any message that can appear on the socket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
    Request(Request),
    Response(Response),
    Notification(Notification),
}

impl Message {
    /// Unpack a notification frame into its method name and params.
    ///
    /// Untagged decoding maps an id-less notification onto the request
    /// shape, so both forms unpack here. Requests carrying an id and
    /// responses yield `None`.
    #[must_use]
    pub fn into_notification(self) -> Option<(String, Option<Value>)> {
        match self {
            Message::Notification(n) => Some((n.method, n.params)),
            Message::Request(r) if r.id.is_none() => Some((r.method, r.params)),
            _ => None,
        }
    }
}
