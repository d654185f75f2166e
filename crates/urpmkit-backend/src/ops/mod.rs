//! Operation orchestrators, one per user-facing verb.
//!
//! Each orchestrator composes the dispatcher, decoder, and progress
//! translator into one call sequence and feeds the job sink. Every
//! orchestrator marks the job finished exactly once, on success and on
//! every failure path.

mod query;
mod transact;

use std::path::PathBuf;

use urpmkit_rpc::socket_path;
use urpmkit_types::PackageId;

use crate::connection::ConnectionManager;
use crate::dispatch::Dispatcher;

/// The urpm backend.
///
/// Holds the service connection; one instance serves any number of
/// sequential operations. The frontend guarantees at most one operation is
/// active per job handle.
pub struct Backend {
    dispatch: Dispatcher,
}

impl Backend {
    /// Backend talking to the default service socket.
    #[must_use]
    pub fn new() -> Self {
        Self::with_socket(socket_path())
    }

    /// Backend talking to a custom service socket.
    #[must_use]
    pub fn with_socket(path: PathBuf) -> Self {
        Self {
            dispatch: Dispatcher::new(ConnectionManager::with_path(path)),
        }
    }

    pub(crate) fn dispatch(&self) -> &Dispatcher {
        &self.dispatch
    }

    #[must_use]
    pub fn description() -> &'static str {
        "urpm backend for Mageia Linux"
    }

    #[must_use]
    pub fn author() -> &'static str {
        "Mageia Community <mageia-dev@mageia.org>"
    }

    /// Package groups advertised to the frontend.
    #[must_use]
    pub fn groups() -> &'static [&'static str] {
        &[
            "accessibility",
            "admin-tools",
            "communication",
            "desktop-gnome",
            "desktop-kde",
            "desktop-other",
            "education",
            "fonts",
            "games",
            "graphics",
            "internet",
            "multimedia",
            "network",
            "office",
            "other",
            "programming",
            "publishing",
            "security",
            "system",
            "virtualization",
        ]
    }

    /// Filters the backend can honor.
    #[must_use]
    pub fn filters() -> &'static [&'static str] {
        &["installed", "~installed", "arch", "newest"]
    }

    #[must_use]
    pub fn mime_types() -> &'static [&'static str] {
        &["application/x-rpm"]
    }

    /// Operations are serialized per backend instance.
    #[must_use]
    pub fn supports_parallelization() -> bool {
        false
    }
}

impl Default for Backend {
    fn default() -> Self {
        Self::new()
    }
}

/// Bare package name of a target identifier.
///
/// Targets arrive either as canonical package ids or as plain names; any
/// version and arch qualifiers are discarded.
pub(crate) fn target_name(target: &str) -> String {
    PackageId::parse(target).map_or_else(|_| target.to_string(), |id| id.name)
}
