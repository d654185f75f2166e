//! Translation layer between the urpmd package service and a generic
//! package-manager frontend.
//!
//! The frontend drives operations through [`Backend`] and receives typed
//! events on a [`JobSink`]: package records, detail/file records, status
//! and percentage updates, typed errors, and exactly one `finished` per
//! operation. The backend talks JSON-RPC to the urpmd service socket and
//! translates its stringly-typed JSON responses and progress signals into
//! that event stream.

pub mod connection;
pub mod decode;
pub mod dispatch;
pub mod error;
pub mod job;
pub mod ops;
pub mod progress;

pub use connection::ConnectionManager;
pub use dispatch::{Dispatcher, timeouts};
pub use error::BackendError;
pub use job::{JobEvent, JobSink, RecordingSink};
pub use ops::Backend;
pub use progress::ProgressTranslator;
