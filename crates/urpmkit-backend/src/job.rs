//! The frontend job sink.
//!
//! A [`JobSink`] is the receiving end of one user-facing operation: the
//! frontend hands the backend a job handle and the backend feeds it typed
//! events. Exactly one `finished` call terminates every job, on success and
//! failure alike.

use std::sync::Mutex;

use urpmkit_types::{DetailRecord, ErrorKind, InfoKind, StatusKind};

/// Event sink of one frontend job.
pub trait JobSink: Send + Sync {
    /// Report the current job status.
    fn set_status(&self, status: StatusKind);

    /// Report job progress, 0 to 100, or [`urpmkit_types::PERCENTAGE_INVALID`]
    /// when progress is unknown.
    fn set_percentage(&self, percentage: u32);

    /// Emit one package record.
    fn package(&self, info: InfoKind, package_id: &str, summary: &str);

    /// Emit detail fields for one package.
    fn details(&self, package_id: &str, detail: &DetailRecord);

    /// Emit the file list of one package.
    fn files(&self, package_id: &str, paths: &[String]);

    /// Emit a minimal update-detail record.
    fn update_detail(&self, package_id: &str, text: &str);

    /// Report a typed error.
    fn error_code(&self, kind: ErrorKind, message: &str);

    /// Mark the job finished. Called exactly once per operation.
    fn finished(&self);
}

/// One recorded sink event.
#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    Status(StatusKind),
    Percentage(u32),
    Package {
        info: InfoKind,
        package_id: String,
        summary: String,
    },
    Details {
        package_id: String,
        description: String,
        url: String,
        license: String,
        size: u64,
    },
    Files {
        package_id: String,
        paths: Vec<String>,
    },
    UpdateDetail {
        package_id: String,
        text: String,
    },
    Error {
        kind: ErrorKind,
        message: String,
    },
    Finished,
}

/// Sink that records every event in order. Test support.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<JobEvent>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<JobEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Recorded package emissions only.
    #[must_use]
    pub fn packages(&self) -> Vec<JobEvent> {
        self.events()
            .into_iter()
            .filter(|e| matches!(e, JobEvent::Package { .. }))
            .collect()
    }

    /// Recorded error emissions only.
    #[must_use]
    pub fn errors(&self) -> Vec<JobEvent> {
        self.events()
            .into_iter()
            .filter(|e| matches!(e, JobEvent::Error { .. }))
            .collect()
    }

    /// Number of `finished` calls seen.
    #[must_use]
    pub fn finished_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, JobEvent::Finished))
            .count()
    }

    fn push(&self, event: JobEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl JobSink for RecordingSink {
    fn set_status(&self, status: StatusKind) {
        self.push(JobEvent::Status(status));
    }

    fn set_percentage(&self, percentage: u32) {
        self.push(JobEvent::Percentage(percentage));
    }

    fn package(&self, info: InfoKind, package_id: &str, summary: &str) {
        self.push(JobEvent::Package {
            info,
            package_id: package_id.to_string(),
            summary: summary.to_string(),
        });
    }

    fn details(&self, package_id: &str, detail: &DetailRecord) {
        self.push(JobEvent::Details {
            package_id: package_id.to_string(),
            description: detail.description.clone(),
            url: detail.url.clone(),
            license: detail.license.clone(),
            size: detail.size,
        });
    }

    fn files(&self, package_id: &str, paths: &[String]) {
        self.push(JobEvent::Files {
            package_id: package_id.to_string(),
            paths: paths.to_vec(),
        });
    }

    fn update_detail(&self, package_id: &str, text: &str) {
        self.push(JobEvent::UpdateDetail {
            package_id: package_id.to_string(),
            text: text.to_string(),
        });
    }

    fn error_code(&self, kind: ErrorKind, message: &str) {
        self.push(JobEvent::Error {
            kind,
            message: message.to_string(),
        });
    }

    fn finished(&self) {
        self.push(JobEvent::Finished);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink_preserves_order() {
        let sink = RecordingSink::new();
        sink.set_status(StatusKind::Query);
        sink.package(InfoKind::Available, "bash;5.2-1;x86_64;urpm", "The shell");
        sink.finished();

        let events = sink.events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], JobEvent::Status(StatusKind::Query));
        assert!(matches!(events[1], JobEvent::Package { .. }));
        assert_eq!(events[2], JobEvent::Finished);
        assert_eq!(sink.finished_count(), 1);
    }
}
