//! Translation of service progress signals into job status/percentage.
//!
//! A long-running transaction is modeled as two equal-weight stages:
//! downloading occupies 0-50 of the job percentage and installing 50-100.
//! Status changes for those two phases are edge-triggered; the resolving
//! phase re-reports its status on every signal.

use urpmkit_types::{Phase, ProgressSignal, StatusKind};

use crate::job::JobSink;

/// Per-operation progress state.
///
/// Owned by a single in-flight operation; signals for that operation are
/// delivered strictly in order, never concurrently.
pub struct ProgressTranslator<'j, J: JobSink + ?Sized> {
    job: &'j J,
    in_download: bool,
}

impl<'j, J: JobSink + ?Sized> ProgressTranslator<'j, J> {
    pub fn new(job: &'j J) -> Self {
        Self {
            job,
            in_download: false,
        }
    }

    /// Apply one progress signal to the job.
    pub fn handle(&mut self, signal: &ProgressSignal) {
        let percentage = signal.percentage();
        match signal.phase {
            Phase::Resolving => {
                self.job.set_status(StatusKind::DependencyResolution);
                self.job.set_percentage(0);
            }
            Phase::Downloading => {
                if !self.in_download {
                    self.in_download = true;
                    self.job.set_status(StatusKind::Downloading);
                }
                self.job.set_percentage(percentage / 2);
            }
            Phase::Installing => {
                if self.in_download {
                    self.in_download = false;
                    self.job.set_status(StatusKind::Installing);
                }
                self.job.set_percentage(50 + percentage / 2);
            }
            Phase::Unknown => {
                tracing::debug!(package = %signal.package, "ignoring unrecognized progress phase");
            }
        }
    }
}
