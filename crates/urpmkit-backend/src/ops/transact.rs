//! Mutating verbs: install, remove, update, refresh, download, cancel.
//!
//! Install, remove, and update run in one of two modes. Simulate mode never
//! mutates: install previews the transaction without emitting records,
//! remove and update synthesize "would change" records straight from the
//! input ids. Real mode performs the mutating call and maps a reported
//! failure onto the verb-specific error code.

use std::path::Path;

use serde_json::json;

use urpmkit_rpc::methods;
use urpmkit_types::{
    DownloadReport, ErrorKind, InfoKind, InstallFilesReport, PERCENTAGE_INVALID, PackageId,
    StatusKind, TransactionReport,
};

use crate::decode;
use crate::dispatch::timeouts;
use crate::error::{BackendError, Result};
use crate::job::JobSink;
use crate::ops::Backend;
use crate::progress::ProgressTranslator;

/// Bare names of the parseable ids; unparseable targets are dropped.
fn target_names(targets: &[String]) -> Vec<String> {
    targets
        .iter()
        .filter_map(|t| PackageId::parse(t).ok().map(|id| id.name))
        .collect()
}

impl Backend {
    /// Install packages, streaming download/install progress to the job.
    pub async fn install_packages<J: JobSink + ?Sized>(
        &self,
        job: &J,
        simulate: bool,
        targets: &[String],
    ) {
        if let Err(e) = self.install_inner(job, simulate, targets).await {
            job.error_code(e.error_kind(), &e.to_string());
        }
        job.finished();
    }

    async fn install_inner<J: JobSink + ?Sized>(
        &self,
        job: &J,
        simulate: bool,
        targets: &[String],
    ) -> Result<()> {
        self.dispatch().ensure().await?;
        job.set_status(StatusKind::DependencyResolution);
        job.set_percentage(0);

        let names = target_names(targets);

        if simulate {
            self.dispatch()
                .call_text(
                    methods::PREVIEW_INSTALL,
                    Some(json!({ "names": names })),
                    timeouts::PREVIEW,
                )
                .await
                .map_err(|e| e.context("Preview failed"))?;
            // No record emission here; the frontend queries the preview set
            // through a separate resolve.
            job.set_percentage(100);
            return Ok(());
        }

        let mut translator = ProgressTranslator::new(job);
        let ack = self
            .dispatch()
            .call_ack_with_progress(
                methods::INSTALL_PACKAGES,
                Some(json!({ "names": names, "options": {} })),
                timeouts::TRANSACTION,
                &mut translator,
            )
            .await
            .map_err(|e| e.context("Install failed"))?;

        if ack.success {
            // The success message carries the installed set as JSON.
            if let Some(report) = decode::object::<TransactionReport>(&ack.message) {
                for record in report.packages {
                    job.package(InfoKind::Finished, &record.package_id().to_string(), "");
                }
            }
        } else {
            job.error_code(
                ErrorKind::InstallFailed,
                &format!("Install failed: {}", ack.message),
            );
        }
        job.set_percentage(100);
        Ok(())
    }

    /// Remove packages.
    pub async fn remove_packages<J: JobSink + ?Sized>(
        &self,
        job: &J,
        simulate: bool,
        targets: &[String],
    ) {
        if simulate {
            job.set_status(StatusKind::DependencyResolution);
            for target in targets {
                job.package(InfoKind::Removing, target, "");
            }
            job.set_percentage(100);
            job.finished();
            return;
        }

        if let Err(e) = self.remove_inner(job, targets).await {
            job.error_code(e.error_kind(), &e.to_string());
        }
        job.finished();
    }

    async fn remove_inner<J: JobSink + ?Sized>(&self, job: &J, targets: &[String]) -> Result<()> {
        self.dispatch().ensure().await?;
        job.set_status(StatusKind::Removing);
        job.set_percentage(PERCENTAGE_INVALID);

        let names = target_names(targets);
        let ack = self
            .dispatch()
            .call_ack(
                methods::REMOVE_PACKAGES,
                Some(json!({ "names": names, "options": {} })),
                timeouts::MAINTENANCE,
            )
            .await
            .map_err(|e| e.context("Remove failed"))?;

        if ack.success {
            for target in targets {
                job.package(InfoKind::Removing, target, "");
            }
        } else {
            job.error_code(
                ErrorKind::RemoveFailed,
                &format!("Remove failed: {}", ack.message),
            );
        }
        job.set_percentage(100);
        Ok(())
    }

    /// Update packages. The real mode runs a full-system upgrade; the
    /// target list selects records only in simulate mode.
    pub async fn update_packages<J: JobSink + ?Sized>(
        &self,
        job: &J,
        simulate: bool,
        targets: &[String],
    ) {
        if simulate {
            job.set_status(StatusKind::DependencyResolution);
            for target in targets {
                job.package(InfoKind::Updating, target, "");
            }
            job.set_percentage(100);
            job.finished();
            return;
        }

        if let Err(e) = self.update_inner(job).await {
            job.error_code(e.error_kind(), &e.to_string());
        }
        job.finished();
    }

    async fn update_inner<J: JobSink + ?Sized>(&self, job: &J) -> Result<()> {
        self.dispatch().ensure().await?;
        job.set_status(StatusKind::Updating);
        job.set_percentage(PERCENTAGE_INVALID);

        let ack = self
            .dispatch()
            .call_ack(
                methods::UPGRADE_PACKAGES,
                Some(json!({ "options": {} })),
                timeouts::FULL_UPGRADE,
            )
            .await
            .map_err(|e| e.context("Upgrade failed"))?;

        if !ack.success {
            job.error_code(
                ErrorKind::UpdateFailed,
                &format!("Upgrade failed: {}", ack.message),
            );
        }
        job.set_percentage(100);
        Ok(())
    }

    /// Refresh the service metadata cache.
    pub async fn refresh_cache<J: JobSink + ?Sized>(&self, job: &J) {
        if let Err(e) = self.refresh_inner(job).await {
            job.error_code(e.error_kind(), &e.to_string());
        }
        job.finished();
    }

    async fn refresh_inner<J: JobSink + ?Sized>(&self, job: &J) -> Result<()> {
        self.dispatch().ensure().await?;
        job.set_status(StatusKind::RefreshingCache);
        job.set_percentage(PERCENTAGE_INVALID);

        let ack = self
            .dispatch()
            .call_ack(methods::REFRESH_METADATA, None, timeouts::MAINTENANCE)
            .await
            .map_err(|e| e.context("Refresh failed"))?;

        if !ack.success {
            job.error_code(
                ErrorKind::InternalError,
                &format!("Refresh failed: {}", ack.message),
            );
        }
        job.set_percentage(100);
        Ok(())
    }

    /// Download package archives into `directory` without installing.
    pub async fn download_packages<J: JobSink + ?Sized>(
        &self,
        job: &J,
        targets: &[String],
        directory: &str,
    ) {
        if let Err(e) = self.download_inner(job, targets, directory).await {
            job.error_code(e.error_kind(), &e.to_string());
        }
        job.finished();
    }

    async fn download_inner<J: JobSink + ?Sized>(
        &self,
        job: &J,
        targets: &[String],
        directory: &str,
    ) -> Result<()> {
        self.dispatch().ensure().await?;
        job.set_status(StatusKind::Downloading);

        let names = target_names(targets);
        let text = self
            .dispatch()
            .call_text(
                methods::DOWNLOAD_PACKAGES,
                Some(json!({ "names": names, "directory": directory })),
                timeouts::TRANSACTION,
            )
            .await
            .map_err(|e| match e {
                BackendError::OperationFailed(msg) => BackendError::Verb {
                    kind: ErrorKind::DownloadFailed,
                    message: format!("Download failed: {msg}"),
                },
                other => other,
            })?;

        if let Some(report) = decode::object::<DownloadReport>(&text) {
            if report.success {
                // Returned paths line up with the requested ids by index.
                for (target, path) in targets.iter().zip(&report.paths) {
                    job.files(target, std::slice::from_ref(path));
                }
            } else {
                let message = report.error.unwrap_or_else(|| "Unknown error".to_string());
                job.error_code(
                    ErrorKind::DownloadFailed,
                    &format!("Download failed: {message}"),
                );
            }
        }
        Ok(())
    }

    /// Install local package files.
    ///
    /// Simulate mode only checks that every file exists; nothing is sent to
    /// the service.
    pub async fn install_files<J: JobSink + ?Sized>(
        &self,
        job: &J,
        simulate: bool,
        paths: &[String],
    ) {
        if let Err(e) = self.install_files_inner(job, simulate, paths).await {
            job.error_code(e.error_kind(), &e.to_string());
        }
        job.finished();
    }

    async fn install_files_inner<J: JobSink + ?Sized>(
        &self,
        job: &J,
        simulate: bool,
        paths: &[String],
    ) -> Result<()> {
        if simulate {
            for path in paths {
                if !Path::new(path).exists() {
                    return Err(BackendError::FileNotFound(path.clone()));
                }
            }
            return Ok(());
        }

        self.dispatch().ensure().await?;
        job.set_status(StatusKind::Installing);

        let text = self
            .dispatch()
            .call_text(
                methods::INSTALL_FILES,
                Some(json!({ "paths": paths })),
                timeouts::TRANSACTION,
            )
            .await
            .map_err(|e| match e {
                BackendError::OperationFailed(msg) => BackendError::Verb {
                    kind: ErrorKind::TransactionError,
                    message: format!("Install failed: {msg}"),
                },
                other => other,
            })?;

        if let Some(report) = decode::object::<InstallFilesReport>(&text)
            && !report.success
        {
            let message = report.error.unwrap_or_else(|| "Unknown error".to_string());
            job.error_code(
                ErrorKind::TransactionError,
                &format!("Install failed: {message}"),
            );
        }
        Ok(())
    }

    /// Ask the service to cancel the running operation. Best effort with a
    /// short deadline; the local job is finished regardless of the outcome.
    pub async fn cancel<J: JobSink + ?Sized>(&self, job: &J) {
        self.dispatch()
            .call_best_effort(methods::CANCEL_OPERATION, timeouts::CANCEL)
            .await;
        job.finished();
    }
}
