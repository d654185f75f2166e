//! Query verbs: search, resolve, updates, details, files, dependencies.

use std::collections::HashSet;

use serde_json::json;

use urpmkit_rpc::methods;
use urpmkit_types::{
    DetailRecord, FileHit, FilterSet, InfoKind, Nevra, ORIGIN, PackageId, PackageRecord,
    StatusKind, UpdatesReport,
};

use crate::decode;
use crate::dispatch::timeouts;
use crate::error::Result;
use crate::job::JobSink;
use crate::ops::{Backend, target_name};

/// Decode a package array and emit each record.
///
/// Records returned by availability queries carry an `installed` flag; a
/// record marked installed upgrades the base "available" info kind.
fn emit_packages<J: JobSink + ?Sized>(job: &J, text: &str, base: InfoKind) {
    for record in decode::records::<PackageRecord>(text) {
        let info = if base == InfoKind::Available && record.installed {
            InfoKind::Installed
        } else {
            base
        };
        job.package(info, &record.package_id().to_string(), &record.summary);
    }
}

impl Backend {
    /// Search packages by name or provided capability.
    pub async fn search<J: JobSink + ?Sized>(
        &self,
        job: &J,
        filters: FilterSet,
        values: &[String],
        search_provides: bool,
    ) {
        if let Err(e) = self.search_inner(job, filters, values, search_provides).await {
            job.error_code(e.error_kind(), &e.to_string());
        }
        job.finished();
    }

    async fn search_inner<J: JobSink + ?Sized>(
        &self,
        job: &J,
        filters: FilterSet,
        values: &[String],
        search_provides: bool,
    ) -> Result<()> {
        self.dispatch().ensure().await?;
        job.set_status(StatusKind::Query);

        let pattern = values.join(" ");
        let text = self
            .dispatch()
            .call_text(
                methods::SEARCH_PACKAGES,
                Some(json!({ "pattern": pattern, "search_provides": search_provides })),
                timeouts::DEFAULT,
            )
            .await
            .map_err(|e| e.context("Search failed"))?;

        let base = if filters.installed {
            InfoKind::Installed
        } else {
            InfoKind::Available
        };
        emit_packages(job, &text, base);
        Ok(())
    }

    /// Search package descriptions. Same service query as name search.
    pub async fn search_details<J: JobSink + ?Sized>(
        &self,
        job: &J,
        filters: FilterSet,
        values: &[String],
    ) {
        self.search(job, filters, values, false).await;
    }

    /// Find packages providing a capability.
    pub async fn what_provides<J: JobSink + ?Sized>(
        &self,
        job: &J,
        filters: FilterSet,
        values: &[String],
    ) {
        self.search(job, filters, values, true).await;
    }

    /// rpm groups do not map onto the frontend's group set; always empty.
    pub async fn search_groups<J: JobSink + ?Sized>(&self, job: &J) {
        job.finished();
    }

    /// List available upgrades.
    pub async fn get_updates<J: JobSink + ?Sized>(&self, job: &J) {
        if let Err(e) = self.get_updates_inner(job).await {
            job.error_code(e.error_kind(), &e.to_string());
        }
        job.finished();
    }

    async fn get_updates_inner<J: JobSink + ?Sized>(&self, job: &J) -> Result<()> {
        self.dispatch().ensure().await?;
        job.set_status(StatusKind::Query);

        let text = self
            .dispatch()
            .call_text(methods::GET_UPDATES, None, timeouts::DEFAULT)
            .await
            .map_err(|e| e.context("GetUpdates failed"))?;

        let report: UpdatesReport = decode::object(&text).unwrap_or_default();
        for upgrade in report.upgrades {
            let evr = Nevra::parse(&upgrade.nevra).map_or_else(|_| "0".to_string(), |n| n.evr());
            let id = PackageId {
                name: upgrade.name,
                evr,
                arch: upgrade.arch,
                origin: ORIGIN.to_string(),
            };
            job.package(InfoKind::Normal, &id.to_string(), "");
        }
        Ok(())
    }

    /// Resolve names (or ids) to full package records, batched in one call.
    pub async fn resolve<J: JobSink + ?Sized>(
        &self,
        job: &J,
        filters: FilterSet,
        targets: &[String],
    ) {
        if let Err(e) = self.resolve_inner(job, filters, targets).await {
            job.error_code(e.error_kind(), &e.to_string());
        }
        job.finished();
    }

    async fn resolve_inner<J: JobSink + ?Sized>(
        &self,
        job: &J,
        filters: FilterSet,
        targets: &[String],
    ) -> Result<()> {
        self.dispatch().ensure().await?;
        job.set_status(StatusKind::Query);

        let names: Vec<String> = targets.iter().map(|t| target_name(t)).collect();
        let text = match self
            .dispatch()
            .call_text(
                methods::RESOLVE_PACKAGES,
                Some(json!({ "names": names })),
                timeouts::MAINTENANCE,
            )
            .await
        {
            Ok(text) => text,
            Err(e) => {
                // Callers routinely probe with names that may not exist;
                // a failed resolve finishes quietly.
                tracing::warn!("ResolvePackages failed: {e}");
                return Ok(());
            }
        };

        for record in decode::records::<PackageRecord>(&text) {
            if record.found == Some(false) {
                continue;
            }
            if !filters.allows(record.installed) {
                continue;
            }
            if record.version.is_empty() || record.arch.is_empty() {
                continue;
            }
            let info = if record.installed {
                InfoKind::Installed
            } else {
                InfoKind::Available
            };
            job.package(info, &record.package_id().to_string(), &record.summary);
        }
        Ok(())
    }

    /// Fetch description/url/license/size for each target.
    pub async fn get_details<J: JobSink + ?Sized>(&self, job: &J, targets: &[String]) {
        if let Err(e) = self.get_details_inner(job, targets).await {
            job.error_code(e.error_kind(), &e.to_string());
        }
        job.finished();
    }

    async fn get_details_inner<J: JobSink + ?Sized>(
        &self,
        job: &J,
        targets: &[String],
    ) -> Result<()> {
        self.dispatch().ensure().await?;
        job.set_status(StatusKind::Query);

        for target in targets {
            let Ok(id) = PackageId::parse(target) else {
                continue;
            };

            let text = match self
                .dispatch()
                .call_text(
                    methods::GET_PACKAGE_INFO,
                    Some(json!({ "name": id.name })),
                    timeouts::DEFAULT,
                )
                .await
            {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!("GetPackageInfo failed: {e}");
                    continue;
                }
            };

            if let Some(detail) = decode::object::<DetailRecord>(&text) {
                job.details(target, &detail);
            }
        }
        Ok(())
    }

    /// List the files owned by each target package.
    pub async fn get_files<J: JobSink + ?Sized>(&self, job: &J, targets: &[String]) {
        if let Err(e) = self.get_files_inner(job, targets).await {
            job.error_code(e.error_kind(), &e.to_string());
        }
        job.finished();
    }

    async fn get_files_inner<J: JobSink + ?Sized>(
        &self,
        job: &J,
        targets: &[String],
    ) -> Result<()> {
        self.dispatch().ensure().await?;
        job.set_status(StatusKind::Query);

        for target in targets {
            let Ok(id) = PackageId::parse(target) else {
                continue;
            };

            let text = match self
                .dispatch()
                .call_text(
                    methods::GET_PACKAGE_FILES,
                    Some(json!({ "nevra": id.nevra() })),
                    timeouts::FILE_QUERY,
                )
                .await
            {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!("GetPackageFiles failed: {e}");
                    continue;
                }
            };

            if let Some(paths) = decode::records_opt::<String>(&text) {
                job.files(target, &paths);
            }
        }
        Ok(())
    }

    /// List the packages each target pulls in.
    ///
    /// One level of expansion only: the service preview already includes
    /// the transitive set it would install. A `recursive` request does not
    /// walk further.
    pub async fn depends_on<J: JobSink + ?Sized>(
        &self,
        job: &J,
        targets: &[String],
        recursive: bool,
    ) {
        if recursive {
            tracing::debug!("recursive dependency walk requested; one level is expanded");
        }
        if let Err(e) = self.depends_on_inner(job, targets).await {
            job.error_code(e.error_kind(), &e.to_string());
        }
        job.finished();
    }

    async fn depends_on_inner<J: JobSink + ?Sized>(
        &self,
        job: &J,
        targets: &[String],
    ) -> Result<()> {
        self.dispatch().ensure().await?;
        job.set_status(StatusKind::Query);

        for target in targets {
            let name = target_name(target);

            let text = match self
                .dispatch()
                .call_text(
                    methods::PREVIEW_INSTALL,
                    Some(json!({ "names": [name] })),
                    timeouts::PREVIEW,
                )
                .await
            {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!("PreviewInstall failed: {e}");
                    continue;
                }
            };

            let report: urpmkit_types::PreviewReport = decode::object(&text).unwrap_or_default();
            for record in report.to_install {
                // The preview includes the target itself.
                if record.name == name {
                    continue;
                }
                job.package(
                    InfoKind::Available,
                    &record.package_id().to_string(),
                    &record.summary,
                );
            }
        }
        Ok(())
    }

    /// List the packages that require each target.
    ///
    /// Accepts a `recursive` flag but expands one level only, like
    /// [`Backend::depends_on`].
    pub async fn required_by<J: JobSink + ?Sized>(
        &self,
        job: &J,
        targets: &[String],
        recursive: bool,
    ) {
        if recursive {
            tracing::debug!("recursive reverse-dependency walk requested; one level is expanded");
        }
        if let Err(e) = self.required_by_inner(job, targets).await {
            job.error_code(e.error_kind(), &e.to_string());
        }
        job.finished();
    }

    async fn required_by_inner<J: JobSink + ?Sized>(
        &self,
        job: &J,
        targets: &[String],
    ) -> Result<()> {
        self.dispatch().ensure().await?;
        job.set_status(StatusKind::Query);

        for target in targets {
            let name = target_name(target);

            let text = match self
                .dispatch()
                .call_text(
                    methods::WHAT_REQUIRES,
                    Some(json!({ "name": name })),
                    timeouts::FILE_QUERY,
                )
                .await
            {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!("WhatRequires failed: {e}");
                    continue;
                }
            };

            for record in decode::records::<PackageRecord>(&text) {
                if record.name.is_empty() {
                    continue;
                }
                job.package(
                    InfoKind::Available,
                    &record.package_id().to_string(),
                    &record.summary,
                );
            }
        }
        Ok(())
    }

    /// Enumerate packages. Only the installed set is supported; listing
    /// every available package would be enormous, so other filter requests
    /// finish with no records.
    pub async fn get_packages<J: JobSink + ?Sized>(&self, job: &J, filters: FilterSet) {
        if filters.installed {
            if let Err(e) = self.get_packages_inner(job).await {
                job.error_code(e.error_kind(), &e.to_string());
            }
        }
        job.finished();
    }

    async fn get_packages_inner<J: JobSink + ?Sized>(&self, job: &J) -> Result<()> {
        self.dispatch().ensure().await?;
        job.set_status(StatusKind::Query);

        let text = match self
            .dispatch()
            .call_text(
                methods::GET_INSTALLED_PACKAGES,
                None,
                timeouts::INSTALLED_LIST,
            )
            .await
        {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("GetInstalledPackages failed: {e}");
                return Ok(());
            }
        };

        for record in decode::records::<PackageRecord>(&text) {
            if record.name.is_empty() || record.version.is_empty() {
                continue;
            }
            job.package(
                InfoKind::Installed,
                &record.package_id().to_string(),
                &record.summary,
            );
        }
        Ok(())
    }

    /// Emit a minimal static update-detail record per target. The service
    /// carries no changelog data.
    pub async fn get_update_detail<J: JobSink + ?Sized>(&self, job: &J, targets: &[String]) {
        job.set_status(StatusKind::Query);
        for target in targets {
            job.update_detail(target, "Update available");
        }
        job.finished();
    }

    /// Find packages owning files that match each pattern.
    pub async fn search_files<J: JobSink + ?Sized>(&self, job: &J, values: &[String]) {
        if let Err(e) = self.search_files_inner(job, values).await {
            job.error_code(e.error_kind(), &e.to_string());
        }
        job.finished();
    }

    async fn search_files_inner<J: JobSink + ?Sized>(
        &self,
        job: &J,
        values: &[String],
    ) -> Result<()> {
        self.dispatch().ensure().await?;
        job.set_status(StatusKind::Query);

        // Multiple file hits often belong to one package; each package is
        // emitted once per invocation.
        let mut seen: HashSet<String> = HashSet::new();

        for value in values {
            let text = match self
                .dispatch()
                .call_text(
                    methods::SEARCH_FILES,
                    Some(json!({ "pattern": value })),
                    timeouts::FILE_QUERY,
                )
                .await
            {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!("SearchFiles failed: {e}");
                    continue;
                }
            };

            for hit in decode::records::<FileHit>(&text) {
                if !seen.insert(hit.pkg_nevra.clone()) {
                    continue;
                }
                let Ok(nevra) = Nevra::parse(&hit.pkg_nevra) else {
                    continue;
                };
                let evr = nevra.evr();
                let id = PackageId {
                    name: nevra.name,
                    evr,
                    arch: nevra.arch,
                    origin: ORIGIN.to_string(),
                };
                job.package(InfoKind::Available, &id.to_string(), "");
            }
        }
        Ok(())
    }
}
