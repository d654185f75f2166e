//! Shared types for urpmkit components.
//!
//! This crate provides the package identity codec, the JSON record schemas
//! returned by the urpmd service, and the enumerations of the frontend ABI
//! (info kinds, statuses, error codes). All types are serializable for RPC
//! transport.

use serde::{Deserialize, Serialize};

/// Origin tag appended to every package id emitted by this backend.
///
/// Distinguishes urpmd-provided packages from other backends in a
/// mixed-source frontend.
pub const ORIGIN: &str = "urpm";

/// Field separator of the canonical package-id string.
pub const ID_SEPARATOR: char = ';';

/// Sentinel percentage meaning "unknown progress".
pub const PERCENTAGE_INVALID: u32 = 101;

/// Errors from the identity codec.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// Package-id string does not have exactly four `;`-separated fields.
    #[error("malformed package id: {0}")]
    MalformedIdentity(String),

    /// NEVRA string has too few dash/dot-delimited segments.
    #[error("malformed nevra: {0}")]
    MalformedNevra(String),
}

/// Canonical package identity.
///
/// String form is `name;version-release;arch;origin`. The version and
/// release are stored pre-joined as the EVR compound field, mirroring the
/// wire format: the id string never distinguishes them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageId {
    pub name: String,
    pub evr: String,
    pub arch: String,
    pub origin: String,
}

impl PackageId {
    /// Build an identity from separate version/release fields.
    ///
    /// Fields must not contain `;`; the codec does not escape.
    #[must_use]
    pub fn build(name: &str, version: &str, release: &str, arch: &str) -> Self {
        Self {
            name: name.to_string(),
            evr: format!("{version}-{release}"),
            arch: arch.to_string(),
            origin: ORIGIN.to_string(),
        }
    }

    /// Split a canonical id string back into its fields.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::MalformedIdentity`] unless the string has
    /// exactly four `;`-separated fields.
    pub fn parse(id: &str) -> Result<Self, IdentityError> {
        let parts: Vec<&str> = id.split(ID_SEPARATOR).collect();
        let [name, evr, arch, origin] = parts.as_slice() else {
            return Err(IdentityError::MalformedIdentity(id.to_string()));
        };
        Ok(Self {
            name: (*name).to_string(),
            evr: (*evr).to_string(),
            arch: (*arch).to_string(),
            origin: (*origin).to_string(),
        })
    }

    /// Version component of the EVR (text before the last dash).
    #[must_use]
    pub fn version(&self) -> &str {
        self.evr.rsplit_once('-').map_or(self.evr.as_str(), |(v, _)| v)
    }

    /// Release component of the EVR (text after the last dash).
    #[must_use]
    pub fn release(&self) -> &str {
        self.evr.rsplit_once('-').map_or("", |(_, r)| r)
    }

    /// NEVRA string form: `name-version-release.arch`.
    #[must_use]
    pub fn nevra(&self) -> String {
        format!("{}-{}.{}", self.name, self.evr, self.arch)
    }
}

impl std::fmt::Display for PackageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{};{};{};{}", self.name, self.evr, self.arch, self.origin)
    }
}

/// Structured fields of a NEVRA string (epoch omitted).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nevra {
    pub name: String,
    pub version: String,
    pub release: String,
    pub arch: String,
}

impl Nevra {
    /// Parse `name-version-release.arch`, greedy right-to-left.
    ///
    /// The rightmost `.` delimits the arch, then the two rightmost `-`
    /// delimit release and version; whatever remains is the name. A dash
    /// inside the name can therefore misattribute the split when the string
    /// carries extra segments; that ambiguity is inherent to the format and
    /// is not special-cased.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::MalformedNevra`] if the arch dot or either
    /// dash is missing.
    pub fn parse(s: &str) -> Result<Self, IdentityError> {
        let malformed = || IdentityError::MalformedNevra(s.to_string());
        let (rest, arch) = s.rsplit_once('.').ok_or_else(malformed)?;
        let (rest, release) = rest.rsplit_once('-').ok_or_else(malformed)?;
        let (name, version) = rest.rsplit_once('-').ok_or_else(malformed)?;
        Ok(Self {
            name: name.to_string(),
            version: version.to_string(),
            release: release.to_string(),
            arch: arch.to_string(),
        })
    }

    /// Version-release compound field.
    #[must_use]
    pub fn evr(&self) -> String {
        format!("{}-{}", self.version, self.release)
    }
}

/// One package object as returned by the urpmd query methods.
///
/// Every field is optional on the wire; absent fields decode to their
/// defaults so a sparse record never fails the whole batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub release: String,
    #[serde(default)]
    pub arch: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub installed: bool,
    /// Present in `ResolvePackages` responses; `Some(false)` marks a name
    /// the service could not resolve.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub found: Option<bool>,
}

impl PackageRecord {
    /// Canonical identity for this record.
    #[must_use]
    pub fn package_id(&self) -> PackageId {
        PackageId::build(&self.name, &self.version, &self.release, &self.arch)
    }
}

/// Detail fields from `GetPackageInfo`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetailRecord {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub license: String,
    #[serde(default)]
    pub size: u64,
}

/// One upgrade entry from `GetUpdates`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub nevra: String,
    #[serde(default)]
    pub arch: String,
}

/// Envelope of `GetUpdates`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatesReport {
    #[serde(default)]
    pub upgrades: Vec<UpdateRecord>,
}

/// Envelope of `PreviewInstall`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreviewReport {
    #[serde(default)]
    pub to_install: Vec<PackageRecord>,
}

/// Transaction summary carried in the success message of `InstallPackages`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionReport {
    #[serde(default)]
    pub packages: Vec<PackageRecord>,
}

/// Result object of `DownloadPackages`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DownloadReport {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub paths: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result object of `InstallFiles`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstallFilesReport {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One file hit from `SearchFiles`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileHit {
    #[serde(default)]
    pub pkg_nevra: String,
    #[serde(default)]
    pub path: String,
}

/// `(success, message)` result of the mutating methods.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

/// Phases reported by the `OperationProgress` signal.
///
/// The set is open: phases this bridge does not know about decode to
/// [`Phase::Unknown`] and are ignored by the translator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Resolving,
    Downloading,
    Installing,
    #[serde(other)]
    Unknown,
}

/// Parameters of one `OperationProgress` notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressSignal {
    #[serde(default)]
    pub op_id: String,
    pub phase: Phase,
    #[serde(default)]
    pub package: String,
    #[serde(default)]
    pub current: u32,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub message: String,
}

impl ProgressSignal {
    /// `floor(current * 100 / total)`, or 0 when the total is unknown.
    ///
    /// Counters may be byte totals, so the product is computed in u64.
    #[must_use]
    pub fn percentage(&self) -> u32 {
        if self.total > 0 {
            // Quotient is at most 100 when current <= total, and still
            // fits u32 otherwise.
            u32::try_from(u64::from(self.current) * 100 / u64::from(self.total))
                .unwrap_or(u32::MAX)
        } else {
            0
        }
    }
}

/// Info kind attached to each emitted package record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InfoKind {
    Installed,
    Available,
    Normal,
    Removing,
    Updating,
    Finished,
}

impl std::fmt::Display for InfoKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            InfoKind::Installed => "installed",
            InfoKind::Available => "available",
            InfoKind::Normal => "normal",
            InfoKind::Removing => "removing",
            InfoKind::Updating => "updating",
            InfoKind::Finished => "finished",
        };
        f.write_str(s)
    }
}

/// Job status reported to the frontend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusKind {
    Query,
    DependencyResolution,
    Downloading,
    Installing,
    Removing,
    Updating,
    RefreshingCache,
}

impl std::fmt::Display for StatusKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StatusKind::Query => "query",
            StatusKind::DependencyResolution => "dependency-resolution",
            StatusKind::Downloading => "downloading",
            StatusKind::Installing => "installing",
            StatusKind::Removing => "removing",
            StatusKind::Updating => "updating",
            StatusKind::RefreshingCache => "refreshing-cache",
        };
        f.write_str(s)
    }
}

/// Typed error codes surfaced to the frontend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// No connection to the urpmd service could be established.
    ServiceUnavailable,
    /// The RPC call itself failed (transport error or timeout).
    InternalError,
    InstallFailed,
    RemoveFailed,
    UpdateFailed,
    DownloadFailed,
    TransactionError,
    FileNotFound,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::ServiceUnavailable => "service-unavailable",
            ErrorKind::InternalError => "internal-error",
            ErrorKind::InstallFailed => "install-failed",
            ErrorKind::RemoveFailed => "remove-failed",
            ErrorKind::UpdateFailed => "update-failed",
            ErrorKind::DownloadFailed => "download-failed",
            ErrorKind::TransactionError => "transaction-error",
            ErrorKind::FileNotFound => "file-not-found",
        };
        f.write_str(s)
    }
}

/// Installed-state filters requested by the frontend.
///
/// Requesting both filters at once is legal and matches nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterSet {
    pub installed: bool,
    pub not_installed: bool,
}

impl FilterSet {
    #[must_use]
    pub fn installed_only() -> Self {
        Self {
            installed: true,
            not_installed: false,
        }
    }

    #[must_use]
    pub fn not_installed_only() -> Self {
        Self {
            installed: false,
            not_installed: true,
        }
    }

    /// Whether a record with the given installed state passes the filters.
    #[must_use]
    pub fn allows(&self, installed: bool) -> bool {
        if self.installed && !installed {
            return false;
        }
        if self.not_installed && installed {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_id_build_and_display() {
        let id = PackageId::build("bash", "5.2", "1", "x86_64");
        assert_eq!(id.to_string(), "bash;5.2-1;x86_64;urpm");
    }

    #[test]
    fn test_package_id_roundtrip() {
        let id = PackageId::build("vim-minimal", "9.0", "2.mga9", "aarch64");
        let parsed = PackageId::parse(&id.to_string()).unwrap();
        assert_eq!(parsed.name, "vim-minimal");
        assert_eq!(parsed.version(), "9.0");
        assert_eq!(parsed.release(), "2.mga9");
        assert_eq!(parsed.arch, "aarch64");
        assert_eq!(parsed.origin, ORIGIN);
    }

    #[test]
    fn test_package_id_parse_rejects_wrong_arity() {
        assert!(matches!(
            PackageId::parse("bash;5.2-1;x86_64"),
            Err(IdentityError::MalformedIdentity(_))
        ));
        assert!(matches!(
            PackageId::parse("a;b;c;d;e"),
            Err(IdentityError::MalformedIdentity(_))
        ));
        assert!(matches!(
            PackageId::parse(""),
            Err(IdentityError::MalformedIdentity(_))
        ));
    }

    #[test]
    fn test_package_id_empty_evr_is_representable() {
        let parsed = PackageId::parse("ghost;-;noarch;urpm").unwrap();
        assert_eq!(parsed.version(), "");
        assert_eq!(parsed.release(), "");
    }

    #[test]
    fn test_nevra_basic() {
        let n = Nevra::parse("foo-1.2-3.x86_64").unwrap();
        assert_eq!(n.name, "foo");
        assert_eq!(n.version, "1.2");
        assert_eq!(n.release, "3");
        assert_eq!(n.arch, "x86_64");
        assert_eq!(n.evr(), "1.2-3");
    }

    #[test]
    fn test_nevra_dashed_name() {
        let n = Nevra::parse("perl-File-Temp-0.231-1.noarch").unwrap();
        assert_eq!(n.name, "perl-File-Temp");
        assert_eq!(n.version, "0.231");
        assert_eq!(n.release, "1");
        assert_eq!(n.arch, "noarch");
    }

    // Known limitation of the format: with a dashed version and no release
    // segment the rightmost-split rule attributes part of the version to
    // the name. Documented, not corrected.
    #[test]
    fn test_nevra_ambiguity_is_greedy_right_to_left() {
        let n = Nevra::parse("a-b-c.x86_64").unwrap();
        assert_eq!(n.name, "a");
        assert_eq!(n.version, "b");
        assert_eq!(n.release, "c");
    }

    #[test]
    fn test_nevra_rejects_short_strings() {
        assert!(Nevra::parse("foo.x86_64").is_err());
        assert!(Nevra::parse("foo-1.2").is_err());
        assert!(Nevra::parse("").is_err());
    }

    #[test]
    fn test_package_id_nevra_roundtrip() {
        let id = PackageId::build("bash", "5.2", "1", "x86_64");
        assert_eq!(id.nevra(), "bash-5.2-1.x86_64");
        let n = Nevra::parse(&id.nevra()).unwrap();
        assert_eq!(n.name, "bash");
        assert_eq!(n.evr(), "5.2-1");
        assert_eq!(n.arch, "x86_64");
    }

    #[test]
    fn test_package_record_defaults() {
        let rec: PackageRecord = serde_json::from_str("{}").unwrap();
        assert_eq!(rec.name, "");
        assert_eq!(rec.version, "");
        assert!(!rec.installed);
        assert!(rec.found.is_none());
    }

    #[test]
    fn test_package_record_full() {
        let rec: PackageRecord = serde_json::from_str(
            r#"{"name":"bash","version":"5.2","release":"1","arch":"x86_64",
                "summary":"The shell","installed":true,"found":true}"#,
        )
        .unwrap();
        assert!(rec.installed);
        assert_eq!(rec.found, Some(true));
        assert_eq!(rec.package_id().to_string(), "bash;5.2-1;x86_64;urpm");
    }

    #[test]
    fn test_detail_record_defaults() {
        let det: DetailRecord = serde_json::from_str(r#"{"license":"GPLv3"}"#).unwrap();
        assert_eq!(det.license, "GPLv3");
        assert_eq!(det.description, "");
        assert_eq!(det.size, 0);
    }

    #[test]
    fn test_phase_open_set() {
        let p: Phase = serde_json::from_str("\"downloading\"").unwrap();
        assert_eq!(p, Phase::Downloading);
        let p: Phase = serde_json::from_str("\"verifying\"").unwrap();
        assert_eq!(p, Phase::Unknown);
    }

    #[test]
    fn test_progress_percentage() {
        let mut sig = ProgressSignal {
            op_id: String::new(),
            phase: Phase::Downloading,
            package: String::new(),
            current: 50,
            total: 100,
            message: String::new(),
        };
        assert_eq!(sig.percentage(), 50);
        sig.current = 1;
        sig.total = 3;
        assert_eq!(sig.percentage(), 33);
        sig.total = 0;
        assert_eq!(sig.percentage(), 0);
    }

    // Byte-granularity counters must not overflow the intermediate product.
    #[test]
    fn test_progress_percentage_byte_counters() {
        let sig = ProgressSignal {
            op_id: String::new(),
            phase: Phase::Downloading,
            package: String::new(),
            current: 60_000_000,
            total: 100_000_000,
            message: String::new(),
        };
        assert_eq!(sig.percentage(), 60);

        let sig = ProgressSignal {
            current: u32::MAX,
            total: u32::MAX,
            ..sig
        };
        assert_eq!(sig.percentage(), 100);
    }

    #[test]
    fn test_filter_set() {
        let none = FilterSet::default();
        assert!(none.allows(true));
        assert!(none.allows(false));

        let installed = FilterSet::installed_only();
        assert!(installed.allows(true));
        assert!(!installed.allows(false));

        let not_installed = FilterSet::not_installed_only();
        assert!(!not_installed.allows(true));
        assert!(not_installed.allows(false));

        let both = FilterSet {
            installed: true,
            not_installed: true,
        };
        assert!(!both.allows(true));
        assert!(!both.allows(false));
    }

    #[test]
    fn test_display_strings() {
        assert_eq!(StatusKind::DependencyResolution.to_string(), "dependency-resolution");
        assert_eq!(InfoKind::Removing.to_string(), "removing");
        assert_eq!(ErrorKind::InstallFailed.to_string(), "install-failed");
    }
}
