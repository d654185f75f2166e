//! Tolerant decoding of service response documents.
//!
//! The urpmd query methods return JSON documents as strings. Decoding is
//! deliberately permissive: a malformed or wrong-shaped document yields an
//! empty result rather than failing the operation, and individual records
//! that do not decode are skipped. This keeps batch queries resilient to
//! service/version skew and single bad records.

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Decode a top-level JSON array into records.
///
/// `None` unless the document parses and its root is an array. Elements
/// that do not decode to `T` are dropped.
pub fn records_opt<T: DeserializeOwned>(text: &str) -> Option<Vec<T>> {
    let Ok(Value::Array(items)) = serde_json::from_str::<Value>(text) else {
        tracing::warn!("ignoring non-array response document");
        return None;
    };
    Some(
        items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
    )
}

/// Like [`records_opt`] but a bad document yields an empty sequence.
pub fn records<T: DeserializeOwned>(text: &str) -> Vec<T> {
    records_opt(text).unwrap_or_default()
}

/// Decode a top-level JSON object into `T`.
///
/// `None` when the document is malformed or not shaped as `T` expects;
/// absent fields inside a valid document take their defaults.
pub fn object<T: DeserializeOwned>(text: &str) -> Option<T> {
    match serde_json::from_str(text) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("ignoring unparseable response document: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use urpmkit_types::{DownloadReport, PackageRecord, UpdatesReport};

    #[test]
    fn test_records_from_array() {
        let recs: Vec<PackageRecord> = records(
            r#"[{"name":"bash","version":"5.2","release":"1","arch":"x86_64","installed":true}]"#,
        );
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].name, "bash");
        assert!(recs[0].installed);
    }

    #[test]
    fn test_records_invalid_json_yields_empty() {
        let recs: Vec<PackageRecord> = records("not valid json");
        assert!(recs.is_empty());
    }

    #[test]
    fn test_records_wrong_shape_yields_empty() {
        let recs: Vec<PackageRecord> = records(r#"{"name":"bash"}"#);
        assert!(recs.is_empty());
    }

    #[test]
    fn test_records_skip_bad_elements() {
        let recs: Vec<PackageRecord> = records(r#"[{"name":"bash"}, 42, "noise", {}]"#);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].name, "bash");
        assert_eq!(recs[1].name, "");
    }

    #[test]
    fn test_string_records() {
        let paths: Vec<String> = records(r#"["/bin/bash", 7, "/etc/bashrc"]"#);
        assert_eq!(paths, vec!["/bin/bash", "/etc/bashrc"]);
    }

    #[test]
    fn test_object_with_defaults() {
        let report: UpdatesReport = object(r#"{"upgrades":[{"name":"bash"}]}"#).unwrap();
        assert_eq!(report.upgrades.len(), 1);
        assert_eq!(report.upgrades[0].nevra, "");
    }

    #[test]
    fn test_object_malformed_is_none() {
        assert!(object::<DownloadReport>("garbage").is_none());
        assert!(object::<DownloadReport>("[1,2]").is_none());
    }
}
