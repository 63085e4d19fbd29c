//! Wire types for the platform REST API.
//!
//! Only the fields appfleet reads are modelled; everything else in the
//! platform's responses is ignored on decode.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The only build status that is not terminal.
pub const BUILD_PENDING: &str = "pending";

/// Config vars of an app, key → value.
pub type ConfigVars = BTreeMap<String, String>;

// ── Accounts ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountInfo {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Quota snapshot for one account over the current billing interval.
///
/// All figures are seconds of compute time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuotaReport {
    pub account_quota: i64,
    pub quota_used: i64,
    #[serde(default)]
    pub apps: Vec<AppQuota>,
}

/// One app's share of its account's quota.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppQuota {
    pub app_uuid: String,
    pub quota_used: i64,
}

// ── Apps ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NamedRef {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppInfo {
    pub id: String,
    pub name: String,
    pub stack: NamedRef,
    pub region: NamedRef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateAppRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl CreateAppRequest {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            region: None,
            stack: None,
        }
    }
}

// ── Builds ────────────────────────────────────────────────────────

/// Source tarball reference for a build. `checksum` and `version` are sent
/// as explicit nulls when unset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceBlob {
    pub url: String,
    pub checksum: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuildRequest {
    pub source_blob: SourceBlob,
}

impl BuildRequest {
    pub fn from_url(url: &str) -> Self {
        Self {
            source_blob: SourceBlob {
                url: url.to_string(),
                checksum: None,
                version: None,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuildInfo {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub output_stream_url: Option<String>,
}

impl BuildInfo {
    pub fn is_pending(&self) -> bool {
        self.status == BUILD_PENDING
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_request_sends_null_checksum_and_version() {
        let json = serde_json::to_value(BuildRequest::from_url("http://x/y.tgz")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "source_blob": { "url": "http://x/y.tgz", "checksum": null, "version": null }
            })
        );
    }

    #[test]
    fn decodes_app_with_nested_stack_and_region() {
        let app: AppInfo = serde_json::from_str(
            r#"{"id":"a1","name":"myapp","stack":{"id":"s","name":"heroku-22"},
                "region":{"id":"r","name":"eu"},"web_url":"https://myapp.example"}"#,
        )
        .unwrap();
        assert_eq!(app.stack.name, "heroku-22");
        assert_eq!(app.region.name, "eu");
    }

    #[test]
    fn quota_report_without_apps() {
        let quota: QuotaReport =
            serde_json::from_str(r#"{"account_quota":3600,"quota_used":4000}"#).unwrap();
        assert!(quota.apps.is_empty());
        assert_eq!(quota.account_quota - quota.quota_used, -400);
    }
}
