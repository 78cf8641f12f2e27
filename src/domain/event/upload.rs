use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Notification that a host has uploaded a new report archive
///
/// Published by the upload frontend whenever an archive lands in the object
/// store. The `archive_url` alias accepts payloads from frontends that still
/// use the old field name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadNotification {
    /// Host the archive originates from
    pub host_id: String,
    /// Reference of the archive within the object store
    #[serde(alias = "archive_url")]
    pub archive_ref: String,
    /// Time at which the archive was uploaded
    pub timestamp: DateTime<Utc>,
    /// Client supplied identifier to correlate the evaluation result with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Opaque metadata to pass through to the evaluation request
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}
