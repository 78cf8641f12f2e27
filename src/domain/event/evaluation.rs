use crate::domain::update::UpdateSet;
use crate::library::communication::publisher::Notification;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request to evaluate the pending updates of a host
///
/// Keyed by the host identifier so all requests of one host land on the same
/// partition and are evaluated in upload order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    /// Version of this structure, bumped on incompatible changes
    pub schema_version: u16,
    /// Host the evaluated updates belong to
    pub host_id: String,
    /// Identifier downstream consumers deduplicate redeliveries by
    ///
    /// Either the client supplied request id or an identifier derived from
    /// the position of the originating upload notification. Redeliveries of
    /// the same notification therefore carry the same identifier.
    pub correlation_id: String,
    /// Upload time carried over from the originating notification
    pub timestamp: DateTime<Utc>,
    /// Updates extracted from the uploaded archive, in report order
    pub updates: UpdateSet,
    /// Opaque metadata carried over from the originating notification
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Notification for EvaluationRequest {
    fn key(&self) -> Option<&str> {
        Some(&self.host_id)
    }
}
