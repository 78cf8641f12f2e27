//! Decoding of upload notifications and encoding of evaluation requests

use crate::constants::EVALUATION_SCHEMA_VERSION;
use crate::domain::event::{EvaluationRequest, UploadNotification};
use crate::domain::update::UpdateSet;
use crate::library::communication::record::SourcePosition;
use thiserror::Error;

/// Error describing an upload notification that can not be processed
#[derive(Debug, Error)]
pub enum MalformedEnvelopeError {
    /// The payload is not valid JSON or misses structural elements
    #[error("payload is not a valid upload notification")]
    Syntax(#[from] serde_json::Error),
    /// A required field is missing or empty
    #[error("required field `{0}` is missing or empty")]
    MissingField(&'static str),
}

/// Decodes the raw payload of an inbound record into an upload notification
pub fn decode(payload: &[u8]) -> Result<UploadNotification, MalformedEnvelopeError> {
    let notification: UploadNotification = serde_json::from_slice(payload)?;

    if notification.host_id.is_empty() {
        return Err(MalformedEnvelopeError::MissingField("host_id"));
    }

    if notification.archive_ref.is_empty() {
        return Err(MalformedEnvelopeError::MissingField("archive_ref"));
    }

    Ok(notification)
}

/// Builds the evaluation request for a processed upload notification
///
/// The correlation identifier is taken from the notification when the client
/// supplied one. Otherwise it is derived from the position of the record on
/// the stream, which yields the same identifier for redeliveries.
pub fn encode(
    notification: UploadNotification,
    updates: UpdateSet,
    position: &SourcePosition,
) -> EvaluationRequest {
    let correlation_id = notification
        .request_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| position.correlation_id());

    EvaluationRequest {
        schema_version: EVALUATION_SCHEMA_VERSION,
        host_id: notification.host_id,
        correlation_id,
        timestamp: notification.timestamp,
        updates,
        metadata: notification.metadata,
    }
}
