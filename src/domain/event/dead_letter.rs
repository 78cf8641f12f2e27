use crate::library::communication::publisher::Notification;
use crate::library::communication::record::{InboundRecord, SourcePosition};
use crate::library::communication::CauseChain;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stage of the pipeline at which a record failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStage {
    /// Decoding the upload notification envelope
    Decode,
    /// Retrieving and unpacking the referenced archive
    Resolve,
    /// Extracting package updates from the archive
    Extract,
    /// Publishing the evaluation request
    Publish,
}

impl ProcessingStage {
    /// Stable, lowercase name of the stage
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Decode => "decode",
            Self::Resolve => "resolve",
            Self::Extract => "extract",
            Self::Publish => "publish",
        }
    }
}

impl fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Record that could not be processed, parked for later inspection
///
/// Carries the untouched original payload so an operator can replay it once
/// the underlying issue is fixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadLetterRecord {
    /// Original payload, base64 encoded since it may not be valid UTF-8
    pub original_bytes: String,
    /// Stage at which processing failed
    pub stage: ProcessingStage,
    /// Captured error with its chain of causes
    pub error: CauseChain,
    /// Position the record was consumed from
    pub position: SourcePosition,
    /// Time at which the record was parked
    pub timestamp: DateTime<Utc>,
}

impl DeadLetterRecord {
    /// Parks the given record with the error that stopped it
    pub fn new(record: &InboundRecord, stage: ProcessingStage, error: CauseChain) -> Self {
        Self {
            original_bytes: base64::encode(record.payload()),
            stage,
            error,
            position: record.position().clone(),
            timestamp: Utc::now(),
        }
    }

    /// Decodes the original payload for replay
    pub fn original_payload(&self) -> Result<Vec<u8>, base64::DecodeError> {
        base64::decode(&self.original_bytes)
    }
}

impl Notification for DeadLetterRecord {}

#[cfg(test)]
mod does {
    use super::*;

    #[test]
    fn serialize_stages_in_snake_case() {
        assert_eq!(
            serde_json::to_value(ProcessingStage::Decode).unwrap(),
            serde_json::json!("decode")
        );
        assert_eq!(
            serde_json::to_value(ProcessingStage::Resolve).unwrap(),
            serde_json::json!("resolve")
        );
    }

    #[test]
    fn preserve_the_original_payload() {
        let payload = vec![0xC0, 0xFF, 0xEE];
        let record = InboundRecord::new(payload.clone(), SourcePosition::new("uploads", 0, 7));

        let dead_letter = DeadLetterRecord::new(
            &record,
            ProcessingStage::Decode,
            CauseChain::from_causes(vec!["boom".into()]),
        );

        assert_eq!(dead_letter.original_payload().unwrap(), payload);
    }
}
