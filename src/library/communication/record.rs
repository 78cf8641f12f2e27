//! Records and their position on a stream

use serde::{Deserialize, Serialize};

/// Name of a partitioned record stream
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopicDescriptor {
    name: String,
}

impl TopicDescriptor {
    /// Creates a new descriptor for the given stream name
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self { name: name.into() }
    }

    /// Name of the described stream
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Location of a record within a partitioned stream
///
/// The triple of topic, partition, and offset uniquely identifies a record
/// for the lifetime of the stream and is stable across redeliveries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePosition {
    topic: String,
    partition: i32,
    offset: i64,
}

impl SourcePosition {
    /// Creates a new position from its raw coordinates
    pub fn new<S: Into<String>>(topic: S, partition: i32, offset: i64) -> Self {
        Self {
            topic: topic.into(),
            partition,
            offset,
        }
    }

    /// Stream the record was consumed from
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Partition within the stream
    pub fn partition(&self) -> i32 {
        self.partition
    }

    /// Offset within the partition
    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Deterministic identifier derived from partition and offset
    ///
    /// Redelivered records map to the same identifier, allowing downstream
    /// consumers to deduplicate.
    pub fn correlation_id(&self) -> String {
        format!("{}-{}", self.partition, self.offset)
    }
}

/// Raw record consumed from a stream, paired with its position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundRecord {
    payload: Vec<u8>,
    position: SourcePosition,
}

impl InboundRecord {
    /// Creates a new record from its payload and position
    pub fn new(payload: Vec<u8>, position: SourcePosition) -> Self {
        Self { payload, position }
    }

    /// Opaque payload bytes
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Position the record was consumed from
    pub fn position(&self) -> &SourcePosition {
        &self.position
    }
}
