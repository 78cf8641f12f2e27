//! Publication side of a partitioned record stream

use super::record::TopicDescriptor;
use super::CauseChain;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use thiserror::Error;

/// Error conditions reported when publishing a record
#[derive(Debug, Error)]
pub enum PublishError {
    /// The notification could not be serialized
    #[error("failed to serialize notification")]
    Serialization(#[from] serde_json::Error),
    /// The transport rejected the record
    #[error("transport rejected the record: {0}")]
    Rejected(CauseChain),
    /// The transport did not acknowledge the record in time
    #[error("record was not acknowledged in time")]
    AckTimeout,
}

/// Acknowledgement returned by the transport for a published record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishAck {
    partition: i32,
    offset: i64,
}

impl PublishAck {
    /// Creates a new acknowledgement from the assigned coordinates
    pub fn new(partition: i32, offset: i64) -> Self {
        Self { partition, offset }
    }

    /// Partition the record was appended to
    pub fn partition(&self) -> i32 {
        self.partition
    }

    /// Offset the record was assigned within the partition
    pub fn offset(&self) -> i64 {
        self.offset
    }
}

/// Publisher for raw byte payloads
#[async_trait]
pub trait RawRecordPublisher: Send + Sync {
    /// Appends the payload to the given stream, waiting for acknowledgement
    ///
    /// Records carrying the same key are routed to the same partition and
    /// thus retain their relative order.
    async fn publish_raw(
        &self,
        topic: &TopicDescriptor,
        key: Option<&str>,
        payload: &[u8],
    ) -> Result<PublishAck, PublishError>;
}

/// Structured message that can travel over a record stream
pub trait Notification: Serialize + DeserializeOwned + PartialEq + Debug {
    /// Partitioning key of this notification, if any
    fn key(&self) -> Option<&str> {
        None
    }
}

/// Publisher for structured [`Notification`] instances
#[async_trait]
pub trait RecordPublisher: Send + Sync {
    /// Serializes the notification and appends it to the given stream
    async fn publish<N>(
        &self,
        topic: &TopicDescriptor,
        notification: &N,
    ) -> Result<PublishAck, PublishError>
    where
        N: Notification + Send + Sync;
}
