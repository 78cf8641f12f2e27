//! Consumption side of a partitioned record stream

use super::record::{InboundRecord, SourcePosition};
use super::CauseChain;
use async_trait::async_trait;
use std::str::FromStr;
use thiserror::Error;

/// Position in the stream where a consumer group without committed progress starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartPosition {
    /// Replay the stream from its beginning
    Earliest,
    /// Only consume records appended after the group joined
    Latest,
}

/// Error thrown when parsing a [`StartPosition`] from a string
#[derive(Debug, Error)]
#[error("expected either `earliest` or `latest`, got `{0}`")]
pub struct InvalidStartPosition(String);

impl FromStr for StartPosition {
    type Err = InvalidStartPosition;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "earliest" => Ok(Self::Earliest),
            "latest" => Ok(Self::Latest),
            other => Err(InvalidStartPosition(other.to_owned())),
        }
    }
}

/// Identity of a consumer group member
///
/// All members sharing an id split the partitions of the consumed streams
/// between them. The optional instance label marks a member as static so a
/// restart resumes its previous partition assignment instead of triggering a
/// rebalance.
#[derive(Debug, Clone)]
pub struct ConsumerGroupDescriptor {
    id: String,
    instance: Option<String>,
    start: StartPosition,
}

impl ConsumerGroupDescriptor {
    /// Creates a new descriptor
    pub fn new<S: Into<String>>(id: S, instance: Option<String>, start: StartPosition) -> Self {
        Self {
            id: id.into(),
            instance,
            start,
        }
    }

    /// Identifier shared by all members of the group
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Optional static membership label of this member
    pub fn instance(&self) -> Option<&str> {
        self.instance.as_deref()
    }

    /// Where the group starts when no progress has been committed yet
    pub fn start(&self) -> StartPosition {
        self.start
    }
}

/// Error conditions reported by a [`RecordSource`]
#[derive(Debug, Error)]
pub enum SourceError {
    /// The stream ended and no further records will be delivered
    #[error("record source closed")]
    Closed,
    /// Receiving the next record failed
    #[error("failed to receive record: {0}")]
    Receive(CauseChain),
    /// Committing consumption progress failed
    #[error("failed to commit consumption progress: {0}")]
    Commit(CauseChain),
    /// Pausing delivery for a partition failed
    #[error("failed to pause partition: {0}")]
    Pause(CauseChain),
}

/// Member of a consumer group receiving records from subscribed streams
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Receives the next record from any assigned partition
    async fn recv(&self) -> Result<InboundRecord, SourceError>;

    /// Marks the record at the given position as processed
    ///
    /// After a restart, the member owning the partition resumes with the
    /// record following the last committed one.
    async fn commit(&self, position: &SourcePosition) -> Result<(), SourceError>;

    /// Stops delivery of further records from the given partition
    ///
    /// Already buffered records may still surface; callers are expected to
    /// discard them.
    fn pause(&self, topic: &str, partition: i32) -> Result<(), SourceError>;

    /// Leaves the consumer group, releasing the assigned partitions
    async fn leave(&self) -> Result<(), SourceError>;
}
