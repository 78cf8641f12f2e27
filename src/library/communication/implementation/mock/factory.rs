use super::{ExpectationMode, MockRecordPublisher, MockRecordSource, PublishedRecord};
use crate::library::communication::publisher::Notification;
use crate::library::communication::record::{InboundRecord, SourcePosition, TopicDescriptor};
use crate::library::communication::CommunicationFactory;
use crate::library::BoxedError;
use std::sync::Arc;

/// Mocked [`CommunicationFactory`] for testing purposes
///
/// Every source and publisher handed out by the factory shares its state, so
/// records provided to (and journaled by) the factory are visible to the
/// service under test and vice versa. Clones share that state as well,
/// allowing tests to keep a handle while the service consumes the factory.
#[derive(Default, Clone)]
pub struct MockCommunicationFactory {
    source: Arc<MockRecordSource>,
    publisher: Arc<MockRecordPublisher>,
}

impl MockCommunicationFactory {
    /// Creates a new factory whose publisher verifies with the given mode
    pub fn new(mode: ExpectationMode) -> Self {
        Self {
            source: Arc::default(),
            publisher: Arc::new(MockRecordPublisher::new(mode)),
        }
    }

    /// Appends a record to the queue served by the source
    pub fn provide_record(&self, record: InboundRecord) -> &Self {
        self.source.provide(record);
        self
    }

    /// Adds an expected notification to the publisher
    pub fn expect<N: Notification>(&self, topic: &TopicDescriptor, notification: &N) -> &Self {
        self.publisher.expect(topic, notification);
        self
    }

    /// Makes the next `count` publish calls fail
    pub fn fail_publishes(&self, count: usize) -> &Self {
        self.publisher.fail_times(count);
        self
    }

    /// Positions committed by the source so far
    pub fn commits(&self) -> Vec<SourcePosition> {
        self.source.commits()
    }

    /// Partitions paused on the source so far
    pub fn paused(&self) -> Vec<(String, i32)> {
        self.source.paused()
    }

    /// Whether the source has left its consumer group
    pub fn left(&self) -> bool {
        self.source.left()
    }

    /// Snapshot of everything published so far
    pub fn published(&self) -> Vec<PublishedRecord> {
        self.publisher.published()
    }
}

impl CommunicationFactory for MockCommunicationFactory {
    type RecordSource = Arc<MockRecordSource>;
    type RecordPublisher = Arc<MockRecordPublisher>;

    fn record_source(&self, _topics: &[TopicDescriptor]) -> Result<Self::RecordSource, BoxedError> {
        Ok(self.source.clone())
    }

    fn record_publisher(&self) -> Result<Self::RecordPublisher, BoxedError> {
        Ok(self.publisher.clone())
    }
}
