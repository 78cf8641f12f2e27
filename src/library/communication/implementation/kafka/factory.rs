use super::{KafkaConnection, KafkaRecordPublisher, KafkaRecordSource};
use crate::library::communication::record::TopicDescriptor;
use crate::library::communication::source::ConsumerGroupDescriptor;
use crate::library::communication::CommunicationFactory;
use crate::library::BoxedError;

/// [`CommunicationFactory`] creating Kafka backed sources and publishers
#[derive(Debug, Clone)]
pub struct KafkaCommunicationFactory {
    connection: KafkaConnection,
    group: ConsumerGroupDescriptor,
}

impl KafkaCommunicationFactory {
    /// Creates a new factory from connection parameters and group identity
    pub fn new(connection: KafkaConnection, group: ConsumerGroupDescriptor) -> Self {
        Self { connection, group }
    }
}

impl CommunicationFactory for KafkaCommunicationFactory {
    type RecordSource = KafkaRecordSource;
    type RecordPublisher = KafkaRecordPublisher;

    fn record_source(&self, topics: &[TopicDescriptor]) -> Result<Self::RecordSource, BoxedError> {
        KafkaRecordSource::new(&self.connection, &self.group, topics)
    }

    fn record_publisher(&self) -> Result<Self::RecordPublisher, BoxedError> {
        KafkaRecordPublisher::new(&self.connection)
    }
}
