use super::KafkaConnection;
use crate::library::communication::record::{InboundRecord, SourcePosition, TopicDescriptor};
use crate::library::communication::source::{
    ConsumerGroupDescriptor, RecordSource, SourceError, StartPosition,
};
use crate::library::communication::CauseChain;
use crate::library::BoxedError;
use async_trait::async_trait;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::Message;
use rdkafka::{ClientConfig, Offset, TopicPartitionList};

/// [`RecordSource`] backed by a Kafka consumer group member
///
/// Offsets are neither stored nor committed automatically. Progress only
/// advances through explicit [`commit`](RecordSource::commit) calls, keeping
/// redelivery after a crash limited to records that were never acknowledged.
pub struct KafkaRecordSource {
    consumer: StreamConsumer,
}

impl KafkaRecordSource {
    /// Creates a new source and subscribes it to the given streams
    pub fn new(
        connection: &KafkaConnection,
        group: &ConsumerGroupDescriptor,
        topics: &[TopicDescriptor],
    ) -> Result<Self, BoxedError> {
        let offset_reset = match group.start() {
            StartPosition::Earliest => "earliest",
            StartPosition::Latest => "latest",
        };

        let mut config = ClientConfig::new();
        config
            .set("bootstrap.servers", connection.brokers())
            .set("group.id", group.id())
            .set("enable.auto.commit", "false")
            .set("enable.auto.offset.store", "false")
            .set("auto.offset.reset", offset_reset);

        if let Some(instance) = group.instance() {
            config.set("group.instance.id", instance);
        }

        let consumer: StreamConsumer = config.create()?;

        let names = topics.iter().map(|t| t.name()).collect::<Vec<_>>();
        consumer.subscribe(&names)?;

        Ok(Self { consumer })
    }
}

#[async_trait]
impl RecordSource for KafkaRecordSource {
    async fn recv(&self) -> Result<InboundRecord, SourceError> {
        let message = self
            .consumer
            .recv()
            .await
            .map_err(|e| SourceError::Receive(CauseChain::capture(&e)))?;

        let position =
            SourcePosition::new(message.topic(), message.partition(), message.offset());
        let payload = message.payload().unwrap_or_default().to_vec();

        Ok(InboundRecord::new(payload, position))
    }

    async fn commit(&self, position: &SourcePosition) -> Result<(), SourceError> {
        let mut assignment = TopicPartitionList::new();
        assignment
            .add_partition_offset(
                position.topic(),
                position.partition(),
                Offset::Offset(position.offset() + 1),
            )
            .map_err(|e| SourceError::Commit(CauseChain::capture(&e)))?;

        self.consumer
            .commit(&assignment, CommitMode::Async)
            .map_err(|e| SourceError::Commit(CauseChain::capture(&e)))
    }

    fn pause(&self, topic: &str, partition: i32) -> Result<(), SourceError> {
        let mut assignment = TopicPartitionList::new();
        assignment.add_partition(topic, partition);

        self.consumer
            .pause(&assignment)
            .map_err(|e| SourceError::Pause(CauseChain::capture(&e)))
    }

    async fn leave(&self) -> Result<(), SourceError> {
        self.consumer.unsubscribe();
        Ok(())
    }
}
