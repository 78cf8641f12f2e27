use super::KafkaConnection;
use crate::library::communication::implementation::json::JsonRecordPublisher;
use crate::library::communication::publisher::{PublishAck, PublishError, RawRecordPublisher};
use crate::library::communication::record::TopicDescriptor;
use crate::library::communication::CauseChain;
use crate::library::BoxedError;
use async_trait::async_trait;
use rdkafka::error::KafkaError;
use rdkafka::message::ToBytes;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::types::RDKafkaErrorCode;
use rdkafka::util::Timeout;
use rdkafka::ClientConfig;

/// [`RawRecordPublisher`] backed by an idempotent Kafka producer
///
/// Idempotence makes broker-side retries safe: a record that was delivered
/// but whose acknowledgement got lost is not appended a second time.
pub struct KafkaRecordPublisher {
    producer: FutureProducer,
}

impl KafkaRecordPublisher {
    /// Creates a new publisher for the given connection
    pub fn new(connection: &KafkaConnection) -> Result<Self, BoxedError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", connection.brokers())
            .set("enable.idempotence", "true")
            .set(
                "message.timeout.ms",
                connection.delivery_timeout().as_millis().to_string(),
            )
            .create()?;

        Ok(Self { producer })
    }

    async fn dispatch<K, P>(
        &self,
        record: FutureRecord<'_, K, P>,
    ) -> Result<PublishAck, PublishError>
    where
        K: ToBytes + ?Sized,
        P: ToBytes + ?Sized,
    {
        match self.producer.send(record, Timeout::Never).await {
            Ok((partition, offset)) => Ok(PublishAck::new(partition, offset)),
            Err((KafkaError::MessageProduction(RDKafkaErrorCode::MessageTimedOut), _)) => {
                Err(PublishError::AckTimeout)
            }
            Err((error, _)) => Err(PublishError::Rejected(CauseChain::capture(&error))),
        }
    }
}

#[async_trait]
impl RawRecordPublisher for KafkaRecordPublisher {
    async fn publish_raw(
        &self,
        topic: &TopicDescriptor,
        key: Option<&str>,
        payload: &[u8],
    ) -> Result<PublishAck, PublishError> {
        match key {
            Some(key) => {
                let record = FutureRecord::to(topic.name()).payload(payload).key(key);
                self.dispatch(record).await
            }
            None => {
                let record: FutureRecord<'_, (), _> =
                    FutureRecord::to(topic.name()).payload(payload);
                self.dispatch(record).await
            }
        }
    }
}

impl JsonRecordPublisher for KafkaRecordPublisher {}
