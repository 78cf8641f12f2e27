//! Kafka backed communication implementation

use std::time::Duration;

mod factory;
mod publisher;
mod source;

pub use factory::KafkaCommunicationFactory;
pub use publisher::KafkaRecordPublisher;
pub use source::KafkaRecordSource;

/// Connection parameters shared by all Kafka clients of a process
#[derive(Debug, Clone)]
pub struct KafkaConnection {
    brokers: String,
    delivery_timeout: Duration,
}

impl KafkaConnection {
    /// Creates a new connection description
    ///
    /// The broker list follows the usual comma separated `host:port` format.
    /// Records that could not be delivered within the timeout are reported
    /// as failed by the publisher.
    pub fn new<S: Into<String>>(brokers: S, delivery_timeout: Duration) -> Self {
        Self {
            brokers: brokers.into(),
            delivery_timeout,
        }
    }

    /// Comma separated list of bootstrap brokers
    pub fn brokers(&self) -> &str {
        &self.brokers
    }

    /// Upper bound for delivering a single record
    pub fn delivery_timeout(&self) -> Duration {
        self.delivery_timeout
    }
}
