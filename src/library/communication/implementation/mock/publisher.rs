use super::ExpectationMode;
use crate::library::communication::implementation::json::JsonRecordPublisher;
use crate::library::communication::publisher::{
    Notification, PublishAck, PublishError, RawRecordPublisher,
};
use crate::library::communication::record::TopicDescriptor;
use crate::library::communication::CauseChain;
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Snapshot of a record that went through a [`MockRecordPublisher`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedRecord {
    /// Stream the record was published to
    pub topic: String,
    /// Partitioning key attached to the record
    pub key: Option<String>,
    /// Payload parsed back into a JSON value
    pub value: serde_json::Value,
}

/// Mocked record publisher for testing purposes
///
/// Journals everything it publishes and optionally verifies the records
/// against a list of expectations. When the instance is dropped while
/// expectations remain unfulfilled, it panics.
pub struct MockRecordPublisher {
    mode: ExpectationMode,
    remaining: AtomicUsize,
    sequence: AtomicUsize,
    failures: AtomicUsize,
    expected: Mutex<VecDeque<PublishedRecord>>,
    journal: Mutex<Vec<PublishedRecord>>,
}

impl Default for MockRecordPublisher {
    fn default() -> Self {
        Self::new(ExpectationMode::ExpectOnlyProvided)
    }
}

impl MockRecordPublisher {
    /// Creates a new instance with the given verification mode
    pub fn new(mode: ExpectationMode) -> Self {
        Self {
            mode,
            remaining: AtomicUsize::new(0),
            sequence: AtomicUsize::new(0),
            failures: AtomicUsize::new(0),
            expected: Mutex::new(VecDeque::new()),
            journal: Mutex::new(Vec::new()),
        }
    }

    /// Adds an expected notification to the back of the expectation queue
    pub fn expect<N: Notification>(&self, topic: &TopicDescriptor, notification: &N) -> &Self {
        let record = PublishedRecord {
            topic: topic.name().to_owned(),
            key: notification.key().map(str::to_owned),
            value: serde_json::to_value(notification).unwrap(),
        };

        println!("EXP {} {:?}", record.topic, record.value);

        self.expected.lock().unwrap().push_back(record);
        self.remaining.fetch_add(1, Ordering::SeqCst);

        self
    }

    /// Makes the next `count` publish calls fail with a rejection
    pub fn fail_times(&self, count: usize) -> &Self {
        self.failures.store(count, Ordering::SeqCst);
        self
    }

    /// Snapshot of everything published so far, in publish order
    pub fn published(&self) -> Vec<PublishedRecord> {
        self.journal.lock().unwrap().clone()
    }

    fn verify(&self, record: &PublishedRecord) {
        match self.mode {
            ExpectationMode::Ignore => {}
            mode => {
                let mut expected = self.expected.lock().unwrap();

                match expected.pop_front() {
                    Some(head) => {
                        if mode == ExpectationMode::AllowNoise && head != *record {
                            expected.push_front(head);
                        } else {
                            assert_eq!(head, *record);
                            self.remaining.fetch_sub(1, Ordering::SeqCst);
                        }
                    }
                    None => {
                        if mode != ExpectationMode::AllowNoise {
                            panic!("unexpected record published: {:?}", record);
                        }
                    }
                }
            }
        }
    }
}

impl Drop for MockRecordPublisher {
    fn drop(&mut self) {
        let remaining = self.remaining.load(Ordering::SeqCst);

        if remaining > 0 && !std::thread::panicking() {
            panic!("{} expected records were never published", remaining);
        }
    }
}

#[async_trait]
impl RawRecordPublisher for Arc<MockRecordPublisher> {
    async fn publish_raw(
        &self,
        topic: &TopicDescriptor,
        key: Option<&str>,
        payload: &[u8],
    ) -> Result<PublishAck, PublishError> {
        if self.failures.load(Ordering::SeqCst) > 0 {
            self.failures.fetch_sub(1, Ordering::SeqCst);
            println!("PUB {} <rejected>", topic.name());

            return Err(PublishError::Rejected(CauseChain::from_causes(vec![
                "injected publish failure".into(),
            ])));
        }

        let record = PublishedRecord {
            topic: topic.name().to_owned(),
            key: key.map(str::to_owned),
            value: serde_json::from_slice(payload).unwrap(),
        };

        println!("PUB {} {:?}", record.topic, record.value);

        self.verify(&record);
        self.journal.lock().unwrap().push(record);

        let offset = self.sequence.fetch_add(1, Ordering::SeqCst) as i64;
        Ok(PublishAck::new(0, offset))
    }
}

impl JsonRecordPublisher for Arc<MockRecordPublisher> {}

#[cfg(test)]
mod does {
    use super::*;
    use crate::library::communication::publisher::RecordPublisher;
    use pretty_assertions::assert_eq;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    struct ExampleNotification {
        content: String,
    }

    impl Notification for ExampleNotification {}

    fn example(content: &str) -> ExampleNotification {
        ExampleNotification {
            content: content.into(),
        }
    }

    #[tokio::test]
    async fn fulfill_expectations() {
        let topic = TopicDescriptor::new("example");
        let publisher = Arc::new(MockRecordPublisher::default());

        publisher
            .expect(&topic, &example("a"))
            .expect(&topic, &example("b"));

        publisher.publish(&topic, &example("a")).await.unwrap();
        publisher.publish(&topic, &example("b")).await.unwrap();
    }

    #[tokio::test]
    async fn allow_noise() {
        let topic = TopicDescriptor::new("example");
        let publisher = Arc::new(MockRecordPublisher::new(ExpectationMode::AllowNoise));

        publisher.expect(&topic, &example("expected"));

        publisher.publish(&topic, &example("noise")).await.unwrap();
        publisher
            .publish(&topic, &example("expected"))
            .await
            .unwrap();
    }

    #[tokio::test]
    #[should_panic]
    async fn fail_on_different_content() {
        let topic = TopicDescriptor::new("example");
        let publisher = Arc::new(MockRecordPublisher::default());

        publisher.expect(&topic, &example("expected"));

        publisher.publish(&topic, &example("other")).await.unwrap();
    }

    #[tokio::test]
    #[should_panic]
    async fn fail_on_unexpected() {
        let topic = TopicDescriptor::new("example");
        let publisher = Arc::new(MockRecordPublisher::default());

        publisher
            .publish(&topic, &example("surprise"))
            .await
            .unwrap();
    }

    #[test]
    #[should_panic]
    fn fail_on_missing() {
        let topic = TopicDescriptor::new("example");
        let publisher = MockRecordPublisher::default();

        publisher.expect(&topic, &example("never published"));

        drop(publisher);
    }

    #[tokio::test]
    async fn journal_published_records() {
        let topic = TopicDescriptor::new("example");
        let publisher = Arc::new(MockRecordPublisher::new(ExpectationMode::Ignore));

        publisher.publish(&topic, &example("a")).await.unwrap();

        let journal = publisher.published();
        assert_eq!(journal.len(), 1);
        assert_eq!(journal[0].topic, "example");
        assert_eq!(journal[0].value["content"], "a");
    }

    #[tokio::test]
    async fn reject_when_told_to() {
        let topic = TopicDescriptor::new("example");
        let publisher = Arc::new(MockRecordPublisher::new(ExpectationMode::Ignore));

        publisher.fail_times(1);

        assert!(publisher.publish(&topic, &example("a")).await.is_err());
        assert!(publisher.publish(&topic, &example("b")).await.is_ok());
    }
}
