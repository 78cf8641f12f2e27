//! Parking of unprocessable records

use super::metrics::{DEAD_LETTERS_TOTAL, SINK_FALLBACKS_TOTAL};
use crate::domain::event::{DeadLetterRecord, ProcessingStage};
use crate::library::communication::publisher::RecordPublisher;
use crate::library::communication::record::{InboundRecord, TopicDescriptor};
use crate::library::communication::CauseChain;
use crate::library::retry::RetryPolicy;
use tracing::{error, instrument};

/// Sink forwarding unprocessable records to the dead letter stream
///
/// Parking a record must never stall the pipeline. Publishing the dead
/// letter is retried a few times and, as a last resort, the record is dumped
/// to the log with its full payload so no information is lost.
pub struct FailureSink<P> {
    publisher: P,
    topic: TopicDescriptor,
    policy: RetryPolicy,
}

impl<P> FailureSink<P>
where
    P: RecordPublisher + Send + Sync,
{
    /// Creates a new sink publishing to the given stream
    pub fn new(publisher: P, topic: TopicDescriptor, policy: RetryPolicy) -> Self {
        Self {
            publisher,
            topic,
            policy,
        }
    }

    /// Parks the record together with the error that stopped it
    #[instrument(skip(self, record, error), fields(
        stage = %stage,
        topic = record.position().topic(),
        partition = record.position().partition(),
        offset = record.position().offset()
    ))]
    pub async fn send(&self, record: &InboundRecord, stage: ProcessingStage, error: CauseChain) {
        DEAD_LETTERS_TOTAL
            .with_label_values(&[stage.as_str()])
            .inc();

        let dead_letter = DeadLetterRecord::new(record, stage, error);

        let outcome = self
            .policy
            .run(
                || self.publisher.publish(&self.topic, &dead_letter),
                |_| true,
            )
            .await;

        if let Err(publish_error) = outcome {
            SINK_FALLBACKS_TOTAL.inc();
            error!(
                ?publish_error,
                stage = %dead_letter.stage,
                cause = %dead_letter.error,
                original_bytes = %dead_letter.original_bytes,
                "Failed to park unprocessable record, dumping it to the log instead"
            );
        }
    }
}
