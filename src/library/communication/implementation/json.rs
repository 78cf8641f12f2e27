//! JSON serialization layer on top of raw publishers

use crate::library::communication::publisher::{
    Notification, PublishAck, PublishError, RawRecordPublisher, RecordPublisher,
};
use crate::library::communication::record::TopicDescriptor;
use async_trait::async_trait;

/// Marker trait to derive a [`RecordPublisher`] from a [`RawRecordPublisher`]
/// by encoding notifications as JSON
pub trait JsonRecordPublisher: RawRecordPublisher + Send + Sync {}

#[async_trait]
impl<P> RecordPublisher for P
where
    P: JsonRecordPublisher,
{
    async fn publish<N>(
        &self,
        topic: &TopicDescriptor,
        notification: &N,
    ) -> Result<PublishAck, PublishError>
    where
        N: Notification + Send + Sync,
    {
        let payload = serde_json::to_vec(notification)?;
        self.publish_raw(topic, notification.key(), &payload).await
    }
}
