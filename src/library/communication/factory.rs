use super::publisher::RecordPublisher;
use super::record::TopicDescriptor;
use super::source::RecordSource;
use crate::library::BoxedError;

/// Factory to create instances of all communication related traits
///
/// Abstracting over the transport allows services to run against mock
/// implementations in unit tests while production code wires up the real
/// deal.
pub trait CommunicationFactory {
    /// Type of the consuming side created by this factory
    type RecordSource: RecordSource + Send + Sync + 'static;
    /// Type of the publishing side created by this factory
    type RecordPublisher: RecordPublisher + Send + Sync + 'static;

    /// Creates a new record source subscribed to the given streams
    fn record_source(&self, topics: &[TopicDescriptor]) -> Result<Self::RecordSource, BoxedError>;

    /// Creates a new record publisher
    fn record_publisher(&self) -> Result<Self::RecordPublisher, BoxedError>;
}
