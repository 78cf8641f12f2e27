//! Mock implementations for testing purposes

mod factory;
mod publisher;
mod source;

pub use factory::MockCommunicationFactory;
pub use publisher::{MockRecordPublisher, PublishedRecord};
pub use source::MockRecordSource;

/// Degree to which a [`MockRecordPublisher`] verifies incoming records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectationMode {
    /// Do not verify anything, just journal the published records
    Ignore,
    /// Expect exactly the provided records in the provided order
    ExpectOnlyProvided,
    /// Expect the provided records in order but tolerate others in between
    AllowNoise,
}
