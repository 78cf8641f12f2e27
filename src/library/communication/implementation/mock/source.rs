use crate::library::communication::record::{InboundRecord, SourcePosition};
use crate::library::communication::source::{RecordSource, SourceError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Mocked record source for testing purposes
///
/// Serves a pre-loaded list of records and reports
/// [`SourceError::Closed`] once it runs dry. Commits and pauses are
/// journaled for later inspection.
#[derive(Default)]
pub struct MockRecordSource {
    records: Mutex<VecDeque<InboundRecord>>,
    commits: Mutex<Vec<SourcePosition>>,
    paused: Mutex<Vec<(String, i32)>>,
    left: AtomicBool,
}

impl MockRecordSource {
    /// Appends a record to the queue served by [`RecordSource::recv`]
    pub fn provide(&self, record: InboundRecord) -> &Self {
        self.records.lock().unwrap().push_back(record);
        self
    }

    /// Positions committed so far, in commit order
    pub fn commits(&self) -> Vec<SourcePosition> {
        self.commits.lock().unwrap().clone()
    }

    /// Partitions paused so far
    pub fn paused(&self) -> Vec<(String, i32)> {
        self.paused.lock().unwrap().clone()
    }

    /// Whether the source has left its consumer group
    pub fn left(&self) -> bool {
        self.left.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordSource for Arc<MockRecordSource> {
    async fn recv(&self) -> Result<InboundRecord, SourceError> {
        self.records
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(SourceError::Closed)
    }

    async fn commit(&self, position: &SourcePosition) -> Result<(), SourceError> {
        self.commits.lock().unwrap().push(position.clone());
        Ok(())
    }

    fn pause(&self, topic: &str, partition: i32) -> Result<(), SourceError> {
        self.paused.lock().unwrap().push((topic.to_owned(), partition));
        Ok(())
    }

    async fn leave(&self) -> Result<(), SourceError> {
        self.left.store(true, Ordering::SeqCst);
        Ok(())
    }
}
