//! In-memory object store for testing purposes

use super::{ObjectStore, StorageError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// [`ObjectStore`] holding its objects in a map
///
/// Optionally fails a number of fetches with a transient error to exercise
/// retry behaviour.
#[derive(Default)]
pub struct InMemoryObjectStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    failures: AtomicUsize,
}

impl InMemoryObjectStore {
    /// Stores an object under the given reference
    pub fn insert<S: Into<String>>(&self, reference: S, data: Vec<u8>) -> &Self {
        self.objects.lock().unwrap().insert(reference.into(), data);
        self
    }

    /// Makes the next `count` fetches fail with a transient error
    pub fn fail_times(&self, count: usize) -> &Self {
        self.failures.store(count, Ordering::SeqCst);
        self
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn fetch(&self, reference: &str, size_limit: u64) -> Result<Vec<u8>, StorageError> {
        if self.failures.load(Ordering::SeqCst) > 0 {
            self.failures.fetch_sub(1, Ordering::SeqCst);
            return Err(StorageError::Unavailable(
                503,
                "injected transient failure".into(),
            ));
        }

        let objects = self.objects.lock().unwrap();
        let data = objects
            .get(reference)
            .ok_or_else(|| StorageError::NotFound(reference.to_owned()))?;

        let size = data.len() as u64;

        if size > size_limit {
            Err(StorageError::TooLarge(size, size_limit))
        } else {
            Ok(data.clone())
        }
    }
}
