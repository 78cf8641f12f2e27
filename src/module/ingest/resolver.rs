//! Retrieval and unpacking of uploaded archives

use crate::domain::archive::ArchiveContent;
use crate::domain::event::UploadNotification;
use crate::library::retry::RetryPolicy;
use crate::library::storage::{ObjectStore, StorageError};
use flate2::read::MultiGzDecoder;
use std::io::{self, Read};
use std::sync::Arc;
use std::time::Duration;
use tar::Archive;
use thiserror::Error;
use tokio::task;
use tokio::time::timeout;
use tracing::instrument;

/// Error describing a failed archive retrieval
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// The fetch did not complete within the configured timeout
    #[error("archive retrieval timed out after {0:?}")]
    TimedOut(Duration),
    /// The object store reported a failure
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl RetrievalError {
    /// Whether another fetch attempt has a chance of succeeding
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::TimedOut(_) => true,
            Self::Storage(error) => error.is_transient(),
        }
    }
}

/// Error describing an archive whose content can not be unpacked
#[derive(Debug, Error)]
pub enum CorruptArchiveError {
    /// The bytes are not a valid gzip compressed tarball
    #[error("archive is not a valid gzip compressed tarball")]
    Unpack(#[from] io::Error),
    /// The unpacked content exceeds the configured size ceiling
    #[error("unpacked archive content exceeds the ceiling of {0} bytes")]
    Oversized(u64),
}

/// Error describing why an archive could not be resolved into its content
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The archive could not be retrieved from the object store
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),
    /// The archive was retrieved but its content is unusable
    #[error(transparent)]
    Corrupt(#[from] CorruptArchiveError),
}

/// Resolves archive references into their unpacked content
///
/// Transient retrieval failures are retried with backoff while corrupt
/// archives fail immediately since their content will not improve on a
/// second download.
pub struct ArchiveResolver {
    store: Arc<dyn ObjectStore>,
    policy: RetryPolicy,
    fetch_timeout: Duration,
    fetched_limit: u64,
    decompressed_limit: u64,
}

impl ArchiveResolver {
    /// Creates a new resolver reading from the given store
    pub fn new(
        store: Arc<dyn ObjectStore>,
        policy: RetryPolicy,
        fetch_timeout: Duration,
        fetched_limit: u64,
        decompressed_limit: u64,
    ) -> Self {
        Self {
            store,
            policy,
            fetch_timeout,
            fetched_limit,
            decompressed_limit,
        }
    }

    /// Fetches and unpacks the archive referenced by the notification
    #[instrument(skip(self, notification), fields(
        host = %notification.host_id,
        archive = %notification.archive_ref
    ))]
    pub async fn resolve(
        &self,
        notification: &UploadNotification,
    ) -> Result<ArchiveContent, ResolveError> {
        let data = self
            .policy
            .run(
                || self.fetch_once(&notification.archive_ref),
                RetrievalError::is_retryable,
            )
            .await?;

        let size_limit = self.decompressed_limit;
        let content = task::spawn_blocking(move || Self::unpack(data, size_limit))
            .await
            .map_err(|e| CorruptArchiveError::Unpack(io::Error::new(io::ErrorKind::Other, e)))??;

        Ok(content)
    }

    async fn fetch_once(&self, reference: &str) -> Result<Vec<u8>, RetrievalError> {
        timeout(
            self.fetch_timeout,
            self.store.fetch(reference, self.fetched_limit),
        )
        .await
        .map_err(|_| RetrievalError::TimedOut(self.fetch_timeout))?
        .map_err(RetrievalError::from)
    }

    fn unpack(data: Vec<u8>, size_limit: u64) -> Result<ArchiveContent, CorruptArchiveError> {
        let decoder = MultiGzDecoder::new(data.as_slice());
        let mut archive = Archive::new(decoder);
        let mut content = ArchiveContent::default();
        let mut total: u64 = 0;

        for entry in archive.entries()? {
            let mut entry = entry?;

            if !entry.header().entry_type().is_file() {
                continue;
            }

            // Sizes are taken from the entry headers, so the ceiling kicks
            // in before a decompression bomb gets buffered into memory.
            total = total.saturating_add(entry.header().size()?);
            if total > size_limit {
                return Err(CorruptArchiveError::Oversized(size_limit));
            }

            let path = entry.path()?.to_string_lossy().into_owned();
            let mut data = Vec::with_capacity(entry.header().size()? as usize);
            entry.read_to_end(&mut data)?;

            content.insert(path, data);
        }

        Ok(content)
    }
}

#[cfg(test)]
pub(crate) fn tar_gz_fixture(files: &[(&str, &[u8])]) -> Vec<u8> {
    use flate2::write::GzEncoder;
    use flate2::Compression;

    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for (path, data) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        builder.append_data(&mut header, path, *data).unwrap();
    }

    builder.into_inner().unwrap().finish().unwrap()
}
