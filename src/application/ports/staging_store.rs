use std::io;
use std::path::PathBuf;

use bytes::Bytes;
use futures::stream::BoxStream;

use crate::domain::StoragePath;

/// Short-lived storage for uploads that must be readable from the local filesystem.
#[async_trait::async_trait]
pub trait StagingStore: Send + Sync {
    /// Writes the stream to `path`, returning the number of bytes staged.
    /// A failed stream leaves no partial object behind.
    async fn store(
        &self,
        path: &StoragePath,
        stream: BoxStream<'_, Result<Bytes, io::Error>>,
    ) -> Result<u64, StagingStoreError>;

    /// Filesystem location of a staged object.
    fn local_path(&self, path: &StoragePath) -> PathBuf;

    async fn delete(&self, path: &StoragePath) -> Result<(), StagingStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StagingStoreError {
    #[error("upload failed: {0}")]
    UploadFailed(String),
    #[error("delete failed: {0}")]
    DeleteFailed(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
