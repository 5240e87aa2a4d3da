use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use object_store::local::LocalFileSystem;
use object_store::path::Path as StorePath;
use object_store::{ObjectStore, WriteMultipart};

use crate::application::ports::{StagingStore, StagingStoreError};
use crate::domain::StoragePath;

const MAX_PARTS_IN_FLIGHT: usize = 4;

/// Stages uploads under a local directory so the decoder can read them by path.
pub struct LocalStagingStore {
    inner: Arc<LocalFileSystem>,
    base_path: PathBuf,
}

impl LocalStagingStore {
    pub fn new(base_path: PathBuf) -> Result<Self, StagingStoreError> {
        std::fs::create_dir_all(&base_path)?;
        let base_path = base_path.canonicalize()?;
        let fs = LocalFileSystem::new_with_prefix(&base_path)
            .map_err(|e| StagingStoreError::UploadFailed(e.to_string()))?;
        Ok(Self {
            inner: Arc::new(fs),
            base_path,
        })
    }

    pub fn base_path(&self) -> &std::path::Path {
        &self.base_path
    }
}

#[async_trait::async_trait]
impl StagingStore for LocalStagingStore {
    async fn store(
        &self,
        path: &StoragePath,
        mut stream: BoxStream<'_, Result<Bytes, io::Error>>,
    ) -> Result<u64, StagingStoreError> {
        let store_path = StorePath::from(path.as_str());
        let upload = self
            .inner
            .put_multipart(&store_path)
            .await
            .map_err(|e| StagingStoreError::UploadFailed(e.to_string()))?;
        let mut writer = WriteMultipart::new(upload);
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let bytes = match chunk {
                Ok(bytes) => bytes,
                Err(e) => {
                    abort_quietly(writer, path).await;
                    return Err(StagingStoreError::Io(e));
                }
            };
            written += bytes.len() as u64;
            writer.put(bytes);

            if let Err(e) = writer.wait_for_capacity(MAX_PARTS_IN_FLIGHT).await {
                abort_quietly(writer, path).await;
                return Err(StagingStoreError::UploadFailed(e.to_string()));
            }
        }

        writer
            .finish()
            .await
            .map_err(|e| StagingStoreError::UploadFailed(e.to_string()))?;

        tracing::debug!(path = %path, bytes = written, "Upload written to staging directory");
        Ok(written)
    }

    fn local_path(&self, path: &StoragePath) -> PathBuf {
        self.base_path.join(path.as_str())
    }

    async fn delete(&self, path: &StoragePath) -> Result<(), StagingStoreError> {
        let store_path = StorePath::from(path.as_str());
        match self.inner.delete(&store_path).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(StagingStoreError::DeleteFailed(e.to_string())),
        }
    }
}

async fn abort_quietly(writer: WriteMultipart, path: &StoragePath) {
    if let Err(e) = writer.abort().await {
        tracing::warn!(error = %e, path = %path, "Failed to abort partial upload");
    }
}
