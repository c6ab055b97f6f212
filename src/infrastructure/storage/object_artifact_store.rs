use std::io;
use std::ops::Range;
use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as StorePath;
use object_store::{MultipartUpload, ObjectStore, PutPayload};

use crate::application::ports::{ArtifactStore, ArtifactStoreError};

/// Artifact storage on top of any `object_store` backend.
pub struct ObjectArtifactStore {
    inner: Arc<dyn ObjectStore>,
}

impl ObjectArtifactStore {
    pub fn local(base_path: PathBuf) -> Result<Self, ArtifactStoreError> {
        std::fs::create_dir_all(&base_path).map_err(ArtifactStoreError::Io)?;
        let fs = LocalFileSystem::new_with_prefix(base_path)
            .map_err(|e| ArtifactStoreError::UploadFailed(e.to_string()))?;
        Ok(Self {
            inner: Arc::new(fs),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(InMemory::new()),
        }
    }
}

fn missing_or(e: object_store::Error, other: fn(String) -> ArtifactStoreError) -> ArtifactStoreError {
    match e {
        object_store::Error::NotFound { path, .. } => ArtifactStoreError::NotFound(path),
        e => other(e.to_string()),
    }
}

#[async_trait::async_trait]
impl ArtifactStore for ObjectArtifactStore {
    async fn store(
        &self,
        path: &str,
        mut stream: BoxStream<'_, Result<Bytes, io::Error>>,
        _content_length: Option<u64>,
    ) -> Result<u64, ArtifactStoreError> {
        let store_path = StorePath::from(path);
        let mut upload = self
            .inner
            .put_multipart(&store_path)
            .await
            .map_err(|e| ArtifactStoreError::UploadFailed(e.to_string()))?;

        let mut total_bytes: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let bytes = match chunk {
                Ok(b) => b,
                Err(e) => {
                    let _ = upload.abort().await;
                    return Err(ArtifactStoreError::Io(e));
                }
            };
            total_bytes += bytes.len() as u64;
            if let Err(e) = upload.put_part(PutPayload::from(bytes)).await {
                let _ = upload.abort().await;
                return Err(ArtifactStoreError::UploadFailed(e.to_string()));
            }
        }

        upload
            .complete()
            .await
            .map_err(|e| ArtifactStoreError::UploadFailed(e.to_string()))?;

        Ok(total_bytes)
    }

    async fn put(&self, path: &str, data: Bytes) -> Result<u64, ArtifactStoreError> {
        let size = data.len() as u64;
        self.inner
            .put(&StorePath::from(path), PutPayload::from(data))
            .await
            .map_err(|e| ArtifactStoreError::UploadFailed(e.to_string()))?;
        Ok(size)
    }

    async fn fetch(&self, path: &str) -> Result<Vec<u8>, ArtifactStoreError> {
        let store_path = StorePath::from(path);
        let result = self
            .inner
            .get(&store_path)
            .await
            .map_err(|e| missing_or(e, ArtifactStoreError::DownloadFailed))?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| ArtifactStoreError::DownloadFailed(e.to_string()))?;

        Ok(bytes.to_vec())
    }

    async fn fetch_range(
        &self,
        path: &str,
        range: Range<u64>,
    ) -> Result<Vec<u8>, ArtifactStoreError> {
        let bytes = self
            .inner
            .get_range(&StorePath::from(path), range)
            .await
            .map_err(|e| missing_or(e, ArtifactStoreError::DownloadFailed))?;
        Ok(bytes.to_vec())
    }

    async fn delete(&self, path: &str) -> Result<(), ArtifactStoreError> {
        let store_path = StorePath::from(path);
        self.inner
            .delete(&store_path)
            .await
            .map_err(|e| missing_or(e, ArtifactStoreError::DeleteFailed))
    }

    async fn head(&self, path: &str) -> Result<u64, ArtifactStoreError> {
        let store_path = StorePath::from(path);
        let meta = self
            .inner
            .head(&store_path)
            .await
            .map_err(|e| missing_or(e, ArtifactStoreError::DownloadFailed))?;
        Ok(meta.size as u64)
    }
}
