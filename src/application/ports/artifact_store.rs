use std::io;
use std::ops::Range;

use bytes::Bytes;
use futures::stream::BoxStream;

/// Byte storage for uploads, transcripts, documents and exports, addressed by
/// relative path.
#[async_trait::async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn store(
        &self,
        path: &str,
        stream: BoxStream<'_, Result<Bytes, io::Error>>,
        content_length: Option<u64>,
    ) -> Result<u64, ArtifactStoreError>;

    async fn put(&self, path: &str, data: Bytes) -> Result<u64, ArtifactStoreError>;

    async fn fetch(&self, path: &str) -> Result<Vec<u8>, ArtifactStoreError>;

    /// Reads the bytes in `range` without downloading the rest of the object.
    async fn fetch_range(&self, path: &str, range: Range<u64>)
    -> Result<Vec<u8>, ArtifactStoreError>;

    async fn delete(&self, path: &str) -> Result<(), ArtifactStoreError>;

    async fn head(&self, path: &str) -> Result<u64, ArtifactStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ArtifactStoreError {
    #[error("upload failed: {0}")]
    UploadFailed(String),
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("download failed: {0}")]
    DownloadFailed(String),
    #[error("delete failed: {0}")]
    DeleteFailed(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
