use std::io::{self, Read, Seek, SeekFrom};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use symphonia::core::io::MediaSource;
use tokio::runtime::Handle;

use crate::application::ports::ArtifactStore;

const CHUNK_BYTES: u64 = 64 * 1024;

/// Blocking `Read + Seek` view of a stored object that downloads one chunk
/// at a time with ranged reads. Must be used off the async executor, e.g.
/// inside `spawn_blocking`.
pub(crate) struct RangedSource {
    store: Arc<dyn ArtifactStore>,
    path: String,
    len: u64,
    position: u64,
    chunk: Vec<u8>,
    chunk_start: u64,
    fetched: Arc<AtomicU64>,
    runtime: Handle,
}

impl RangedSource {
    pub(crate) fn new(store: Arc<dyn ArtifactStore>, path: String, len: u64, runtime: Handle) -> Self {
        Self {
            store,
            path,
            len,
            position: 0,
            chunk: Vec::new(),
            chunk_start: 0,
            fetched: Arc::new(AtomicU64::new(0)),
            runtime,
        }
    }

    /// Bytes downloaded so far; stays readable after the source is handed off.
    pub(crate) fn fetched(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.fetched)
    }

    fn load_chunk(&mut self) -> io::Result<()> {
        let end = (self.position + CHUNK_BYTES).min(self.len);
        let range = self.position..end;
        let store = Arc::clone(&self.store);
        let path = self.path.clone();
        let bytes = self
            .runtime
            .block_on(async move { store.fetch_range(&path, range).await })
            .map_err(io::Error::other)?;
        self.fetched.fetch_add(bytes.len() as u64, Ordering::Relaxed);
        self.chunk = bytes;
        self.chunk_start = self.position;
        Ok(())
    }

    fn chunk_holds_position(&self) -> bool {
        self.position >= self.chunk_start
            && self.position < self.chunk_start + self.chunk.len() as u64
    }
}

impl Read for RangedSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.position >= self.len || buf.is_empty() {
            return Ok(0);
        }
        if !self.chunk_holds_position() {
            self.load_chunk()?;
        }
        let offset = (self.position - self.chunk_start) as usize;
        let available = &self.chunk[offset..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.position += n as u64;
        Ok(n)
    }
}

impl Seek for RangedSource {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::End(delta) => self.len.checked_add_signed(delta),
            SeekFrom::Current(delta) => self.position.checked_add_signed(delta),
        };
        let target = target.ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "seek before start of media")
        })?;
        self.position = target;
        Ok(target)
    }
}

impl MediaSource for RangedSource {
    fn is_seekable(&self) -> bool {
        true
    }

    fn byte_len(&self) -> Option<u64> {
        Some(self.len)
    }
}
