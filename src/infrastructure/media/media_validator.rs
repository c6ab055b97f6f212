use std::sync::Arc;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tokio::runtime::Handle;

use crate::application::ports::{ArtifactStore, ArtifactStoreError, Validator, ValidatorError};
use crate::domain::MediaRef;

use super::ranged_source::RangedSource;

pub const SUPPORTED_EXTENSIONS: [&str; 7] = ["mp3", "wav", "mp4", "avi", "mov", "m4a", "ogg"];

const AVI_HEADER_BYTES: u64 = 12;
const MAX_PACKETS_BEFORE_AUDIO: usize = 256;

/// Checks an uploaded file by extension and size, then opens its container
/// and reads the first audio packet. Only the byte ranges the demuxer asks
/// for are downloaded. AVI, which the demuxers do not cover, is checked by
/// its RIFF header.
pub struct MediaValidator {
    store: Arc<dyn ArtifactStore>,
    max_size_bytes: u64,
}

impl MediaValidator {
    pub fn new(store: Arc<dyn ArtifactStore>, max_size_bytes: u64) -> Self {
        Self {
            store,
            max_size_bytes,
        }
    }

    pub fn is_supported_extension(extension: &str) -> bool {
        SUPPORTED_EXTENSIONS.contains(&extension.to_ascii_lowercase().as_str())
    }

    async fn check_avi_header(&self, media: &MediaRef, size: u64) -> Result<(), ValidatorError> {
        let header = self
            .store
            .fetch_range(media.as_str(), 0..AVI_HEADER_BYTES.min(size))
            .await
            .map_err(|e| store_error(media, &e))?;
        if header.starts_with(b"RIFF") && header.get(8..12) == Some(b"AVI ".as_slice()) {
            Ok(())
        } else {
            Err(ValidatorError::CorruptFile("missing RIFF AVI header".to_string()))
        }
    }

    async fn check_audio_stream(
        &self,
        media: &MediaRef,
        extension: &str,
        size: u64,
    ) -> Result<(), ValidatorError> {
        let source = RangedSource::new(
            Arc::clone(&self.store),
            media.as_str().to_string(),
            size,
            Handle::current(),
        );
        let fetched = source.fetched();
        let media = media.clone();
        let extension = extension.to_string();

        let outcome =
            tokio::task::spawn_blocking(move || read_first_audio_packet(source, &media, &extension))
                .await
                .map_err(|e| ValidatorError::Unavailable(format!("media check aborted: {}", e)))?;

        tracing::debug!(
            fetched_bytes = fetched.load(Ordering::Relaxed),
            size,
            "Media container read"
        );
        outcome
    }
}

fn store_error(media: &MediaRef, e: &ArtifactStoreError) -> ValidatorError {
    match e {
        ArtifactStoreError::NotFound(_) => {
            ValidatorError::CorruptFile(format!("{} is missing from storage", media))
        }
        other => ValidatorError::Unavailable(other.to_string()),
    }
}

fn demux_error(media: &MediaRef, context: &str, e: SymphoniaError) -> ValidatorError {
    if let SymphoniaError::IoError(io) = &e
        && let Some(store) = io
            .get_ref()
            .and_then(|inner| inner.downcast_ref::<ArtifactStoreError>())
    {
        return store_error(media, store);
    }
    ValidatorError::CorruptFile(format!("{}: {}", context, e))
}

/// Runs on a blocking thread: the demuxer pulls bytes synchronously.
fn read_first_audio_packet(
    source: RangedSource,
    media: &MediaRef,
    extension: &str,
) -> Result<(), ValidatorError> {
    let stream = MediaSourceStream::new(Box::new(source), Default::default());
    let mut hint = Hint::new();
    hint.with_extension(extension);

    let opened = symphonia::default::get_probe()
        .format(
            &hint,
            stream,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| demux_error(media, "container not recognised", e))?;
    let mut format = opened.format;

    let track_id = format
        .tracks()
        .iter()
        .find(|track| track.codec_params.codec != CODEC_TYPE_NULL)
        .map(|track| track.id)
        .ok_or_else(|| ValidatorError::CorruptFile("no audio track".to_string()))?;

    for _ in 0..MAX_PACKETS_BEFORE_AUDIO {
        let packet = format
            .next_packet()
            .map_err(|e| demux_error(media, "no readable audio packet", e))?;
        if packet.track_id() == track_id {
            return Ok(());
        }
    }
    Err(ValidatorError::CorruptFile(
        "no audio packet near the start of the file".to_string(),
    ))
}

#[async_trait]
impl Validator for MediaValidator {
    #[tracing::instrument(skip(self), fields(media = %media))]
    async fn validate(&self, media: &MediaRef) -> Result<(), ValidatorError> {
        let extension = media
            .extension()
            .ok_or_else(|| ValidatorError::InvalidFormat(format!("{} has no extension", media.filename())))?;
        if !Self::is_supported_extension(&extension) {
            return Err(ValidatorError::InvalidFormat(format!(
                "unsupported file type .{}; expected one of {}",
                extension,
                SUPPORTED_EXTENSIONS.join(", ")
            )));
        }

        let size = self
            .store
            .head(media.as_str())
            .await
            .map_err(|e| store_error(media, &e))?;
        if size == 0 {
            return Err(ValidatorError::CorruptFile("file is empty".to_string()));
        }
        if size > self.max_size_bytes {
            return Err(ValidatorError::InvalidFormat(format!(
                "file is {} bytes, limit is {} bytes",
                size, self.max_size_bytes
            )));
        }

        let checked = if extension == "avi" {
            self.check_avi_header(media, size).await
        } else {
            self.check_audio_stream(media, &extension, size).await
        };
        checked.map_err(|e| match e {
            ValidatorError::CorruptFile(reason) => ValidatorError::CorruptFile(format!(
                "{} is not a readable .{} file: {}",
                media.filename(),
                extension,
                reason
            )),
            other => other,
        })?;

        tracing::debug!(size, extension = %extension, "Media validated");
        Ok(())
    }
}
