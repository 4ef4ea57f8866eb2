//! Cover and audio downloads.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::codecs::jpeg::JpegEncoder;

use sekaidl_core::naming::{audio_file_name, sanitize_filename, COVER_FILE_NAME};
use sekaidl_core::{AudioSource, LocalMediaAsset};

use crate::error::{PipelineError, PipelineResult};
use crate::fetch::Fetch;

const COVER_JPEG_QUALITY: u8 = 90;

/// Downloads remote media into a song's output folder.
#[derive(Debug, Clone)]
pub struct MediaFetcher {
    fetcher: Arc<dyn Fetch>,
}

impl MediaFetcher {
    pub fn new(fetcher: Arc<dyn Fetch>) -> Self {
        Self { fetcher }
    }

    /// Download `url` into `dest_dir` under the sanitized `name_hint`.
    ///
    /// # Errors
    /// Fails on a non-success status, a transport error, or a write error.
    pub async fn fetch(&self, url: &str, dest_dir: &Path, name_hint: &str) -> PipelineResult<PathBuf> {
        let bytes = self.download(url).await?;
        let path = dest_dir.join(sanitize_filename(name_hint));
        write_file(&path, &bytes)?;
        Ok(path)
    }

    /// Download one audio version to `{title}_{version_index}.mp3`.
    ///
    /// Sources without a URL are rejected before any request is made.
    ///
    /// # Errors
    /// Returns [`PipelineError::NoAudioSource`] for the missing-audio
    /// sentinels, otherwise the same errors as [`fetch`](Self::fetch).
    pub async fn fetch_audio(
        &self,
        source: &AudioSource,
        dest_dir: &Path,
        title: &str,
        version_index: usize,
    ) -> PipelineResult<LocalMediaAsset> {
        let Some(url) = source.url() else {
            return Err(PipelineError::NoAudioSource {
                version_index,
                reason: source.to_string(),
            });
        };

        let path = self
            .fetch(url, dest_dir, &audio_file_name(title, version_index))
            .await?;
        log::info!("Audio downloaded: {}", path.display());
        Ok(LocalMediaAsset::audio(path))
    }

    /// Download a cover image and store it as baseline RGB JPEG `cover.jpg`,
    /// whatever format the server sent.
    ///
    /// # Errors
    /// Fails on fetch or write errors, and with [`PipelineError::Image`] when
    /// the bytes are not a decodable image.
    pub async fn fetch_cover(&self, url: &str, dest_dir: &Path) -> PipelineResult<LocalMediaAsset> {
        let bytes = self.download(url).await?;
        let jpeg = encode_cover_jpeg(&bytes).map_err(|source| PipelineError::Image {
            url: url.to_string(),
            source,
        })?;

        let path = dest_dir.join(COVER_FILE_NAME);
        write_file(&path, &jpeg)?;
        log::info!("Cover saved: {}", path.display());
        Ok(LocalMediaAsset::cover(path))
    }

    async fn download(&self, url: &str) -> PipelineResult<Vec<u8>> {
        self.fetcher.get(url).await?.into_success(url)
    }
}

/// Decode any supported image and re-encode it as a 3-channel JPEG.
///
/// Alpha is dropped rather than blended.
pub fn encode_cover_jpeg(bytes: &[u8]) -> Result<Vec<u8>, image::ImageError> {
    let rgb = image::load_from_memory(bytes)?.to_rgb8();
    let mut encoded = Vec::new();
    JpegEncoder::new_with_quality(&mut encoded, COVER_JPEG_QUALITY).encode_image(&rgb)?;
    Ok(encoded)
}

fn write_file(path: &Path, bytes: &[u8]) -> PipelineResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
    }
    std::fs::write(path, bytes).map_err(|e| PipelineError::io(path, e))
}
