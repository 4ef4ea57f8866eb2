//! Make sure every downloaded file is real MP3 audio.
//!
//! Files that already decode as MP3 are left alone. Anything else is
//! transcoded into a free staging name next to it and then renamed over the
//! original, so the caller's path never changes and the original is only
//! replaced once a finished replacement exists.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_MP3};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::{PipelineError, PipelineResult};
use crate::transcode::Transcode;

/// Converts downloaded audio to MP3 in place.
#[derive(Debug, Clone)]
pub struct AudioNormalizer {
    transcoder: Arc<dyn Transcode>,
    sample_rate: u32,
}

impl AudioNormalizer {
    pub fn new(transcoder: Arc<dyn Transcode>, sample_rate: u32) -> Self {
        Self {
            transcoder,
            sample_rate,
        }
    }

    /// Ensure `path` holds MP3 audio and return the same path.
    ///
    /// # Errors
    /// Returns [`PipelineError::Transcode`] if the transcoder fails or
    /// produces no output, and [`PipelineError::Io`] if the replacement
    /// cannot be moved into place. In every failure case the original file
    /// is left as it was.
    pub async fn normalize(&self, path: &Path) -> PipelineResult<PathBuf> {
        if is_mp3(path) {
            log::debug!("{} is already MP3", path.display());
            return Ok(path.to_path_buf());
        }

        let staging = staging_path(path);
        log::info!(
            "Converting {} to MP3 via {}",
            path.display(),
            staging.display()
        );

        if let Err(e) = self
            .transcoder
            .transcode(path, &staging, self.sample_rate)
            .await
        {
            discard(&staging);
            return Err(e);
        }

        if !staging.is_file() {
            return Err(PipelineError::Transcode {
                path: path.to_path_buf(),
                message: format!("no output written to {}", staging.display()),
            });
        }

        std::fs::rename(&staging, path).map_err(|e| {
            discard(&staging);
            PipelineError::io(path, e)
        })?;

        log::info!("Converted {}", path.display());
        Ok(path.to_path_buf())
    }
}

/// Whether `path` probes as an MP3 stream symphonia can decode.
pub fn is_mp3(path: &Path) -> bool {
    match probe_mp3(path) {
        Ok(found) => found,
        Err(e) => {
            log::debug!("{} is not MP3: {:#}", path.display(), e);
            false
        }
    }
}

fn probe_mp3(path: &Path) -> Result<bool> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open audio file: {}", path.display()))?;
    let mss = MediaSourceStream::new(Box::new(file), MediaSourceStreamOptions::default());

    // No extension hint: downloads are named .mp3 whatever they contain.
    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .context("Failed to probe audio format")?;

    let track = probed
        .format
        .default_track()
        .context("No default audio track found")?;

    if track.codec_params.codec != CODEC_TYPE_MP3 {
        return Ok(false);
    }

    symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("Failed to create decoder")?;

    Ok(true)
}

/// First free `<stem>.mp3`, `<stem>_1.mp3`, `<stem>_2.mp3`, ... next to
/// `target`.
pub fn staging_path(target: &Path) -> PathBuf {
    let candidate = target.with_extension("mp3");
    if !candidate.exists() {
        return candidate;
    }

    let stem = candidate
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut counter = 1_u32;
    loop {
        let next = candidate.with_file_name(format!("{stem}_{counter}.mp3"));
        if !next.exists() {
            return next;
        }
        counter += 1;
    }
}

fn discard(path: &Path) {
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            log::warn!("Could not remove {}: {}", path.display(), e);
        }
    }
}
