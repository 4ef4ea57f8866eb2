//! Error types for the download pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while discovering, extracting, downloading, converting, or
/// tagging songs.
///
/// Only discovery errors stop a run; the driver logs every other variant
/// against the song or version it belongs to and moves on.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The server answered with a non-success status.
    #[error("failed to fetch {url}: HTTP status {status}")]
    Fetch { url: String, status: u16 },

    /// The request never produced a response.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The page does not have the shape the extractor expects.
    #[error("unexpected page structure at {url}: {message}")]
    Structure { url: String, message: String },

    /// A built-in CSS selector failed to compile.
    #[error("invalid CSS selector {selector:?}: {message}")]
    Selector { selector: String, message: String },

    /// A version row carried no downloadable audio. Nothing was fetched.
    #[error("no downloadable audio for version {version_index}: {reason}")]
    NoAudioSource {
        version_index: usize,
        reason: String,
    },

    /// Cover bytes could not be decoded or re-encoded.
    #[error("image error for {url}: {source}")]
    Image {
        url: String,
        #[source]
        source: image::ImageError,
    },

    /// The external transcoder could not be started or exited non-zero.
    #[error("transcoder failed on {}: {message}", path.display())]
    Transcode { path: PathBuf, message: String },

    /// Reading or writing tags failed.
    #[error("tag error on {}: {source}", path.display())]
    Tag {
        path: PathBuf,
        #[source]
        source: lofty::error::LoftyError,
    },

    /// A filesystem operation failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    /// An error propagated from the core model.
    #[error("invalid data: {0}")]
    Model(#[from] sekaidl_core::Error),
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn structure(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Structure {
            url: url.into(),
            message: message.into(),
        }
    }
}

/// Convenience alias for pipeline results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_message_includes_url_and_status() {
        let err = PipelineError::Fetch {
            url: "https://wiki.test/wiki/Song".to_string(),
            status: 404,
        };
        let msg = err.to_string();
        assert!(msg.contains("https://wiki.test/wiki/Song"));
        assert!(msg.contains("404"));
    }

    #[test]
    fn test_io_error_message_includes_path() {
        let err = PipelineError::io(
            "out/Song/cover.jpg",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("out/Song/cover.jpg"));
    }
}
