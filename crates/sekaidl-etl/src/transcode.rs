//! External transcoder capability.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::config::TranscoderConfig;
use crate::error::{PipelineError, PipelineResult};

/// Re-encode `input` to MP3 at `sample_rate`, writing `output`.
///
/// Implementations must leave `input` untouched.
#[async_trait]
pub trait Transcode: Send + Sync + std::fmt::Debug {
    async fn transcode(&self, input: &Path, output: &Path, sample_rate: u32) -> PipelineResult<()>;
}

/// [`Transcode`] that shells out to ffmpeg with the LAME encoder.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    program: PathBuf,
}

impl FfmpegTranscoder {
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    #[must_use]
    pub fn from_config(config: &TranscoderConfig) -> Self {
        Self::new(config.program.clone())
    }
}

#[async_trait]
impl Transcode for FfmpegTranscoder {
    async fn transcode(&self, input: &Path, output: &Path, sample_rate: u32) -> PipelineResult<()> {
        log::debug!(
            "Running {} on {} -> {}",
            self.program.display(),
            input.display(),
            output.display()
        );

        let result = Command::new(&self.program)
            .args(["-hide_banner", "-loglevel", "error", "-nostdin", "-n", "-i"])
            .arg(input)
            .args(["-vn", "-acodec", "libmp3lame", "-ar"])
            .arg(sample_rate.to_string())
            .args(["-f", "mp3"])
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| PipelineError::Transcode {
                path: input.to_path_buf(),
                message: format!("could not start {}: {e}", self.program.display()),
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(PipelineError::Transcode {
                path: input.to_path_buf(),
                message: format!(
                    "{} exited with {}: {}",
                    self.program.display(),
                    result.status,
                    stderr.trim()
                ),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_program_is_transcode_error() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.ogg");
        std::fs::write(&input, b"x").unwrap();

        let transcoder = FfmpegTranscoder::new(dir.path().join("no-such-ffmpeg"));
        let err = transcoder
            .transcode(&input, &dir.path().join("out.mp3"), 44_100)
            .await
            .unwrap_err();
        match err {
            PipelineError::Transcode { path, message } => {
                assert_eq!(path, input);
                assert!(message.contains("could not start"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_is_transcode_error() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.ogg");
        std::fs::write(&input, b"x").unwrap();

        let transcoder = FfmpegTranscoder::new("false");
        let err = transcoder
            .transcode(&input, &dir.path().join("out.mp3"), 44_100)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("exited with"));
        assert!(input.exists());
    }
}
