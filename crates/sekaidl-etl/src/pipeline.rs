//! End-to-end driver: discover, extract, download, normalize, tag.
//!
//! Songs and their versions are processed one at a time in document order.
//! Only resetting the output root and discovering the song list can fail a
//! run; every later error is logged against its song or version, counted in
//! the [`RunReport`], and the driver moves on to the next sibling.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

use sekaidl_core::naming::folder_name;
use sekaidl_core::{AudioVersion, LocalMediaAsset, SongLink, SongMetadata};

use crate::config::Config;
use crate::discover::{cutoff_date, LinkDiscovery};
use crate::error::{PipelineError, PipelineResult};
use crate::extract::MetadataExtractor;
use crate::fetch::{Fetch, HttpFetcher};
use crate::media::MediaFetcher;
use crate::normalize::AudioNormalizer;
use crate::tags::TagWriter;
use crate::transcode::{FfmpegTranscoder, Transcode};

/// Progress notifications sent while a run is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    /// The index was read; `count` songs will be processed.
    Discovered { count: usize },
    /// Song `index` of `total` (1-based) is starting.
    SongStarted {
        index: usize,
        total: usize,
        url: String,
    },
    /// The song could not be processed at all.
    SongFailed { url: String, error: String },
    /// One version of a song failed; its siblings are unaffected.
    VersionFailed {
        title: String,
        version_index: usize,
        error: String,
    },
    /// A song finished with `tagged` of `versions` files written.
    SongCompleted {
        title: String,
        tagged: usize,
        versions: usize,
    },
}

/// Outcome counts for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub songs_discovered: usize,
    pub songs_extracted: usize,
    pub songs_failed: usize,
    pub covers_saved: usize,
    pub versions_tagged: usize,
    pub versions_failed: usize,
}

impl RunReport {
    /// Whether any song or version failed.
    pub const fn has_failures(&self) -> bool {
        self.songs_failed > 0 || self.versions_failed > 0
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  Songs discovered: {}", self.songs_discovered)?;
        writeln!(f, "  Songs extracted:  {}", self.songs_extracted)?;
        writeln!(f, "  Songs failed:     {}", self.songs_failed)?;
        writeln!(f, "  Covers saved:     {}", self.covers_saved)?;
        writeln!(f, "  Versions tagged:  {}", self.versions_tagged)?;
        write!(f, "  Versions failed:  {}", self.versions_failed)
    }
}

/// One song as seen by survey mode.
#[derive(Debug, Clone, Serialize)]
pub struct SurveyEntry {
    pub link: SongLink,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<SongMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Runs the whole pipeline against one output root.
#[derive(Debug)]
pub struct PipelineDriver {
    output_dir: PathBuf,
    index_url: String,
    cutoff_days: u32,
    discovery: LinkDiscovery,
    extractor: MetadataExtractor,
    media: MediaFetcher,
    normalizer: AudioNormalizer,
    tagger: TagWriter,
    events: Option<UnboundedSender<PipelineEvent>>,
}

impl PipelineDriver {
    /// Build a driver around explicit fetch and transcode capabilities.
    pub fn new(config: &Config, fetcher: Arc<dyn Fetch>, transcoder: Arc<dyn Transcode>) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            index_url: config.index_url(),
            cutoff_days: config.cutoff_days,
            discovery: LinkDiscovery::new(config, Arc::clone(&fetcher)),
            extractor: MetadataExtractor::new(config, Arc::clone(&fetcher)),
            media: MediaFetcher::new(fetcher),
            normalizer: AudioNormalizer::new(transcoder, config.transcoder.sample_rate),
            tagger: TagWriter::new(config.album.clone()),
            events: None,
        }
    }

    /// Build a driver using HTTP and ffmpeg as configured.
    ///
    /// # Errors
    /// Returns [`PipelineError::Client`] if the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> PipelineResult<Self> {
        let fetcher = Arc::new(HttpFetcher::new(&config.http)?);
        let transcoder = Arc::new(FfmpegTranscoder::from_config(&config.transcoder));
        Ok(Self::new(config, fetcher, transcoder))
    }

    /// Send [`PipelineEvent`]s to `sender` during runs.
    #[must_use]
    pub fn with_events(mut self, sender: UnboundedSender<PipelineEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    /// Run the full pipeline with today's local date.
    ///
    /// # Errors
    /// See [`run_at`](Self::run_at).
    pub async fn run(&self) -> PipelineResult<RunReport> {
        self.run_at(chrono::Local::now().date_naive()).await
    }

    /// Run the full pipeline as if today were `today`.
    ///
    /// # Errors
    /// Fails only if the output root cannot be reset or discovery fails.
    pub async fn run_at(&self, today: NaiveDate) -> PipelineResult<RunReport> {
        reset_output_dir(&self.output_dir)?;

        let links = self.discover(today).await?;
        let total = links.len();
        let mut report = RunReport {
            songs_discovered: total,
            ..RunReport::default()
        };
        self.emit(PipelineEvent::Discovered { count: total });

        for (i, link) in links.iter().enumerate() {
            log::debug!("Processing {}/{}: {}", i + 1, total, link.url());
            self.emit(PipelineEvent::SongStarted {
                index: i + 1,
                total,
                url: link.url().to_string(),
            });

            if let Err(e) = self.process_song(link, &mut report).await {
                log::warn!("Skipping song {}: {}", link.url(), e);
                report.songs_failed += 1;
                self.emit(PipelineEvent::SongFailed {
                    url: link.url().to_string(),
                    error: e.to_string(),
                });
            }
        }

        log::info!(
            "Run complete: {} of {} songs extracted, {} versions tagged, {} failed",
            report.songs_extracted,
            report.songs_discovered,
            report.versions_tagged,
            report.versions_failed
        );
        Ok(report)
    }

    /// Discover and extract up to `limit` songs without writing anything.
    ///
    /// # Errors
    /// Fails only if discovery fails. Extraction failures are recorded on the
    /// affected entry.
    pub async fn survey(&self, today: NaiveDate, limit: Option<usize>) -> PipelineResult<Vec<SurveyEntry>> {
        let mut links = self.discover(today).await?;
        if let Some(limit) = limit {
            links.truncate(limit);
        }

        let mut entries = Vec::with_capacity(links.len());
        for link in links {
            let entry = match self.extractor.extract(link.url()).await {
                Ok(metadata) => SurveyEntry {
                    link,
                    metadata: Some(metadata),
                    error: None,
                },
                Err(e) => {
                    log::warn!("Could not extract {}: {}", link.url(), e);
                    SurveyEntry {
                        link,
                        metadata: None,
                        error: Some(e.to_string()),
                    }
                }
            };
            entries.push(entry);
        }
        Ok(entries)
    }

    async fn discover(&self, today: NaiveDate) -> PipelineResult<Vec<SongLink>> {
        let cutoff = cutoff_date(today, self.cutoff_days);
        log::info!("Keeping songs added before {}", cutoff);
        let links = self.discovery.discover(&self.index_url, cutoff).await?;
        log::info!("Discovered {} songs", links.len());
        Ok(links)
    }

    async fn process_song(&self, link: &SongLink, report: &mut RunReport) -> PipelineResult<()> {
        let metadata = self.extractor.extract(link.url()).await?;
        report.songs_extracted += 1;

        let song_dir = self.output_dir.join(folder_name(metadata.title()));
        std::fs::create_dir_all(&song_dir).map_err(|e| PipelineError::io(&song_dir, e))?;

        let cover = self.save_cover(&metadata, &song_dir).await;
        if cover.is_some() {
            report.covers_saved += 1;
        }

        let mut tagged = 0;
        for (version_index, version) in metadata.versions().iter().enumerate() {
            match self
                .process_version(&metadata, version_index, version, cover.as_ref(), &song_dir)
                .await
            {
                Ok(path) => {
                    log::info!("Saved {}", path.display());
                    tagged += 1;
                }
                Err(e) => {
                    log::warn!(
                        "Version {} of '{}' failed: {}",
                        version_index,
                        metadata.title(),
                        e
                    );
                    report.versions_failed += 1;
                    self.emit(PipelineEvent::VersionFailed {
                        title: metadata.title().to_string(),
                        version_index,
                        error: e.to_string(),
                    });
                }
            }
        }
        report.versions_tagged += tagged;

        self.emit(PipelineEvent::SongCompleted {
            title: metadata.title().to_string(),
            tagged,
            versions: metadata.versions().len(),
        });
        Ok(())
    }

    async fn save_cover(&self, metadata: &SongMetadata, song_dir: &Path) -> Option<LocalMediaAsset> {
        let Some(url) = metadata.cover_image_url() else {
            log::info!("No cover image found for '{}'", metadata.title());
            return None;
        };

        match self.media.fetch_cover(url, song_dir).await {
            Ok(asset) => Some(asset),
            Err(e) => {
                log::warn!("Cover for '{}' failed: {}", metadata.title(), e);
                None
            }
        }
    }

    async fn process_version(
        &self,
        metadata: &SongMetadata,
        version_index: usize,
        version: &AudioVersion,
        cover: Option<&LocalMediaAsset>,
        song_dir: &Path,
    ) -> PipelineResult<PathBuf> {
        let asset = self
            .media
            .fetch_audio(&version.source, song_dir, metadata.title(), version_index)
            .await?;
        let path = self.normalizer.normalize(asset.path()).await?;
        self.tagger.write_tags(
            &path,
            metadata.title(),
            &version.singers,
            cover.map(LocalMediaAsset::path),
        )?;
        Ok(path)
    }

    fn emit(&self, event: PipelineEvent) {
        if let Some(sender) = &self.events {
            if sender.send(event).is_err() {
                log::debug!("Pipeline event listener has gone away");
            }
        }
    }
}

/// Delete `dir` if present and recreate it empty.
///
/// # Errors
/// Returns [`PipelineError::Io`] if either step fails.
pub fn reset_output_dir(dir: &Path) -> PipelineResult<()> {
    if dir.exists() {
        log::info!("Clearing output directory {}", dir.display());
        std::fs::remove_dir_all(dir).map_err(|e| PipelineError::io(dir, e))?;
    }
    std::fs::create_dir_all(dir).map_err(|e| PipelineError::io(dir, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_reset_output_dir_clears_previous_run() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out");
        std::fs::create_dir_all(out.join("Old Song")).unwrap();
        std::fs::write(out.join("Old Song").join("cover.jpg"), b"x").unwrap();

        reset_output_dir(&out).unwrap();
        assert!(out.is_dir());
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 0);
    }

    #[test]
    fn test_reset_output_dir_creates_missing_root() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("nested").join("out");
        reset_output_dir(&out).unwrap();
        assert!(out.is_dir());
    }

    #[test]
    fn test_run_report_failures() {
        let mut report = RunReport::default();
        assert!(!report.has_failures());
        report.versions_failed = 1;
        assert!(report.has_failures());
    }

    #[test]
    fn test_run_report_display() {
        let report = RunReport {
            songs_discovered: 3,
            songs_extracted: 2,
            songs_failed: 1,
            covers_saved: 2,
            versions_tagged: 4,
            versions_failed: 1,
        };
        let text = report.to_string();
        assert!(text.contains("Songs discovered: 3"));
        assert!(text.contains("Versions failed:  1"));
    }
}
