//! Download pipeline for sekaidl.
//!
//! Discovers songs on the wiki's index page, extracts each detail page,
//! downloads cover art and every sung version, converts audio to MP3, and
//! writes ID3 tags. [`PipelineDriver`] ties the stages together; each stage
//! is usable on its own.
//!
//! Network access and transcoding sit behind the [`Fetch`] and [`Transcode`]
//! traits so that tests can drive the whole pipeline offline.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod config;
pub mod discover;
pub mod error;
pub mod extract;
pub mod fetch;
mod html;
pub mod media;
pub mod normalize;
pub mod pipeline;
pub mod tags;
pub mod transcode;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use discover::{cutoff_date, LinkDiscovery};
pub use error::{PipelineError, PipelineResult};
pub use extract::MetadataExtractor;
pub use fetch::{Fetch, FetchResponse, HttpFetcher};
pub use html::resolve_url;
pub use media::MediaFetcher;
pub use normalize::AudioNormalizer;
pub use pipeline::{PipelineDriver, PipelineEvent, RunReport, SurveyEntry};
pub use tags::TagWriter;
pub use transcode::{FfmpegTranscoder, Transcode};
