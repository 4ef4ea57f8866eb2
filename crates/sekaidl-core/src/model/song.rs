use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

/// A song detail page discovered on the index, with its "date added".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongLink {
    url: Url,
    date_added: NaiveDate,
}

impl SongLink {
    /// Create a link, rejecting anything that is not an absolute http(s) URL.
    ///
    /// # Errors
    /// Returns [`Error::InvalidUrl`] when the URL does not parse, has a
    /// scheme other than http(s), or has no host.
    pub fn new(url: impl Into<String>, date_added: NaiveDate) -> Result<Self> {
        let raw = url.into();
        let url = match Url::parse(&raw) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.host_str().is_some() => url,
            _ => return Err(Error::InvalidUrl(raw)),
        };
        Ok(Self { url, date_added })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn as_url(&self) -> &Url {
        &self.url
    }

    pub const fn date_added(&self) -> NaiveDate {
        self.date_added
    }
}

impl fmt::Display for SongLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

/// Where a version's audio can be downloaded from.
///
/// The two "missing" variants stay distinct so a report can tell a row with
/// no player at all from a player whose sources were all empty. Neither is
/// ever fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "url", rename_all = "snake_case")]
pub enum AudioSource {
    Url(String),
    /// The row has no media element and no fallback hyperlink.
    NoAudioElement,
    /// A media element exists but none of its sources carry a `src`.
    NoUsableSource,
}

impl AudioSource {
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Url(url) => Some(url),
            Self::NoAudioElement | Self::NoUsableSource => None,
        }
    }

    pub const fn is_available(&self) -> bool {
        matches!(self, Self::Url(_))
    }
}

impl fmt::Display for AudioSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => f.write_str(url),
            Self::NoAudioElement => f.write_str("<no audio element>"),
            Self::NoUsableSource => f.write_str("<no usable audio source>"),
        }
    }
}

/// One recorded performance of a song.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioVersion {
    /// Credited singers in document order. Empty means nobody is credited.
    pub singers: Vec<String>,
    pub source: AudioSource,
}

impl AudioVersion {
    #[must_use]
    pub fn new(singers: Vec<String>, source: AudioSource) -> Self {
        Self { singers, source }
    }

    /// Singers joined for the artist tag.
    #[must_use]
    pub fn artist(&self) -> String {
        self.singers.join(", ")
    }
}

/// Everything read from one song's detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongMetadata {
    title: String,
    cover_image_url: Option<String>,
    versions: Vec<AudioVersion>,
}

impl SongMetadata {
    /// # Errors
    /// Returns [`Error::InvalidData`] if the title is empty after trimming.
    pub fn new(
        title: impl Into<String>,
        cover_image_url: Option<String>,
        versions: Vec<AudioVersion>,
    ) -> Result<Self> {
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err(Error::InvalidData("song title is empty".to_string()));
        }
        Ok(Self {
            title,
            cover_image_url,
            versions,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn cover_image_url(&self) -> Option<&str> {
        self.cover_image_url.as_deref()
    }

    /// Versions in document order; index 0 is the canonical version.
    pub fn versions(&self) -> &[AudioVersion] {
        &self.versions
    }
}
