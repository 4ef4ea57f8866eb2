use std::fmt;
use std::path::{Path, PathBuf};

/// What a downloaded file is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Cover,
    Audio,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cover => f.write_str("cover"),
            Self::Audio => f.write_str("audio"),
        }
    }
}

/// A file written under a song's output folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalMediaAsset {
    pub local_path: PathBuf,
    pub kind: AssetKind,
}

impl LocalMediaAsset {
    #[must_use]
    pub fn new(local_path: PathBuf, kind: AssetKind) -> Self {
        Self { local_path, kind }
    }

    #[must_use]
    pub fn cover(local_path: PathBuf) -> Self {
        Self::new(local_path, AssetKind::Cover)
    }

    #[must_use]
    pub fn audio(local_path: PathBuf) -> Self {
        Self::new(local_path, AssetKind::Audio)
    }

    pub fn path(&self) -> &Path {
        &self.local_path
    }
}

impl fmt::Display for LocalMediaAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.local_path.display(), self.kind)
    }
}
