pub mod asset;
pub mod song;

pub use asset::{AssetKind, LocalMediaAsset};
pub use song::{AudioSource, AudioVersion, SongLink, SongMetadata};
