//! Core extraction model for sekaidl.
//!
//! This crate defines the data shapes produced while reading the wiki
//! (song links, song metadata, audio versions), the local media assets
//! written to disk, and the naming rules that turn wiki titles into safe
//! file and folder names.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod error;
pub mod model;
pub mod naming;

pub use error::{Error, Result};
pub use model::{AssetKind, AudioSource, AudioVersion, LocalMediaAsset, SongLink, SongMetadata};
