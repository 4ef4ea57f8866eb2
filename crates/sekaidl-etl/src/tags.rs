//! ID3 tagging of normalized audio files.

use std::path::Path;

use lofty::config::WriteOptions;
use lofty::file::TaggedFileExt;
use lofty::picture::{MimeType, Picture, PictureType};
use lofty::tag::{Accessor, Tag, TagExt, TagType};

use crate::error::{PipelineError, PipelineResult};

/// Writes title, artist, album, and front cover onto MP3 files.
#[derive(Debug, Clone)]
pub struct TagWriter {
    album: String,
}

impl TagWriter {
    pub fn new(album: impl Into<String>) -> Self {
        Self {
            album: album.into(),
        }
    }

    /// Replace every tag on `path` with a fresh ID3v2 tag.
    ///
    /// Singers are joined with `", "`; an empty list gives an empty artist.
    /// Without a cover the picture frame is omitted.
    ///
    /// # Errors
    /// Returns [`PipelineError::Tag`] if the file cannot be read or saved as
    /// tagged audio, and [`PipelineError::Io`] if the cover cannot be read.
    pub fn write_tags(
        &self,
        path: &Path,
        title: &str,
        singers: &[String],
        cover: Option<&Path>,
    ) -> PipelineResult<()> {
        let existing = lofty::read_from_path(path).map_err(|e| tag_error(path, e))?;
        for tag_type in existing.tags().iter().map(Tag::tag_type) {
            log::debug!("Removing {:?} tag from {}", tag_type, path.display());
            tag_type
                .remove_from_path(path)
                .map_err(|e| tag_error(path, e))?;
        }

        let mut tag = Tag::new(TagType::Id3v2);
        tag.set_title(title.to_string());
        tag.set_artist(singers.join(", "));
        tag.set_album(self.album.clone());

        match cover {
            Some(cover_path) => {
                let data =
                    std::fs::read(cover_path).map_err(|e| PipelineError::io(cover_path, e))?;
                tag.push_picture(Picture::new_unchecked(
                    PictureType::CoverFront,
                    Some(MimeType::Jpeg),
                    Some("Cover".to_string()),
                    data,
                ));
            }
            None => log::info!("No cover for {}, writing text tags only", path.display()),
        }

        tag.save_to_path(path, WriteOptions::default())
            .map_err(|e| tag_error(path, e))?;

        log::debug!("Tagged {}", path.display());
        Ok(())
    }
}

fn tag_error(path: &Path, source: lofty::error::LoftyError) -> PipelineError {
    PipelineError::Tag {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::silent_mp3;
    use tempfile::TempDir;

    fn read_id3(path: &Path) -> Tag {
        let tagged = lofty::read_from_path(path).unwrap();
        tagged.tag(TagType::Id3v2).cloned().unwrap()
    }

    fn singers(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_writes_text_frames_and_cover() {
        let dir = TempDir::new().unwrap();
        let audio = dir.path().join("Song_0.mp3");
        std::fs::write(&audio, silent_mp3()).unwrap();
        let cover = dir.path().join("cover.jpg");
        std::fs::write(&cover, [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10]).unwrap();

        let writer = TagWriter::new("Project SEKAI");
        writer
            .write_tags(&audio, "Song", &singers(&["Miku", "Rin"]), Some(&cover))
            .unwrap();

        let tag = read_id3(&audio);
        assert_eq!(tag.title().as_deref(), Some("Song"));
        assert_eq!(tag.artist().as_deref(), Some("Miku, Rin"));
        assert_eq!(tag.album().as_deref(), Some("Project SEKAI"));

        let pictures = tag.pictures();
        assert_eq!(pictures.len(), 1);
        assert_eq!(pictures[0].pic_type(), PictureType::CoverFront);
        assert_eq!(pictures[0].mime_type(), Some(&MimeType::Jpeg));
    }

    #[test]
    fn test_without_cover_has_no_picture() {
        let dir = TempDir::new().unwrap();
        let audio = dir.path().join("Song_0.mp3");
        std::fs::write(&audio, silent_mp3()).unwrap();

        TagWriter::new("Project SEKAI")
            .write_tags(&audio, "Song", &singers(&["Miku"]), None)
            .unwrap();

        let tag = read_id3(&audio);
        assert_eq!(tag.artist().as_deref(), Some("Miku"));
        assert!(tag.pictures().is_empty());
    }

    #[test]
    fn test_retagging_replaces_previous_values() {
        let dir = TempDir::new().unwrap();
        let audio = dir.path().join("Song_0.mp3");
        std::fs::write(&audio, silent_mp3()).unwrap();

        let writer = TagWriter::new("Project SEKAI");
        writer
            .write_tags(&audio, "Old", &singers(&["Someone"]), None)
            .unwrap();
        writer
            .write_tags(&audio, "New", &singers(&["Miku"]), None)
            .unwrap();

        let tag = read_id3(&audio);
        assert_eq!(tag.title().as_deref(), Some("New"));
        assert_eq!(tag.artist().as_deref(), Some("Miku"));
    }

    #[test]
    fn test_retagging_without_cover_drops_old_picture() {
        let dir = TempDir::new().unwrap();
        let audio = dir.path().join("Song_0.mp3");
        std::fs::write(&audio, silent_mp3()).unwrap();
        let cover = dir.path().join("cover.jpg");
        std::fs::write(&cover, [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10]).unwrap();

        let writer = TagWriter::new("Project SEKAI");
        writer
            .write_tags(&audio, "Song", &singers(&["Miku"]), Some(&cover))
            .unwrap();
        assert_eq!(read_id3(&audio).pictures().len(), 1);

        writer
            .write_tags(&audio, "Song", &singers(&["Miku"]), None)
            .unwrap();
        assert!(read_id3(&audio).pictures().is_empty());
    }

    #[test]
    fn test_other_tag_types_are_removed() {
        let dir = TempDir::new().unwrap();
        let audio = dir.path().join("Song_0.mp3");
        std::fs::write(&audio, silent_mp3()).unwrap();

        let mut legacy = Tag::new(TagType::Id3v1);
        legacy.set_title("Legacy".to_string());
        legacy.set_artist("Somebody".to_string());
        legacy.save_to_path(&audio, WriteOptions::default()).unwrap();
        assert!(lofty::read_from_path(&audio)
            .unwrap()
            .tag(TagType::Id3v1)
            .is_some());

        TagWriter::new("Project SEKAI")
            .write_tags(&audio, "Song", &singers(&["Miku"]), None)
            .unwrap();

        let tagged = lofty::read_from_path(&audio).unwrap();
        let types: Vec<TagType> = tagged.tags().iter().map(Tag::tag_type).collect();
        assert_eq!(types, vec![TagType::Id3v2]);
        assert_eq!(read_id3(&audio).title().as_deref(), Some("Song"));
    }

    #[test]
    fn test_missing_file_is_tag_error() {
        let dir = TempDir::new().unwrap();
        let err = TagWriter::new("Project SEKAI")
            .write_tags(&dir.path().join("missing.mp3"), "Song", &[], None)
            .unwrap_err();
        assert!(matches!(err, PipelineError::Tag { .. }));
    }
}
