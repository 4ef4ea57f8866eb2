//! # sekaidl
//!
//! Harvest songs from the Sekaipedia wiki into tagged MP3 files.
//!
//! sekaidl reads the wiki's song index, picks the songs old enough to have
//! settled, and for each one saves the cover art and every sung version into
//! its own folder, converting audio to MP3 and tagging it with the title, the
//! credited singers, the album name, and the cover.
