//! Song detail page extraction.
//!
//! A detail page carries the song title in `<title>`, the jacket art either
//! as an `og:image` meta tag or as an `<img>` whose source mentions
//! "Jacket", and a second `wikitable` listing one row per sung version:
//! column 2 links each singer, column 3 holds the player.

use std::sync::Arc;

use scraper::{ElementRef, Html, Selector};

use sekaidl_core::naming::{normalize_title, UNKNOWN_TITLE};
use sekaidl_core::{AudioSource, AudioVersion, SongMetadata};

use crate::config::Config;
use crate::error::{PipelineError, PipelineResult};
use crate::fetch::Fetch;
use crate::html::{resolve_url, selector, text_of};

const JACKET_MARKER: &str = "Jacket";
const VERSION_TABLE_INDEX: usize = 1;
const MIN_COLUMNS: usize = 3;
const SINGER_COLUMN: usize = 1;
const AUDIO_COLUMN: usize = 2;

/// Fetches detail pages and reads them into [`SongMetadata`].
#[derive(Debug, Clone)]
pub struct MetadataExtractor {
    fetcher: Arc<dyn Fetch>,
    base_url: String,
    title_suffix: String,
}

impl MetadataExtractor {
    pub fn new(config: &Config, fetcher: Arc<dyn Fetch>) -> Self {
        Self {
            fetcher,
            base_url: config.base_url.clone(),
            title_suffix: config.title_suffix.clone(),
        }
    }

    /// Fetch and parse one detail page.
    ///
    /// # Errors
    /// Fails with a fetch error when the page cannot be retrieved and with
    /// [`PipelineError::Structure`] when it has fewer than two wikitables.
    /// Both are per-song conditions: callers log them and move on.
    pub async fn extract(&self, detail_url: &str) -> PipelineResult<SongMetadata> {
        let body = self
            .fetcher
            .get(detail_url)
            .await?
            .into_success(detail_url)?;
        let page = String::from_utf8_lossy(&body);
        parse_detail(&page, detail_url, &self.base_url, &self.title_suffix)
    }
}

/// Selectors used on a detail page, compiled once per page.
#[derive(Debug)]
struct DetailSelectors {
    title: Selector,
    og_image: Selector,
    img: Selector,
    table: Selector,
    row: Selector,
    cell: Selector,
    singer: Selector,
    audio: Selector,
    source: Selector,
    link: Selector,
}

impl DetailSelectors {
    fn compile() -> PipelineResult<Self> {
        Ok(Self {
            title: selector("title")?,
            og_image: selector(r#"meta[property="og:image"]"#)?,
            img: selector("img[src]")?,
            table: selector("table.wikitable")?,
            row: selector("tr")?,
            cell: selector("td")?,
            singer: selector("a")?,
            audio: selector("audio")?,
            source: selector("source[src]")?,
            link: selector("a[href]")?,
        })
    }
}

/// Parse a detail page.
///
/// # Errors
/// Returns [`PipelineError::Structure`] when the version table is missing.
pub fn parse_detail(
    page: &str,
    page_url: &str,
    base_url: &str,
    title_suffix: &str,
) -> PipelineResult<SongMetadata> {
    let sel = DetailSelectors::compile()?;
    let document = Html::parse_document(page);

    let title = extract_title(&document, &sel, title_suffix);
    let cover = extract_cover(&document, &sel, base_url);
    if cover.is_none() {
        log::info!("No cover image found on {}", page_url);
    }
    let versions = extract_versions(&document, &sel, page_url, base_url)?;

    Ok(SongMetadata::new(title, cover, versions)?)
}

fn extract_title(document: &Html, sel: &DetailSelectors, suffix: &str) -> String {
    let raw = document
        .select(&sel.title)
        .next()
        .map(text_of)
        .unwrap_or_else(|| UNKNOWN_TITLE.to_string());
    normalize_title(&raw, suffix)
}

fn extract_cover(document: &Html, sel: &DetailSelectors, base_url: &str) -> Option<String> {
    let og_image = document
        .select(&sel.og_image)
        .filter_map(|meta| meta.value().attr("content"))
        .find_map(|content| resolve_url(base_url, content));
    if let Some(url) = og_image {
        return Some(resolve_thumbnail(&url));
    }

    document
        .select(&sel.img)
        .filter_map(|img| img.value().attr("src"))
        .filter(|src| src.contains(JACKET_MARKER))
        .find_map(|src| resolve_url(base_url, src))
        .map(|url| resolve_thumbnail(&url))
}

/// Map a MediaWiki thumbnail URL to its full-resolution original.
///
/// `.../thumb/a/b/Jacket.jpg/220px-Jacket.jpg` becomes `.../a/b/Jacket.jpg`.
/// URLs without a `/thumb/` segment are returned unchanged.
#[must_use]
pub fn resolve_thumbnail(url: &str) -> String {
    if !url.contains("/thumb/") {
        return url.to_string();
    }
    let original = url.replacen("/thumb/", "/", 1);
    match original.rsplit_once('/') {
        Some((head, last)) if is_scaled_name(last) => head.to_string(),
        _ => original,
    }
}

/// `220px-Jacket.jpg` style file names.
fn is_scaled_name(name: &str) -> bool {
    name.split_once("px-")
        .is_some_and(|(width, _)| !width.is_empty() && width.bytes().all(|b| b.is_ascii_digit()))
}

fn extract_versions(
    document: &Html,
    sel: &DetailSelectors,
    page_url: &str,
    base_url: &str,
) -> PipelineResult<Vec<AudioVersion>> {
    let Some(table) = document.select(&sel.table).nth(VERSION_TABLE_INDEX) else {
        return Err(PipelineError::structure(
            page_url,
            "fewer than two wikitables; no version table",
        ));
    };

    let mut versions = Vec::new();
    for row in table.select(&sel.row).skip(1) {
        let cells: Vec<_> = row.select(&sel.cell).collect();
        if cells.len() < MIN_COLUMNS {
            continue;
        }

        let singers = cells[SINGER_COLUMN]
            .select(&sel.singer)
            .map(text_of)
            .filter(|name| !name.is_empty())
            .collect();
        let source = audio_source(cells[AUDIO_COLUMN], sel, base_url);

        if !source.is_available() {
            log::debug!("Version {} on {} has no audio: {}", versions.len(), page_url, source);
        }
        versions.push(AudioVersion::new(singers, source));
    }

    Ok(versions)
}

/// Read the player cell of a version row.
///
/// A native `<audio>` element wins: its first `<source>` with a non-empty
/// `src` is used. Without one, the first hyperlink in the cell is taken.
fn audio_source(cell: ElementRef<'_>, sel: &DetailSelectors, base_url: &str) -> AudioSource {
    if let Some(audio) = cell.select(&sel.audio).next() {
        let url = audio
            .select(&sel.source)
            .filter_map(|source| source.value().attr("src"))
            .find_map(|src| resolve_url(base_url, src));
        return url.map_or(AudioSource::NoUsableSource, AudioSource::Url);
    }

    cell.select(&sel.link)
        .filter_map(|a| a.value().attr("href"))
        .find_map(|href| resolve_url(base_url, href))
        .map_or(AudioSource::NoAudioElement, AudioSource::Url)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.sekaipedia.org";
    const URL: &str = "https://www.sekaipedia.org/wiki/Tell_Your_World";
    const SUFFIX: &str = " - Sekaipedia";

    fn detail_page(head: &str, body: &str) -> String {
        format!("<html><head>{head}</head><body>{body}</body></html>")
    }

    const INFO_TABLE: &str =
        r#"<table class="wikitable"><tr><th>Info</th></tr><tr><td>Composer</td></tr></table>"#;

    fn version_table(rows: &[&str]) -> String {
        let mut html = String::from(
            r#"<table class="wikitable"><tr><th>Version</th><th>Singers</th><th>Audio</th></tr>"#,
        );
        for r in rows {
            html.push_str(r);
        }
        html.push_str("</table>");
        html
    }

    const ROW_AUDIO: &str = r#"<tr><td>Sekai</td><td><a href="/wiki/Miku">Hatsune Miku</a>, <a href="/wiki/Ichika"> Hoshino Ichika </a></td><td><audio controls><source src=""><source src="//static.sekaipedia.org/a/b/song.ogg"></audio></td></tr>"#;
    const ROW_EMPTY_AUDIO: &str =
        r#"<tr><td>Inst</td><td></td><td><audio><source src=""></audio></td></tr>"#;
    const ROW_LINK: &str = r#"<tr><td>Game</td><td><a href="/wiki/Rin">Kagamine Rin</a></td><td><a href="https://cdn.test/game.mp3">Play</a></td></tr>"#;
    const ROW_NOTHING: &str = "<tr><td>Cut</td><td>Nobody</td><td>Not released</td></tr>";
    const ROW_SHORT: &str = "<tr><td>Only</td><td>two</td></tr>";

    fn parse(head: &str, body: &str) -> PipelineResult<SongMetadata> {
        parse_detail(&detail_page(head, body), URL, BASE, SUFFIX)
    }

    #[test]
    fn test_title_is_stripped_of_brand_suffix() {
        let body = format!("{INFO_TABLE}{}", version_table(&[]));
        let meta = parse("<title>Tell Your World - Sekaipedia</title>", &body).unwrap();
        assert_eq!(meta.title(), "Tell Your World");
    }

    #[test]
    fn test_missing_title_falls_back() {
        let body = format!("{INFO_TABLE}{}", version_table(&[]));
        let meta = parse("", &body).unwrap();
        assert_eq!(meta.title(), UNKNOWN_TITLE);
    }

    #[test]
    fn test_cover_prefers_og_image() {
        let head = r#"<title>X</title><meta property="og:image" content="https://static.test/images/a/ab/Jacket_X.png">"#;
        let body = format!(
            r#"<img src="//static.test/images/thumb/c/cd/Jacket_Other.png/220px-Jacket_Other.png">{INFO_TABLE}{}"#,
            version_table(&[])
        );
        let meta = parse(head, &body).unwrap();
        assert_eq!(
            meta.cover_image_url(),
            Some("https://static.test/images/a/ab/Jacket_X.png")
        );
    }

    #[test]
    fn test_cover_falls_back_to_jacket_img_and_resolves_thumbnail() {
        let body = format!(
            r#"<img src="/logo.png"><img src="//static.test/images/thumb/c/cd/Jacket_X.png/220px-Jacket_X.png">{INFO_TABLE}{}"#,
            version_table(&[])
        );
        let meta = parse("<title>X</title>", &body).unwrap();
        assert_eq!(
            meta.cover_image_url(),
            Some("https://static.test/images/c/cd/Jacket_X.png")
        );
    }

    #[test]
    fn test_missing_cover_is_not_an_error() {
        let body = format!("{INFO_TABLE}{}", version_table(&[]));
        let meta = parse("<title>X</title>", &body).unwrap();
        assert!(meta.cover_image_url().is_none());
    }

    #[test]
    fn test_resolve_thumbnail() {
        assert_eq!(
            resolve_thumbnail("https://x.test/thumb/a/b/Jacket.jpg/220px-Jacket.jpg"),
            "https://x.test/a/b/Jacket.jpg"
        );
        assert_eq!(
            resolve_thumbnail("https://x.test/a/b/Jacket.jpg"),
            "https://x.test/a/b/Jacket.jpg"
        );
        // no scaled file name to drop
        assert_eq!(
            resolve_thumbnail("https://x.test/thumb/a/b/Jacket.jpg"),
            "https://x.test/a/b/Jacket.jpg"
        );
    }

    #[test]
    fn test_versions_in_document_order_with_sentinels() {
        let body = format!(
            "{INFO_TABLE}{}",
            version_table(&[ROW_AUDIO, ROW_EMPTY_AUDIO, ROW_LINK, ROW_NOTHING])
        );
        let meta = parse("<title>X</title>", &body).unwrap();
        let versions = meta.versions();
        assert_eq!(versions.len(), 4);

        assert_eq!(versions[0].singers, vec!["Hatsune Miku", "Hoshino Ichika"]);
        assert_eq!(
            versions[0].source,
            AudioSource::Url("https://static.sekaipedia.org/a/b/song.ogg".to_string())
        );

        assert!(versions[1].singers.is_empty());
        assert_eq!(versions[1].source, AudioSource::NoUsableSource);

        assert_eq!(versions[2].singers, vec!["Kagamine Rin"]);
        assert_eq!(
            versions[2].source,
            AudioSource::Url("https://cdn.test/game.mp3".to_string())
        );

        assert!(versions[3].singers.is_empty());
        assert_eq!(versions[3].source, AudioSource::NoAudioElement);
    }

    #[test]
    fn test_version_count_matches_rows_with_three_cells() {
        let body = format!(
            "{INFO_TABLE}{}",
            version_table(&[ROW_SHORT, ROW_NOTHING, ROW_SHORT, ROW_EMPTY_AUDIO, ROW_AUDIO])
        );
        let meta = parse("<title>X</title>", &body).unwrap();
        assert_eq!(meta.versions().len(), 3);
    }

    #[test]
    fn test_single_wikitable_is_structure_error() {
        let err = parse("<title>X</title>", INFO_TABLE).unwrap_err();
        assert!(matches!(err, PipelineError::Structure { .. }));
    }

    #[test]
    fn test_only_second_wikitable_is_read() {
        let third = version_table(&[ROW_LINK]);
        let body = format!("{INFO_TABLE}{}{third}", version_table(&[ROW_NOTHING]));
        let meta = parse("<title>X</title>", &body).unwrap();
        assert_eq!(meta.versions().len(), 1);
        assert_eq!(meta.versions()[0].source, AudioSource::NoAudioElement);
    }
}
