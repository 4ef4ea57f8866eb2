//! Title normalization and filesystem-safe naming.
//!
//! All output paths are derived from the page title, so every rule here is
//! idempotent: applying it to its own output changes nothing.

/// Characters rejected by at least one common filesystem.
pub const ILLEGAL_FILENAME_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// File name used for every song's cover image.
pub const COVER_FILE_NAME: &str = "cover.jpg";

/// Title used when a detail page has no `<title>` element.
pub const UNKNOWN_TITLE: &str = "Unknown Title";

/// Replace filesystem-illegal characters with `_` and trim the result.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if ILLEGAL_FILENAME_CHARS.contains(&c) { '_' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Folder name for a song. Same as [`sanitize_filename`], but commas are
/// replaced as well.
///
/// Names made only of dots (`.`, `..`) would point at the output root or its
/// parent, so they become `_`.
#[must_use]
pub fn folder_name(title: &str) -> String {
    let name = sanitize_filename(&title.replace(',', "_"));
    if name.chars().all(|c| c == '.') {
        return String::from("_");
    }
    name
}

/// File name for one audio version: `{sanitized_title}_{index}.mp3`.
#[must_use]
pub fn audio_file_name(title: &str, version_index: usize) -> String {
    format!("{}_{version_index}.mp3", sanitize_filename(title))
}

/// Strip the site's brand suffix from a page title and trim whitespace.
///
/// Falls back to [`UNKNOWN_TITLE`] when nothing is left.
#[must_use]
pub fn normalize_title(raw: &str, suffix: &str) -> String {
    let trimmed = raw.trim_end();
    let stripped = if suffix.trim().is_empty() {
        trimmed
    } else {
        trimmed.strip_suffix(suffix.trim_end()).unwrap_or(trimmed)
    };
    let title = stripped.trim();
    if title.is_empty() {
        UNKNOWN_TITLE.to_string()
    } else {
        title.to_string()
    }
}
