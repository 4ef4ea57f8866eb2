//! Small helpers over `scraper` shared by the page readers.

use scraper::{ElementRef, Selector};

use crate::error::{PipelineError, PipelineResult};

/// Compile a CSS selector.
pub(crate) fn selector(css: &str) -> PipelineResult<Selector> {
    Selector::parse(css).map_err(|e| PipelineError::Selector {
        selector: css.to_string(),
        message: format!("{e:?}"),
    })
}

/// Concatenated, trimmed text content of an element.
pub(crate) fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Turn an `href`/`src` value into an absolute URL.
///
/// Scheme-relative values (`//host/path`) get `https:`; anything else is
/// joined against `base_url`. Returns `None` for empty or unjoinable values.
pub fn resolve_url(base_url: &str, raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Some(rest) = raw.strip_prefix("//") {
        return Some(format!("https://{rest}"));
    }
    let base = reqwest::Url::parse(base_url).ok()?;
    base.join(raw).ok().map(String::from)
}
