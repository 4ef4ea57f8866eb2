//! Song discovery from the wiki's index page.
//!
//! The index is a set of sortable tables, one row per song. Column 1 links
//! to the song's detail page and column 7 holds the date it was added
//! (`YYYY/MM/DD`). Only rows dated strictly before the cutoff are kept.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Days, NaiveDate};
use scraper::Html;

use sekaidl_core::SongLink;

use crate::config::Config;
use crate::error::{PipelineError, PipelineResult};
use crate::fetch::Fetch;
use crate::html::{resolve_url, selector, text_of};

const INDEX_TABLE: &str = "table.wikitable.sortable";
const MIN_COLUMNS: usize = 7;
const LINK_COLUMN: usize = 0;
const DATE_COLUMN: usize = 6;
const DATE_FORMAT: &str = "%Y/%m/%d";

/// The cutoff for a run: `today` minus the configured window.
///
/// Rows are kept only when dated strictly before this day, so a song added
/// exactly `window_days` ago is left out. Comparing against a wall-clock
/// timestamp instead would keep that boundary day.
#[must_use]
pub fn cutoff_date(today: NaiveDate, window_days: u32) -> NaiveDate {
    today
        .checked_sub_days(Days::new(u64::from(window_days)))
        .unwrap_or(NaiveDate::MIN)
}

/// Fetches the index page and lists the songs to process.
#[derive(Debug, Clone)]
pub struct LinkDiscovery {
    fetcher: Arc<dyn Fetch>,
    base_url: String,
}

impl LinkDiscovery {
    pub fn new(config: &Config, fetcher: Arc<dyn Fetch>) -> Self {
        Self {
            fetcher,
            base_url: config.base_url.clone(),
        }
    }

    /// Discover song links on `index_url` added strictly before `cutoff`.
    ///
    /// Links come back in document order with duplicates removed (first
    /// occurrence wins).
    ///
    /// # Errors
    /// Returns [`PipelineError::Fetch`]/[`PipelineError::Transport`] if the
    /// page cannot be retrieved and [`PipelineError::Structure`] if it has no
    /// sortable listing table.
    pub async fn discover(&self, index_url: &str, cutoff: NaiveDate) -> PipelineResult<Vec<SongLink>> {
        log::info!("Fetching song index {}", index_url);
        let body = self.fetcher.get(index_url).await?.into_success(index_url)?;
        let page = String::from_utf8_lossy(&body);

        let links = parse_index(&page, index_url, &self.base_url, cutoff)?;
        log::info!(
            "Discovered {} songs added before {}",
            links.len(),
            cutoff
        );
        Ok(links)
    }
}

/// Parse an index page into song links dated strictly before `cutoff`.
///
/// Rows with fewer than seven cells or without a link are ignored; rows with
/// an unparseable date are logged and skipped.
///
/// # Errors
/// Returns [`PipelineError::Structure`] if the page has no sortable listing
/// table.
pub fn parse_index(
    page: &str,
    page_url: &str,
    base_url: &str,
    cutoff: NaiveDate,
) -> PipelineResult<Vec<SongLink>> {
    let document = Html::parse_document(page);
    let table_sel = selector(INDEX_TABLE)?;
    let row_sel = selector("tr")?;
    let cell_sel = selector("td")?;
    let link_sel = selector("a[href]")?;

    let tables: Vec<_> = document.select(&table_sel).collect();
    if tables.is_empty() {
        return Err(PipelineError::structure(
            page_url,
            "no sortable listing table found",
        ));
    }

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for table in tables {
        for row in table.select(&row_sel).skip(1) {
            let cells: Vec<_> = row.select(&cell_sel).collect();
            if cells.len() < MIN_COLUMNS {
                continue;
            }

            let Some(href) = cells[LINK_COLUMN]
                .select(&link_sel)
                .next()
                .and_then(|a| a.value().attr("href"))
            else {
                continue;
            };

            let date_text = text_of(cells[DATE_COLUMN]);
            let date_added = match NaiveDate::parse_from_str(&date_text, DATE_FORMAT) {
                Ok(date) => date,
                Err(e) => {
                    log::warn!("Skipping row with invalid date {:?}: {}", date_text, e);
                    continue;
                }
            };

            if date_added >= cutoff {
                continue;
            }

            let Some(url) = resolve_url(base_url, href) else {
                log::warn!("Skipping row with unresolvable link {:?}", href);
                continue;
            };

            if !seen.insert(url.clone()) {
                log::debug!("Skipping duplicate link {}", url);
                continue;
            }

            match SongLink::new(url, date_added) {
                Ok(link) => links.push(link),
                Err(e) => log::warn!("Skipping row: {}", e),
            }
        }
    }

    Ok(links)
}
