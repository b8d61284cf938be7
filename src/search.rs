//! Filtering of fetched Zotero items.
//!
//! Filters combine with logical AND. At least one filter must be active.

use crate::config::{load_credentials, ConfigSource};
use crate::error::{BibError, Result};
use crate::item::{ItemData, ZoteroItem};
use crate::zotero::ZoteroClient;
use serde::Serialize;
use std::io::{self, Write};
use tracing::info;

/// Search filters. Empty strings and an empty word list count as absent.
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    /// Substring of any creator's last name
    pub author: Option<String>,
    /// Exact publication year
    pub year: Option<i32>,
    /// Inclusive `(from, to)` year range
    pub year_range: Option<(i32, i32)>,
    /// Substring of the publication title
    pub journal: Option<String>,
    /// Words that must all appear in the title
    pub title_words: Vec<String>,
}

impl SearchFilters {
    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn year_range(mut self, from: i32, to: i32) -> Self {
        self.year_range = Some((from, to));
        self
    }

    pub fn journal(mut self, journal: impl Into<String>) -> Self {
        self.journal = Some(journal.into());
        self
    }

    pub fn title_word(mut self, word: impl Into<String>) -> Self {
        self.title_words.push(word.into());
        self
    }

    fn active_author(&self) -> Option<String> {
        non_empty_lower(self.author.as_deref())
    }

    fn active_journal(&self) -> Option<String> {
        non_empty_lower(self.journal.as_deref())
    }

    /// True when at least one filter would constrain the result.
    pub fn is_active(&self) -> bool {
        self.active_author().is_some()
            || self.year.is_some()
            || self.year_range.is_some()
            || self.active_journal().is_some()
            || !self.title_words.is_empty()
    }

    fn matches(&self, data: &ItemData) -> bool {
        if let Some(author) = self.active_author() {
            let found = data
                .creators
                .iter()
                .filter_map(|c| c.last_name.as_deref())
                .any(|last| last.to_lowercase().contains(&author));
            if !found {
                return false;
            }
        }

        if let Some(year) = self.year {
            if data.year() != Some(year) {
                return false;
            }
        }

        if let Some((from, to)) = self.year_range {
            match data.year() {
                Some(y) if from <= y && y <= to => {}
                _ => return false,
            }
        }

        if let Some(journal) = self.active_journal() {
            if !data.publication_title.to_lowercase().contains(&journal) {
                return false;
            }
        }

        if !self.title_words.is_empty() {
            let title = data.title.to_lowercase();
            if !self
                .title_words
                .iter()
                .all(|w| title.contains(&w.to_lowercase()))
            {
                return false;
            }
        }

        true
    }
}

fn non_empty_lower(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_lowercase)
}

/// Summary of one matching item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub key: String,
    pub title: String,
    /// Comma-separated last names
    pub authors: String,
    /// First four characters of the date
    pub year: String,
    pub journal: String,
}

impl SearchHit {
    fn from_item(item: &ZoteroItem) -> Self {
        let data = &item.data;
        Self {
            key: item.record_key().to_string(),
            title: data.title.clone(),
            authors: data
                .creators
                .iter()
                .filter_map(|c| c.last_name.as_deref())
                .collect::<Vec<_>>()
                .join(", "),
            year: data.year_prefix().to_string(),
            journal: data.publication_title.clone(),
        }
    }
}

/// Apply `filters` to `items`, preserving order. Untitled items never match.
pub fn filter_items(items: &[ZoteroItem], filters: &SearchFilters) -> Result<Vec<SearchHit>> {
    if !filters.is_active() {
        return Err(BibError::MissingFilter);
    }

    Ok(items
        .iter()
        .filter(|item| item.data.has_title() && filters.matches(&item.data))
        .map(SearchHit::from_item)
        .collect())
}

/// Write a human-readable block per hit.
pub fn write_hits<W: Write>(out: &mut W, hits: &[SearchHit]) -> io::Result<()> {
    if hits.is_empty() {
        return writeln!(out, "No matching items found.");
    }

    for hit in hits {
        writeln!(out, "{}: {}", hit.key, hit.title)?;
        writeln!(out, "  Authors: {}", hit.authors)?;
        writeln!(out, "  Year: {}", hit.year)?;
        writeln!(out, "  Journal: {}", hit.journal)?;
        writeln!(out)?;
    }
    Ok(())
}

/// Where a search gets its candidate items from
#[derive(Debug, Clone)]
pub enum ItemSource {
    /// Items already in memory
    Items(Vec<ZoteroItem>),
    /// Fetch the whole library from the Zotero API first
    Library {
        config: ConfigSource,
        page_size: usize,
        /// API host override; `None` uses the public Zotero API
        base_url: Option<String>,
    },
}

/// Search items, print the matches to stdout, and return them.
///
/// With [`ItemSource::Library`] this loads credentials and fetches the complete
/// library before filtering. Filters are validated before any network access.
pub async fn search_bibliography(source: ItemSource, filters: &SearchFilters) -> Result<Vec<SearchHit>> {
    if !filters.is_active() {
        return Err(BibError::MissingFilter);
    }

    let items = match source {
        ItemSource::Items(items) => items,
        ItemSource::Library {
            config,
            page_size,
            base_url,
        } => {
            let credentials = load_credentials(&config)?;
            let mut client = ZoteroClient::new(credentials, page_size)?;
            if let Some(base_url) = base_url {
                client = client.with_base_url(&base_url)?;
            }
            client.fetch_items().await?
        }
    };

    let hits = filter_items(&items, filters)?;
    info!(candidates = items.len(), matches = hits.len(), "Search complete");

    let stdout = io::stdout();
    write_hits(&mut stdout.lock(), &hits)?;
    Ok(hits)
}
