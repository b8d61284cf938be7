//! Zotero web API client.
//!
//! Fetches a complete user library by walking `GET /users/{id}/items` one page
//! at a time. Pages are requested sequentially; the first failed request aborts
//! the whole fetch and nothing accumulated so far is returned.

use crate::bibtex;
use crate::config::ZoteroCredentials;
use crate::error::{BibError, Result};
use crate::item::ZoteroItem;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Zotero API base URL
pub const ZOTERO_API_URL: &str = "https://api.zotero.org";

/// Items per request (the API maximum)
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Header carrying the API key
const API_KEY_HEADER: &str = "Zotero-API-Key";

/// Start of a BibTeX entry: `@type{` or `@type(` at the beginning of a line
static ENTRY_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*@[A-Za-z]+[ \t]*[{(]").expect("entry marker pattern is valid")
});

/// Paginated Zotero API client for one user library
pub struct ZoteroClient {
    client: reqwest::Client,
    items_url: Url,
    credentials: ZoteroCredentials,
    page_size: usize,
}

impl ZoteroClient {
    /// Create a new ZoteroClient
    ///
    /// # Arguments
    ///
    /// * `credentials` - Zotero user id and API key, both non-empty
    /// * `page_size` - Items requested per page, must be positive
    pub fn new(credentials: ZoteroCredentials, page_size: usize) -> Result<Self> {
        if credentials.username.trim().is_empty() {
            return Err(BibError::Validation("Zotero user id is empty".to_string()));
        }
        if credentials.api_key.trim().is_empty() {
            return Err(BibError::Validation("Zotero API key is empty".to_string()));
        }
        if page_size == 0 {
            return Err(BibError::Validation("page size must be positive".to_string()));
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!("zotero-bib/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| BibError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let items_url = build_items_url(ZOTERO_API_URL, &credentials.username)?;

        Ok(Self {
            client,
            items_url,
            credentials,
            page_size,
        })
    }

    /// Point the client at another API host (mirrors, test servers).
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        self.items_url = build_items_url(base_url, &self.credentials.username)?;
        Ok(self)
    }

    /// Fetch every titled item in the library as JSON.
    ///
    /// Attachments and notes carry no title and are dropped. Whether a page is
    /// the last one is decided on its raw length, before dropping.
    pub async fn fetch_items(&self) -> Result<Vec<ZoteroItem>> {
        info!(user = %self.credentials.username, limit = self.page_size, "Fetching Zotero items");

        let mut all_items = Vec::new();
        let mut start = 0;

        loop {
            let body = self.get_page("json", start).await?;
            let page: Vec<ZoteroItem> = serde_json::from_str(&body)?;
            let page_len = page.len();
            debug!(start = start, count = page_len, "Fetched Zotero page");

            all_items.extend(page.into_iter().filter(|item| item.data.has_title()));

            // A short page is the last one; an empty page ends it too.
            if page_len < self.page_size {
                break;
            }
            start += self.page_size;
        }

        info!(total = all_items.len(), "Zotero fetch complete");
        Ok(all_items)
    }

    /// Fetch the library as bibliography text (`format=bib`).
    ///
    /// Pages are trimmed and joined with blank lines. Fetching stops at an empty
    /// page, or once a page holds fewer entry markers than the page size.
    pub async fn fetch_bibliography_text(&self) -> Result<String> {
        info!(user = %self.credentials.username, limit = self.page_size, "Fetching Zotero bibliography");

        let mut all_text = String::new();
        let mut start = 0;

        loop {
            let body = self.get_page("bib", start).await?;
            let batch = body.trim();
            if batch.is_empty() {
                break;
            }

            all_text.push_str(batch);
            all_text.push_str("\n\n");

            let entries = count_entry_markers(batch);
            debug!(start = start, entries = entries, "Fetched Zotero bibliography page");
            if entries < self.page_size {
                break;
            }
            start += self.page_size;
        }

        info!(bytes = all_text.len(), "Zotero bibliography fetch complete");
        Ok(all_text)
    }

    /// Fetch bibliography text and write it to `path`.
    pub async fn save_bibliography_text(&self, path: &Path) -> Result<()> {
        let text = self.fetch_bibliography_text().await?;
        std::fs::write(path, text)?;
        info!(path = %path.display(), "Saved bibliography text");
        Ok(())
    }

    /// Fetch titled items, write them to `path` as a JSON array, and return them.
    pub async fn save_records_json(&self, path: &Path) -> Result<Vec<ZoteroItem>> {
        let items = self.fetch_items().await?;
        let content = serde_json::to_string(&items)?;
        std::fs::write(path, content)?;
        info!(path = %path.display(), count = items.len(), "Saved Zotero items");
        Ok(items)
    }

    /// Fetch JSON items, convert them to BibTeX, and write the result to `path`.
    ///
    /// Returns the number of entries written.
    pub async fn save_bibtex(&self, path: &Path) -> Result<usize> {
        let items = self.fetch_items().await?;
        let entries = bibtex::items_to_entries(&items);
        std::fs::write(path, bibtex::render_entries(&entries))?;
        info!(path = %path.display(), entries = entries.len(), "Saved BibTeX");
        Ok(entries.len())
    }

    /// Request one page and return its body.
    async fn get_page(&self, format: &str, start: usize) -> Result<String> {
        let response = self
            .client
            .get(self.items_url.clone())
            .header(API_KEY_HEADER, &self.credentials.api_key)
            .query(&[
                ("format", format.to_string()),
                ("limit", self.page_size.to_string()),
                ("start", start.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BibError::Http {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }

        Ok(response.text().await?)
    }
}

/// Load items previously written by [`ZoteroClient::save_records_json`].
pub fn load_items_from_file(path: &Path) -> Result<Vec<ZoteroItem>> {
    let content = std::fs::read_to_string(path)?;
    let items: Vec<ZoteroItem> = serde_json::from_str(&content)?;
    debug!(path = %path.display(), count = items.len(), "Loaded Zotero items");
    Ok(items)
}

/// Count BibTeX entries in `text` by their `@type{` headers.
///
/// `@` characters inside field values (e-mail addresses, handles) are not
/// counted.
pub fn count_entry_markers(text: &str) -> usize {
    ENTRY_MARKER.find_iter(text).count()
}

fn build_items_url(base_url: &str, user_id: &str) -> Result<Url> {
    let base = format!("{}/", base_url.trim_end_matches('/'));
    Url::parse(&base)
        .and_then(|url| url.join(&format!("users/{}/items", user_id)))
        .map_err(|e| BibError::Validation(format!("Invalid API URL {}: {}", base_url, e)))
}
