//! # zotero-bib
//!
//! Bibliography tooling for manuscript writing: fetch a Zotero library,
//! convert it to BibTeX, and search it or a local `.bib` file.
//!
//! ## Modules
//!
//! - [`zotero`] - Paginated Zotero web API client
//! - [`bibtex`] - Zotero JSON to BibTeX conversion
//! - [`search`] - Filtering of fetched Zotero items
//! - [`local`] - Filtering of a local BibTeX database
//! - [`config`] - Credential loading
//! - [`data`] - CSV loading
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use zotero_bib::config::{load_credentials, ConfigSource};
//! use zotero_bib::search::{filter_items, SearchFilters};
//! use zotero_bib::zotero::{ZoteroClient, DEFAULT_PAGE_SIZE};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let creds = load_credentials(&ConfigSource::File("config.yaml".into()))?;
//!     let items = ZoteroClient::new(creds, DEFAULT_PAGE_SIZE)?.fetch_items().await?;
//!     let hits = filter_items(&items, &SearchFilters::default().author("doe"))?;
//!     println!("Found {} matches", hits.len());
//!     Ok(())
//! }
//! ```

pub mod bibtex;
pub mod config;
pub mod data;
pub mod error;
pub mod item;
pub mod local;
pub mod search;
pub mod zotero;

pub use error::{BibError, Result};
