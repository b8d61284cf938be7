//! Zotero JSON to BibTeX conversion.
//!
//! Conversion never fails: missing fields become empty strings and untitled
//! items are skipped.

use crate::item::{Creator, ZoteroItem};
use std::fmt;

/// Zotero item types with a dedicated BibTeX entry type.
const ENTRY_KINDS: &[(&str, &str)] = &[
    ("journalArticle", "article"),
    ("book", "book"),
    ("conferencePaper", "inproceedings"),
    ("thesis", "phdthesis"),
    ("webpage", "misc"),
    ("report", "techreport"),
];

/// Entry type used for anything not in the table
const DEFAULT_ENTRY_KIND: &str = "misc";

/// Map a Zotero `itemType` to a BibTeX entry type.
pub fn entry_kind(item_type: &str) -> &'static str {
    ENTRY_KINDS
        .iter()
        .find(|(zotero, _)| *zotero == item_type)
        .map(|(_, kind)| *kind)
        .unwrap_or(DEFAULT_ENTRY_KIND)
}

/// One BibTeX entry derived from a Zotero item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibtexEntry {
    pub key: String,
    pub kind: &'static str,
    pub author: String,
    pub journal: String,
    pub title: String,
    pub year: String,
}

impl BibtexEntry {
    /// Convert an item, or `None` if it has no title.
    pub fn from_item(item: &ZoteroItem) -> Option<Self> {
        let data = &item.data;
        if !data.has_title() {
            return None;
        }

        Some(Self {
            key: item.record_key().to_string(),
            kind: entry_kind(&data.item_type),
            author: format_authors(&data.creators),
            journal: data.publication_title.clone(),
            title: data.title.clone(),
            year: data.year_prefix().to_string(),
        })
    }
}

impl fmt::Display for BibtexEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "@{}{{{},", self.kind, self.key)?;
        writeln!(f, " author = {{{}}},", self.author)?;
        writeln!(f, " journal = {{{}}},", self.journal)?;
        writeln!(f, " title = {{{}}},", self.title)?;
        writeln!(f, " year = {{{}}}", self.year)?;
        write!(f, "}}")
    }
}

/// `"Last, First and Last, First"` for creators that have both name parts.
fn format_authors(creators: &[Creator]) -> String {
    creators
        .iter()
        .filter_map(|c| match (&c.last_name, &c.first_name) {
            (Some(last), Some(first)) => Some(format!("{}, {}", last, first)),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(" and ")
}

/// Convert items to BibTeX entries, dropping untitled ones.
pub fn items_to_entries(items: &[ZoteroItem]) -> Vec<BibtexEntry> {
    items.iter().filter_map(BibtexEntry::from_item).collect()
}

/// Render entries as a BibTeX document, separated by blank lines.
pub fn render_entries(entries: &[BibtexEntry]) -> String {
    if entries.is_empty() {
        return String::new();
    }

    let mut out = entries
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n\n");
    out.push('\n');
    out
}

/// Render items as a BibTeX document, entries in input order.
pub fn items_to_bibtex(items: &[ZoteroItem]) -> String {
    render_entries(&items_to_entries(items))
}
