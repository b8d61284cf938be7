//! Search over a local BibTeX file.
//!
//! Fields are compared as raw text: author and journal by case-insensitive
//! substring, year by exact string equality.

use crate::error::{BibError, Result};
use biblatex::{Bibliography, Chunk, Entry, Spanned};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

/// Database searched when none is supplied
pub const DEFAULT_BIB_PATH: &str = "references.bib";

/// Start of an entry (`@article{`, `@string{`, ...) at the beginning of a line
static ENTRY_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^@[a-zA-Z]").expect("entry start pattern is valid"));

/// Read and parse a BibTeX file.
pub fn load_bibliography(path: &Path) -> Result<Bibliography> {
    let content = std::fs::read_to_string(path)?;
    let bibliography = parse_bibliography(&content, path)?;
    debug!(path = %path.display(), entries = bibliography.len(), "Loaded BibTeX database");
    Ok(bibliography)
}

/// Parse BibTeX text; `path` is only used in error messages.
///
/// When the whole text does not parse (an unknown `@string` abbreviation, a
/// stray brace), each entry is parsed on its own and the broken ones are
/// skipped. Fails only if no entry can be recovered.
pub fn parse_bibliography(content: &str, path: &Path) -> Result<Bibliography> {
    let whole_err = match Bibliography::parse(content) {
        Ok(bibliography) => return Ok(bibliography),
        Err(e) => e.to_string(),
    };
    debug!(path = %path.display(), error = %whole_err, "Falling back to per-entry BibTeX parsing");

    let starts: Vec<usize> = ENTRY_START.find_iter(content).map(|m| m.start()).collect();
    let mut recovered = Bibliography::new();

    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(content.len());
        let chunk = &content[start..end];

        match Bibliography::parse(chunk) {
            Ok(bib) => {
                for entry in bib.into_iter() {
                    recovered.insert(entry);
                }
            }
            Err(e) => {
                let head = chunk.lines().next().unwrap_or_default();
                debug!(entry = head, error = %e, "Skipping unparsable BibTeX entry");
            }
        }
    }

    if recovered.is_empty() {
        return Err(BibError::BibtexParse {
            path: path.to_path_buf(),
            reason: whole_err,
        });
    }
    Ok(recovered)
}

/// Filters for local search. Absent or empty filters are skipped.
#[derive(Debug, Clone, Default)]
pub struct LocalFilters {
    pub author: Option<String>,
    pub year: Option<String>,
    pub journal: Option<String>,
    pub title_words: Vec<String>,
}

impl LocalFilters {
    fn matches(&self, entry: &Entry) -> bool {
        if let Some(author) = non_empty(&self.author) {
            if !contains_ignore_case(&field_text(entry, "author"), author) {
                return false;
            }
        }

        if let Some(year) = non_empty(&self.year) {
            if field_text(entry, "year") != year {
                return false;
            }
        }

        if let Some(journal) = non_empty(&self.journal) {
            if !contains_ignore_case(&field_text(entry, "journal"), journal) {
                return false;
            }
        }

        if !self.title_words.is_empty() {
            let title = field_text(entry, "title");
            if !self
                .title_words
                .iter()
                .all(|w| contains_ignore_case(&title, w))
            {
                return false;
            }
        }

        true
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Raw text of a field, or an empty string when the entry lacks it.
pub fn field_text(entry: &Entry, field: &str) -> String {
    entry.get(field).map(chunks_to_string).unwrap_or_default()
}

fn chunks_to_string(chunks: &[Spanned<Chunk>]) -> String {
    chunks
        .iter()
        .map(|c| match &c.v {
            Chunk::Normal(s) => s.as_str(),
            Chunk::Verbatim(s) => s.as_str(),
            Chunk::Math(s) => s.as_str(),
        })
        .collect::<Vec<_>>()
        .join("")
}

/// Entries of `bibliography` matching every filter, in file order.
pub fn filter_entries<'a>(bibliography: &'a Bibliography, filters: &LocalFilters) -> Vec<&'a Entry> {
    bibliography
        .iter()
        .filter(|entry| filters.matches(entry))
        .collect()
}

/// Search `bibliography`, or the file at [`DEFAULT_BIB_PATH`] when `None`.
pub fn search_bibtex(bibliography: Option<&Bibliography>, filters: &LocalFilters) -> Result<Vec<Entry>> {
    search_bibtex_or_load(bibliography, Path::new(DEFAULT_BIB_PATH), filters)
}

/// Search `bibliography`, or the file at `default_path` when `None`.
pub fn search_bibtex_or_load(
    bibliography: Option<&Bibliography>,
    default_path: &Path,
    filters: &LocalFilters,
) -> Result<Vec<Entry>> {
    let loaded;
    let bibliography = match bibliography {
        Some(bib) => bib,
        None => {
            loaded = load_bibliography(default_path)?;
            &loaded
        }
    };

    Ok(filter_entries(bibliography, filters)
        .into_iter()
        .cloned()
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const DATABASE: &str = r#"
@article{smith2019,
  author = {Smith, Anna and Jones, Bo},
  title = {Measles outbreaks in {Europe}},
  journal = {Eurosurveillance},
  year = {2019}
}

@book{brown2020,
  author = {Brown, Eve},
  title = {Vaccines and measles},
  publisher = {Academic Press},
  year = {2020}
}

@article{lee2019,
  author = {Lee, Min},
  title = {Malaria in the highlands},
  journal = {Malaria Journal},
  year = {2019}
}
"#;

    fn database() -> Result<Bibliography> {
        Bibliography::parse(DATABASE).map_err(|e| BibError::BibtexParse {
            path: "inline".into(),
            reason: e.to_string(),
        })
    }

    fn keys(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(|e| e.key.as_str()).collect()
    }

    #[test]
    fn test_no_filters_returns_everything_in_order() -> Result<()> {
        let bib = database()?;
        let results = search_bibtex(Some(&bib), &LocalFilters::default())?;
        assert_eq!(keys(&results), vec!["smith2019", "brown2020", "lee2019"]);
        Ok(())
    }

    #[test]
    fn test_author_substring_over_full_author_field() -> Result<()> {
        let bib = database()?;
        let filters = LocalFilters {
            author: Some("anna".to_string()),
            ..Default::default()
        };
        assert_eq!(keys(&search_bibtex(Some(&bib), &filters)?), vec!["smith2019"]);
        Ok(())
    }

    #[test]
    fn test_year_is_exact_string_match() -> Result<()> {
        let bib = database()?;
        let filters = LocalFilters {
            year: Some("2019".to_string()),
            ..Default::default()
        };
        assert_eq!(keys(&search_bibtex(Some(&bib), &filters)?), vec!["smith2019", "lee2019"]);

        let filters = LocalFilters {
            year: Some("201".to_string()),
            ..Default::default()
        };
        assert!(search_bibtex(Some(&bib), &filters)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_missing_journal_never_matches_journal_filter() -> Result<()> {
        let bib = database()?;
        let filters = LocalFilters {
            journal: Some("JOURNAL".to_string()),
            ..Default::default()
        };
        assert_eq!(keys(&search_bibtex(Some(&bib), &filters)?), vec!["lee2019"]);
        Ok(())
    }

    #[test]
    fn test_title_words_and_conjunction() -> Result<()> {
        let bib = database()?;
        let filters = LocalFilters {
            title_words: vec!["measles".to_string(), "europe".to_string()],
            ..Default::default()
        };
        assert_eq!(keys(&search_bibtex(Some(&bib), &filters)?), vec!["smith2019"]);

        let filters = LocalFilters {
            year: Some("2020".to_string()),
            title_words: vec!["measles".to_string()],
            ..Default::default()
        };
        assert_eq!(keys(&search_bibtex(Some(&bib), &filters)?), vec!["brown2020"]);
        Ok(())
    }

    #[test]
    fn test_field_text() -> Result<()> {
        let bib = database()?;
        let entry = bib.get("smith2019").expect("entry present");
        assert_eq!(field_text(entry, "title"), "Measles outbreaks in Europe");
        assert_eq!(field_text(entry, "doi"), "");
        Ok(())
    }

    #[test]
    fn test_load_bibliography_from_file() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        file.write_all(DATABASE.as_bytes())?;
        file.flush()?;

        let bib = load_bibliography(file.path())?;
        assert_eq!(bib.len(), 3);
        Ok(())
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_bibliography(Path::new("/nonexistent/references.bib"));
        assert!(matches!(result, Err(BibError::Io(_))));
    }

    #[test]
    fn test_unknown_abbreviation_skips_only_that_entry() -> Result<()> {
        let content = "@article{a,\n  title = {Broken},\n  journal = JAMA,\n  year = {2018}\n}\n\
                       @article{b,\n  title = {Intact},\n  journal = {Lancet},\n  year = {2018}\n}\n";
        let bib = parse_bibliography(content, Path::new("export.bib"))?;
        assert_eq!(bib.len(), 1);

        let filters = LocalFilters {
            journal: Some("lancet".to_string()),
            ..Default::default()
        };
        assert_eq!(keys(&search_bibtex(Some(&bib), &filters)?), vec!["b"]);
        Ok(())
    }

    #[test]
    fn test_nothing_recoverable_is_a_parse_error() {
        let result = parse_bibliography("@article{a,\n  journal = JAMA\n}\n", Path::new("bad.bib"));
        assert!(matches!(result, Err(BibError::BibtexParse { .. })));
    }

    #[test]
    fn test_missing_database_loads_default_path() -> Result<()> {
        let dir = tempfile::TempDir::new()?;
        let default_path = dir.path().join(DEFAULT_BIB_PATH);
        std::fs::write(&default_path, DATABASE)?;

        let filters = LocalFilters {
            author: Some("brown".to_string()),
            ..Default::default()
        };
        let results = search_bibtex_or_load(None, &default_path, &filters)?;
        assert_eq!(keys(&results), vec!["brown2020"]);

        let missing = search_bibtex_or_load(None, &dir.path().join("absent.bib"), &filters);
        assert!(matches!(missing, Err(BibError::Io(_))));
        Ok(())
    }
}
