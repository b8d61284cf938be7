//! CSV data loading.

use crate::error::{BibError, Result};
use std::path::Path;
use tracing::debug;

/// A loaded CSV file: header row plus data rows as strings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl DataTable {
    /// Values of the named column, if it exists.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.headers.iter().position(|h| h == name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(idx).map(String::as_str).unwrap_or(""))
                .collect(),
        )
    }
}

/// Load a CSV file with a header row.
///
/// A missing file yields [`BibError::DataNotFound`]; any other failure is
/// reported as [`BibError::DataLoad`] with the underlying reason.
pub fn load_csv(path: &Path) -> Result<DataTable> {
    let load_err = |reason: String| BibError::DataLoad {
        path: path.to_path_buf(),
        reason,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| match e.kind() {
            csv::ErrorKind::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
                BibError::DataNotFound(path.to_path_buf())
            }
            _ => load_err(e.to_string()),
        })?;

    let headers = reader
        .headers()
        .map_err(|e| load_err(e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();

    let rows = reader
        .records()
        .map(|record| {
            record
                .map(|r| r.iter().map(str::to_string).collect())
                .map_err(|e| load_err(e.to_string()))
        })
        .collect::<Result<Vec<Vec<String>>>>()?;

    debug!(path = %path.display(), rows = rows.len(), "Loaded CSV");
    Ok(DataTable { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(content: &str) -> std::io::Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        file.write_all(content.as_bytes())?;
        file.flush()?;
        Ok(file)
    }

    #[test]
    fn test_load_csv() -> Result<()> {
        let file = csv_file("country,cases\nKenya,12\nPeru,7\n")?;
        let table = load_csv(file.path())?;
        assert_eq!(table.headers, vec!["country", "cases"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.column("cases"), Some(vec!["12", "7"]));
        assert_eq!(table.column("deaths"), None);
        Ok(())
    }

    #[test]
    fn test_missing_file() {
        let result = load_csv(Path::new("/nonexistent/data.csv"));
        assert!(matches!(result, Err(BibError::DataNotFound(_))));
    }

    #[test]
    fn test_directory_is_a_load_error() -> Result<()> {
        let dir = tempfile::TempDir::new()?;
        let result = load_csv(dir.path());
        assert!(matches!(result, Err(BibError::DataLoad { .. })));
        Ok(())
    }

    #[test]
    fn test_ragged_rows_are_load_errors() -> Result<()> {
        let file = csv_file("a,b\n1,2\n3\n")?;
        let err = load_csv(file.path()).unwrap_err();
        assert!(matches!(err, BibError::DataLoad { .. }));
        assert!(err.to_string().starts_with("Error loading "));
        Ok(())
    }
}
