use std::path::{Path, PathBuf};

use async_trait::async_trait;
use calamine::{open_workbook_auto, Data, Reader};
use tracing::debug;
use valprop_core::document::{DocumentError, DocumentSource, Table};

#[derive(Clone, Debug, Default)]
pub struct SpreadsheetSource;

impl SpreadsheetSource {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentSource for SpreadsheetSource {
    async fn load_table(&self, dataset: &Path) -> Result<Table, DocumentError> {
        let path = dataset.to_path_buf();
        let worker_path = path.clone();
        let table = tokio::task::spawn_blocking(move || read_first_sheet(&worker_path))
            .await
            .map_err(|error| DocumentError::Unreadable { path, message: error.to_string() })??;

        debug!(
            event_name = "documents.table_loaded",
            dataset = %dataset.display(),
            columns = table.columns.len(),
            rows = table.len(),
            "reference dataset loaded"
        );
        Ok(table)
    }
}

pub(crate) fn read_first_sheet(path: &Path) -> Result<Table, DocumentError> {
    if !path.exists() {
        return Err(DocumentError::NotFound(path.to_path_buf()));
    }

    let mut workbook = open_workbook_auto(path).map_err(|error| unreadable(path, error))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| malformed(path, "workbook has no worksheets"))?
        .map_err(|error| unreadable(path, error))?;

    let mut rows = range.rows();
    let header = rows.next().ok_or_else(|| malformed(path, "first worksheet is empty"))?;
    let columns = header.iter().map(cell_text).collect::<Vec<_>>();
    if columns.iter().all(|column| column.is_empty()) {
        return Err(malformed(path, "header row has no column names"));
    }

    let rows = rows
        .map(|row| row.iter().map(cell_text).collect::<Vec<_>>())
        .filter(|row| row.iter().any(|cell| !cell.is_empty()))
        .collect();

    Ok(Table::new(columns, rows))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

fn unreadable(path: &Path, error: impl std::fmt::Display) -> DocumentError {
    DocumentError::Unreadable { path: PathBuf::from(path), message: error.to_string() }
}

fn malformed(path: &Path, message: &str) -> DocumentError {
    DocumentError::Malformed { path: PathBuf::from(path), message: message.to_string() }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use calamine::Data;
    use tempfile::TempDir;
    use valprop_core::document::DocumentError;

    use super::{cell_text, read_first_sheet};

    #[test]
    fn missing_file_is_not_found() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("angels.xlsx");
        assert_eq!(read_first_sheet(&path), Err(DocumentError::NotFound(path)));
    }

    #[test]
    fn corrupt_workbook_is_unreadable() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("angels.xlsx");
        fs::write(&path, b"definitely not a zip archive").expect("write fixture");

        let error = read_first_sheet(&path).expect_err("corrupt workbook should fail");
        assert!(matches!(error, DocumentError::Unreadable { .. }), "got {error:?}");
    }

    #[test]
    fn cells_render_as_trimmed_text() {
        assert_eq!(cell_text(&Data::Empty), "");
        assert_eq!(cell_text(&Data::String("  Berlin ".to_string())), "Berlin");
        assert_eq!(cell_text(&Data::Int(42)), "42");
    }
}
