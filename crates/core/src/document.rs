use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Rows of string cells under named columns.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("dataset `{}` was not found", .0.display())]
    NotFound(PathBuf),
    #[error("dataset `{}` could not be read: {message}", .path.display())]
    Unreadable { path: PathBuf, message: String },
    #[error("dataset `{}` is malformed: {message}", .path.display())]
    Malformed { path: PathBuf, message: String },
}

/// Loads tabular reference data keyed by a dataset path.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn load_table(&self, dataset: &Path) -> Result<Table, DocumentError>;
}
