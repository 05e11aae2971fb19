use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use valprop_core::document::{DocumentError, DocumentSource, Table};

#[derive(Default)]
pub struct InMemoryDocumentSource {
    tables: RwLock<HashMap<PathBuf, Table>>,
    loads: AtomicUsize,
}

impl InMemoryDocumentSource {
    pub fn with_table(dataset: impl Into<PathBuf>, table: Table) -> Self {
        let mut tables = HashMap::new();
        tables.insert(dataset.into(), table);
        Self { tables: RwLock::new(tables), loads: AtomicUsize::new(0) }
    }

    pub async fn insert(&self, dataset: impl Into<PathBuf>, table: Table) {
        self.tables.write().await.insert(dataset.into(), table);
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentSource for InMemoryDocumentSource {
    async fn load_table(&self, dataset: &Path) -> Result<Table, DocumentError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let tables = self.tables.read().await;
        tables.get(dataset).cloned().ok_or_else(|| DocumentError::NotFound(dataset.to_path_buf()))
    }
}
