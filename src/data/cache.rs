use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::error::PipelineError;
use super::loader::load_file;
use super::model::Table;

/// Memoised [`load_file`] keyed by canonical source path.
///
/// Failed loads are not cached, so a fixed file can be retried.
#[derive(Debug, Default)]
pub struct SourceCache {
    tables: HashMap<PathBuf, Arc<Table>>,
}

impl SourceCache {
    pub fn load(&mut self, path: &Path) -> Result<Arc<Table>, PipelineError> {
        let key = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        if let Some(table) = self.tables.get(&key) {
            log::debug!("Using cached table for {}", key.display());
            return Ok(Arc::clone(table));
        }

        let table = Arc::new(load_file(path)?);
        log::info!(
            "Loaded {} records with columns {:?} from {}",
            table.len(),
            table.columns(),
            key.display()
        );
        self.tables.insert(key, Arc::clone(&table));
        Ok(table)
    }

    /// Drop a cached table so the next `load` re-reads the source.
    pub fn invalidate(&mut self, path: &Path) {
        let key = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        self.tables.remove(&key);
    }
}
