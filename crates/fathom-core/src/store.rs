//! The storage seam: everything the project coordinator persists goes
//! through [`StorageBackend`]. The in-memory backend is the default; the
//! SQLite backend provides durability behind the same trait.

use serde::{Deserialize, Serialize};

use crate::graph::ScopeGraph;

/// What the cache persists for one file. The parsed CST is deliberately
/// absent: trees are rebuilt from source on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub source: String,
    /// Registered language name, `None` when the extension is unknown.
    pub language: Option<String>,
    pub content_hash: u64,
}

/// Errors surfaced by storage backends. The only failure kind that aborts
/// a mutating project operation.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("transaction already finished")]
    TransactionFinished,

    #[error("backend closed")]
    Closed,
}

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        StorageError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialization(e.to_string())
    }
}

/// A serializable unit of change. Changes become visible only on commit;
/// rollback discards them.
pub trait StorageTransaction {
    fn get_state(&self) -> Result<Option<serde_json::Value>, StorageError>;
    fn set_state(&mut self, state: serde_json::Value) -> Result<(), StorageError>;
    fn update_file(
        &mut self,
        path: &str,
        cache: &FileRecord,
        graph: Option<&ScopeGraph>,
    ) -> Result<(), StorageError>;
    fn remove_file(&mut self, path: &str) -> Result<(), StorageError>;
    fn commit(self: Box<Self>) -> Result<(), StorageError>;
    fn rollback(self: Box<Self>) -> Result<(), StorageError>;
}

/// Pluggable persistence for file caches and scope graphs.
pub trait StorageBackend: Send + Sync {
    fn initialize(&self) -> Result<(), StorageError>;
    fn get_state(&self) -> Result<Option<serde_json::Value>, StorageError>;
    fn set_state(&self, state: serde_json::Value) -> Result<(), StorageError>;
    fn begin_transaction(&self)
        -> Result<Box<dyn StorageTransaction + '_>, StorageError>;
    fn get_file_cache(&self, path: &str) -> Result<Option<FileRecord>, StorageError>;
    fn get_file_graph(&self, path: &str) -> Result<Option<ScopeGraph>, StorageError>;
    fn update_file(
        &self,
        path: &str,
        cache: &FileRecord,
        graph: Option<&ScopeGraph>,
    ) -> Result<(), StorageError>;
    fn remove_file(&self, path: &str) -> Result<(), StorageError>;
    fn get_file_paths(&self) -> Result<Vec<String>, StorageError>;
    fn has_file(&self, path: &str) -> Result<bool, StorageError>;
    fn clear(&self) -> Result<(), StorageError>;
    fn close(&self) -> Result<(), StorageError>;
}
