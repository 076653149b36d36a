//! Default in-memory storage backend. Transactions stage their changes and
//! apply them to the shared state on commit.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::graph::ScopeGraph;
use crate::store::{FileRecord, StorageBackend, StorageError, StorageTransaction};

#[derive(Default)]
struct MemoryState {
    files: HashMap<String, (FileRecord, Option<ScopeGraph>)>,
    state: Option<serde_json::Value>,
    closed: bool,
}

/// In-memory [`StorageBackend`]; the project default.
#[derive(Default)]
pub struct InMemoryBackend {
    inner: Mutex<MemoryState>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StorageError> {
        let guard = self
            .inner
            .lock()
            .map_err(|_| StorageError::Database("poisoned lock".into()))?;
        if guard.closed {
            return Err(StorageError::Closed);
        }
        Ok(guard)
    }
}

impl StorageBackend for InMemoryBackend {
    fn initialize(&self) -> Result<(), StorageError> {
        self.lock().map(|_| ())
    }

    fn get_state(&self) -> Result<Option<serde_json::Value>, StorageError> {
        Ok(self.lock()?.state.clone())
    }

    fn set_state(&self, state: serde_json::Value) -> Result<(), StorageError> {
        self.lock()?.state = Some(state);
        Ok(())
    }

    fn begin_transaction(
        &self,
    ) -> Result<Box<dyn StorageTransaction + '_>, StorageError> {
        // Fail early if the backend is closed.
        self.lock()?;
        Ok(Box::new(MemoryTransaction {
            backend: self,
            staged: Vec::new(),
            staged_state: None,
            finished: false,
        }))
    }

    fn get_file_cache(&self, path: &str) -> Result<Option<FileRecord>, StorageError> {
        Ok(self.lock()?.files.get(path).map(|(c, _)| c.clone()))
    }

    fn get_file_graph(&self, path: &str) -> Result<Option<ScopeGraph>, StorageError> {
        Ok(self.lock()?.files.get(path).and_then(|(_, g)| g.clone()))
    }

    fn update_file(
        &self,
        path: &str,
        cache: &FileRecord,
        graph: Option<&ScopeGraph>,
    ) -> Result<(), StorageError> {
        self.lock()?
            .files
            .insert(path.to_string(), (cache.clone(), graph.cloned()));
        Ok(())
    }

    fn remove_file(&self, path: &str) -> Result<(), StorageError> {
        self.lock()?.files.remove(path);
        Ok(())
    }

    fn get_file_paths(&self) -> Result<Vec<String>, StorageError> {
        let mut paths: Vec<String> = self.lock()?.files.keys().cloned().collect();
        paths.sort();
        Ok(paths)
    }

    fn has_file(&self, path: &str) -> Result<bool, StorageError> {
        Ok(self.lock()?.files.contains_key(path))
    }

    fn clear(&self) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        guard.files.clear();
        guard.state = None;
        Ok(())
    }

    fn close(&self) -> Result<(), StorageError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| StorageError::Database("poisoned lock".into()))?;
        guard.closed = true;
        Ok(())
    }
}

enum StagedChange {
    Update(String, FileRecord, Option<ScopeGraph>),
    Remove(String),
}

struct MemoryTransaction<'a> {
    backend: &'a InMemoryBackend,
    staged: Vec<StagedChange>,
    staged_state: Option<serde_json::Value>,
    finished: bool,
}

impl MemoryTransaction<'_> {
    fn check_open(&self) -> Result<(), StorageError> {
        if self.finished {
            Err(StorageError::TransactionFinished)
        } else {
            Ok(())
        }
    }
}

impl StorageTransaction for MemoryTransaction<'_> {
    fn get_state(&self) -> Result<Option<serde_json::Value>, StorageError> {
        self.check_open()?;
        if self.staged_state.is_some() {
            return Ok(self.staged_state.clone());
        }
        self.backend.get_state()
    }

    fn set_state(&mut self, state: serde_json::Value) -> Result<(), StorageError> {
        self.check_open()?;
        self.staged_state = Some(state);
        Ok(())
    }

    fn update_file(
        &mut self,
        path: &str,
        cache: &FileRecord,
        graph: Option<&ScopeGraph>,
    ) -> Result<(), StorageError> {
        self.check_open()?;
        self.staged.push(StagedChange::Update(
            path.to_string(),
            cache.clone(),
            graph.cloned(),
        ));
        Ok(())
    }

    fn remove_file(&mut self, path: &str) -> Result<(), StorageError> {
        self.check_open()?;
        self.staged.push(StagedChange::Remove(path.to_string()));
        Ok(())
    }

    fn commit(mut self: Box<Self>) -> Result<(), StorageError> {
        self.check_open()?;
        self.finished = true;
        let mut guard = self.backend.lock()?;
        for change in self.staged.drain(..) {
            match change {
                StagedChange::Update(path, cache, graph) => {
                    guard.files.insert(path, (cache, graph));
                }
                StagedChange::Remove(path) => {
                    guard.files.remove(&path);
                }
            }
        }
        if let Some(state) = self.staged_state.take() {
            guard.state = Some(state);
        }
        Ok(())
    }

    fn rollback(mut self: Box<Self>) -> Result<(), StorageError> {
        self.check_open()?;
        self.finished = true;
        self.staged.clear();
        self.staged_state = None;
        Ok(())
    }
}
