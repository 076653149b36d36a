//! SQLite-backed implementation of the storage traits. Holding the
//! connection behind a mutex means an open transaction blocks every other
//! backend call, which is exactly the serializable behavior the trait
//! promises.

use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};

use crate::graph::ScopeGraph;
use crate::store::{FileRecord, StorageBackend, StorageError, StorageTransaction};

const SCHEMA_VERSION: u32 = 1;

/// Disk-backed [`StorageBackend`] over SQLite.
pub struct SqliteBackend {
    conn: Mutex<Connection>,
}

impl SqliteBackend {
    /// Open or create a database at the given path.
    pub fn open(path: &str) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        let backend = SqliteBackend {
            conn: Mutex::new(conn),
        };
        backend.initialize()?;
        Ok(backend)
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let backend = SqliteBackend {
            conn: Mutex::new(conn),
        };
        backend.initialize()?;
        Ok(backend)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Database("poisoned lock".into()))
    }
}

fn write_file(
    conn: &Connection,
    path: &str,
    cache: &FileRecord,
    graph: Option<&ScopeGraph>,
) -> Result<(), StorageError> {
    let graph_json = match graph {
        Some(g) => Some(serde_json::to_string(g)?),
        None => None,
    };
    conn.execute(
        "INSERT INTO files (path, source, language, content_hash, graph)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(path) DO UPDATE SET
             source = excluded.source,
             language = excluded.language,
             content_hash = excluded.content_hash,
             graph = excluded.graph",
        params![
            path,
            cache.source,
            cache.language,
            cache.content_hash as i64,
            graph_json
        ],
    )?;
    Ok(())
}

fn write_state(conn: &Connection, state: &serde_json::Value) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO fathom_meta (key, value) VALUES ('state', ?1)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![serde_json::to_string(state)?],
    )?;
    Ok(())
}

fn read_state(conn: &Connection) -> Result<Option<serde_json::Value>, StorageError> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value FROM fathom_meta WHERE key = 'state'",
            [],
            |row| row.get(0),
        )
        .optional()?;
    match raw {
        Some(s) => Ok(Some(serde_json::from_str(&s)?)),
        None => Ok(None),
    }
}

impl StorageBackend for SqliteBackend {
    fn initialize(&self) -> Result<(), StorageError> {
        let conn = self.lock()?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS fathom_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS files (
                path TEXT PRIMARY KEY,
                source TEXT NOT NULL,
                language TEXT,
                content_hash INTEGER NOT NULL,
                graph TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_files_language ON files(language);
            ",
        )?;
        conn.execute(
            "INSERT INTO fathom_meta (key, value) VALUES ('schema_version', ?1)
             ON CONFLICT(key) DO NOTHING",
            params![SCHEMA_VERSION.to_string()],
        )?;
        Ok(())
    }

    fn get_state(&self) -> Result<Option<serde_json::Value>, StorageError> {
        let conn = self.lock()?;
        read_state(&conn)
    }

    fn set_state(&self, state: serde_json::Value) -> Result<(), StorageError> {
        let conn = self.lock()?;
        write_state(&conn, &state)
    }

    fn begin_transaction(
        &self,
    ) -> Result<Box<dyn StorageTransaction + '_>, StorageError> {
        let guard = self.lock()?;
        guard.execute_batch("BEGIN IMMEDIATE")?;
        Ok(Box::new(SqliteTransaction {
            guard,
            finished: false,
        }))
    }

    fn get_file_cache(&self, path: &str) -> Result<Option<FileRecord>, StorageError> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT source, language, content_hash FROM files WHERE path = ?1",
                params![path],
                |row| {
                    Ok(FileRecord {
                        source: row.get(0)?,
                        language: row.get(1)?,
                        content_hash: row.get::<_, i64>(2)? as u64,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    fn get_file_graph(&self, path: &str) -> Result<Option<ScopeGraph>, StorageError> {
        let conn = self.lock()?;
        let raw: Option<Option<String>> = conn
            .query_row(
                "SELECT graph FROM files WHERE path = ?1",
                params![path],
                |row| row.get(0),
            )
            .optional()?;
        match raw.flatten() {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn update_file(
        &self,
        path: &str,
        cache: &FileRecord,
        graph: Option<&ScopeGraph>,
    ) -> Result<(), StorageError> {
        let conn = self.lock()?;
        write_file(&conn, path, cache, graph)
    }

    fn remove_file(&self, path: &str) -> Result<(), StorageError> {
        self.lock()?
            .execute("DELETE FROM files WHERE path = ?1", params![path])?;
        Ok(())
    }

    fn get_file_paths(&self) -> Result<Vec<String>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT path FROM files ORDER BY path")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut paths = Vec::new();
        for row in rows {
            paths.push(row?);
        }
        Ok(paths)
    }

    fn has_file(&self, path: &str) -> Result<bool, StorageError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM files WHERE path = ?1",
            params![path],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn clear(&self) -> Result<(), StorageError> {
        let conn = self.lock()?;
        conn.execute_batch(
            "DELETE FROM files; DELETE FROM fathom_meta WHERE key = 'state';",
        )?;
        Ok(())
    }

    fn close(&self) -> Result<(), StorageError> {
        // rusqlite closes on drop; flush WAL state eagerly.
        self.lock()?.execute_batch("PRAGMA optimize")?;
        Ok(())
    }
}

struct SqliteTransaction<'a> {
    guard: MutexGuard<'a, Connection>,
    finished: bool,
}

impl SqliteTransaction<'_> {
    fn check_open(&self) -> Result<(), StorageError> {
        if self.finished {
            Err(StorageError::TransactionFinished)
        } else {
            Ok(())
        }
    }
}

impl StorageTransaction for SqliteTransaction<'_> {
    fn get_state(&self) -> Result<Option<serde_json::Value>, StorageError> {
        self.check_open()?;
        read_state(&self.guard)
    }

    fn set_state(&mut self, state: serde_json::Value) -> Result<(), StorageError> {
        self.check_open()?;
        write_state(&self.guard, &state)
    }

    fn update_file(
        &mut self,
        path: &str,
        cache: &FileRecord,
        graph: Option<&ScopeGraph>,
    ) -> Result<(), StorageError> {
        self.check_open()?;
        write_file(&self.guard, path, cache, graph)
    }

    fn remove_file(&mut self, path: &str) -> Result<(), StorageError> {
        self.check_open()?;
        self.guard
            .execute("DELETE FROM files WHERE path = ?1", params![path])?;
        Ok(())
    }

    fn commit(mut self: Box<Self>) -> Result<(), StorageError> {
        self.check_open()?;
        self.finished = true;
        self.guard.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(mut self: Box<Self>) -> Result<(), StorageError> {
        self.check_open()?;
        self.finished = true;
        self.guard.execute_batch("ROLLBACK")?;
        Ok(())
    }
}

impl Drop for SqliteTransaction<'_> {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.guard.execute_batch("ROLLBACK");
        }
    }
}
