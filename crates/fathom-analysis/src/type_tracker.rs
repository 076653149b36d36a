//! Variable→class tracking used to resolve method calls. All three trackers
//! are immutable values: every update returns a new instance and old
//! instances stay valid, so phase-1 results can be merged and shared across
//! workers without locks.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use fathom_core::symbol::SymbolId;
use fathom_core::types::Position;

/// A variable's inferred class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeInfo {
    pub class_name: String,
    /// Symbol id of the class definition, when it resolved.
    pub class_symbol: Option<SymbolId>,
    /// File the class is defined in.
    pub source_file: String,
}

/// File-level tracker: module-scope variable bindings, imported classes,
/// and the file's export names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileTypeTracker {
    /// Bindings ordered by discovery position; the latest binding at or
    /// before a lookup position wins.
    variable_types: HashMap<String, Vec<(Position, TypeInfo)>>,
    imported_classes: HashMap<String, TypeInfo>,
    exported_definitions: HashSet<String>,
}

impl FileTypeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_variable_type(&self, name: &str, pos: Position, info: TypeInfo) -> Self {
        let mut next = self.clone();
        let entries = next.variable_types.entry(name.to_string()).or_default();
        let at = entries.partition_point(|(p, _)| *p <= pos);
        entries.insert(at, (pos, info));
        next
    }

    pub fn with_imported_class(&self, local_name: &str, info: TypeInfo) -> Self {
        let mut next = self.clone();
        next.imported_classes.insert(local_name.to_string(), info);
        next
    }

    pub fn with_exported(&self, name: &str) -> Self {
        let mut next = self.clone();
        next.exported_definitions.insert(name.to_string());
        next
    }

    /// The latest binding at or before `at`; with no position, the latest
    /// binding overall.
    pub fn variable_type(&self, name: &str, at: Option<Position>) -> Option<&TypeInfo> {
        let entries = self.variable_types.get(name)?;
        match at {
            Some(pos) => entries
                .iter()
                .rev()
                .find(|(p, _)| *p <= pos)
                .map(|(_, info)| info),
            None => entries.last().map(|(_, info)| info),
        }
    }

    pub fn imported_class(&self, local_name: &str) -> Option<&TypeInfo> {
        self.imported_classes.get(local_name)
    }

    pub fn is_exported(&self, name: &str) -> bool {
        self.exported_definitions.contains(name)
    }
}

/// Function-level tracker layered over a shared file tracker. Locals win.
#[derive(Debug, Clone)]
pub struct LocalTypeTracker {
    parent: Arc<FileTypeTracker>,
    local_types: HashMap<String, Vec<(Position, TypeInfo)>>,
}

impl LocalTypeTracker {
    pub fn new(parent: Arc<FileTypeTracker>) -> Self {
        Self {
            parent,
            local_types: HashMap::new(),
        }
    }

    /// Bind a local variable to a class at a position, returning the
    /// extended tracker.
    pub fn bind(&self, name: &str, pos: Position, info: TypeInfo) -> Self {
        let mut next = self.clone();
        let entries = next.local_types.entry(name.to_string()).or_default();
        let at = entries.partition_point(|(p, _)| *p <= pos);
        entries.insert(at, (pos, info));
        next
    }

    /// Locals first, then the file tracker's variables, then its imports.
    pub fn lookup(&self, name: &str, at: Option<Position>) -> Option<&TypeInfo> {
        if let Some(entries) = self.local_types.get(name) {
            let hit = match at {
                Some(pos) => entries.iter().rev().find(|(p, _)| *p <= pos),
                None => entries.last(),
            };
            if let Some((_, info)) = hit {
                return Some(info);
            }
        }
        self.parent
            .variable_type(name, at)
            .or_else(|| self.parent.imported_class(name))
    }
}

/// Project-wide registry of exported class types, built in phase 2.
#[derive(Debug, Clone, Default)]
pub struct ProjectTypeRegistry {
    exported_types: HashMap<(String, String), TypeInfo>,
    file_exports: HashMap<String, HashSet<String>>,
}

impl ProjectTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_export(mut self, file: &str, export_name: &str, info: TypeInfo) -> Self {
        self.exported_types
            .insert((file.to_string(), export_name.to_string()), info);
        self.file_exports
            .entry(file.to_string())
            .or_default()
            .insert(export_name.to_string());
        self
    }

    pub fn lookup(&self, file: &str, export_name: &str) -> Option<&TypeInfo> {
        self.exported_types
            .get(&(file.to_string(), export_name.to_string()))
    }

    pub fn exports_of(&self, file: &str) -> Option<&HashSet<String>> {
        self.file_exports.get(file)
    }
}
