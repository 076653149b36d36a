//! The project coordinator: owns the file set, drives parsing and graph
//! construction, persists through the storage backend, and exposes the
//! query surface.
//!
//! A `Project` is an immutable snapshot. Every mutating operation returns a
//! new snapshot; if persisting fails the prior snapshot is untouched.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tree_sitter::Tree;

use fathom_core::diagnostics::Diagnostic;
use fathom_core::graph::ScopeGraph;
use fathom_core::hash::content_hash;
use fathom_core::memory::InMemoryBackend;
use fathom_core::store::{FileRecord, StorageBackend, StorageError};
use fathom_core::types::{CallGraph, Def, FunctionCall, ImportInfo, Position};
use fathom_parsers::builder::build_scope_graph;
use fathom_parsers::cache::{apply_edit, FileParser, ParseError, ParseLimits};
use fathom_parsers::registry::{LanguageRegistry, RegistryError};
use fathom_parsers::walker::FileWalker;

use crate::call_graph::{build_call_graph, calls_from_definition, CallGraphOptions};
use crate::inheritance::ClassRelationships;
use crate::phases::{analyze_project, ProjectArtifacts};
use crate::resolve::{self, RefLocation};

/// The cached, parsed state of one file in a snapshot.
pub struct FileEntry {
    pub source: String,
    pub language: Option<&'static str>,
    pub content_hash: u64,
    pub tree: Option<Tree>,
    pub graph: Option<Arc<ScopeGraph>>,
}

/// A definition's source text plus its surrounding context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceContext {
    pub source: String,
    pub docstring: Option<String>,
    pub decorators: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("unknown file: {0}")]
    UnknownFile(String),
    #[error("io error reading {path}: {message}")]
    Io { path: String, message: String },
}

/// An immutable project snapshot.
#[derive(Clone)]
pub struct Project {
    files: BTreeMap<String, Arc<FileEntry>>,
    registry: Arc<LanguageRegistry>,
    backend: Arc<dyn StorageBackend>,
    limits: ParseLimits,
    diagnostics: Vec<Diagnostic>,
    artifacts: Arc<ProjectArtifacts>,
}

impl Project {
    /// Empty project over the default in-memory backend.
    pub fn new() -> Result<Self, ProjectError> {
        Self::with_backend(Arc::new(InMemoryBackend::new()))
    }

    /// Empty project over a caller-supplied backend.
    pub fn with_backend(backend: Arc<dyn StorageBackend>) -> Result<Self, ProjectError> {
        backend.initialize()?;
        let registry = Arc::new(LanguageRegistry::with_default_languages()?);
        Ok(Self {
            files: BTreeMap::new(),
            registry,
            backend,
            limits: ParseLimits::default(),
            diagnostics: Vec::new(),
            artifacts: Arc::new(ProjectArtifacts::default()),
        })
    }

    /// Override the parser size caps for subsequently added files.
    pub fn with_parse_limits(mut self, limits: ParseLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Rehydrate a project from a backend's stored file caches. Trees and
    /// graphs are rebuilt from source; nothing is written back.
    pub fn open(backend: Arc<dyn StorageBackend>) -> Result<Self, ProjectError> {
        let base = Self::with_backend(Arc::clone(&backend))?;
        let mut sources = Vec::new();
        for path in backend.get_file_paths()? {
            if let Some(record) = backend.get_file_cache(&path)? {
                sources.push((path, record.source));
            }
        }
        base.build_bulk(sources, false)
    }

    /// Walk a directory and analyze every recognized source file. File
    /// paths are stored relative to `root`.
    pub fn scan_project(root: &Path) -> Result<Self, ProjectError> {
        let base = Self::new()?;
        let registry = Arc::clone(&base.registry);
        let mut sources = Vec::new();
        for entry in FileWalker::new(root).walk(&registry) {
            let text = std::fs::read_to_string(&entry.path).map_err(|e| ProjectError::Io {
                path: entry.path.display().to_string(),
                message: e.to_string(),
            })?;
            let rel = entry
                .path
                .strip_prefix(root)
                .unwrap_or(&entry.path)
                .to_string_lossy()
                .to_string();
            sources.push((rel, text));
        }
        base.build_bulk(sources, true)
    }

    // ------------------------------------------------------------------
    // Mutating operations (each returns a new snapshot)
    // ------------------------------------------------------------------

    /// Add a file or replace its content. Re-adding identical text is a
    /// cheap no-op.
    pub fn add_or_update_file(&self, path: &str, text: &str) -> Result<Self, ProjectError> {
        let key = normalize_key(path);
        let hash = content_hash(text);
        if let Some(existing) = self.files.get(&key) {
            if existing.content_hash == hash {
                return Ok(self.clone());
            }
        }

        let mut diagnostics = self.diagnostics.clone();
        diagnostics.retain(|d| d.file_path.as_deref() != Some(key.as_str()));
        let entry = self.parse_entry(&key, text.to_string(), None, &mut diagnostics)?;
        self.commit_update(key, entry, diagnostics)
    }

    /// Apply an incremental edit, reparse with the edited tree, and rebuild
    /// the file's scope graph.
    pub fn update_file_range(
        &self,
        path: &str,
        old_start: Position,
        old_end: Position,
        new_text: &str,
    ) -> Result<Self, ProjectError> {
        let key = normalize_key(path);
        let entry = self
            .files
            .get(&key)
            .ok_or_else(|| ProjectError::UnknownFile(key.clone()))?;

        let applied = apply_edit(&entry.source, entry.tree.as_ref(), old_start, old_end, new_text);

        let mut diagnostics = self.diagnostics.clone();
        diagnostics.retain(|d| d.file_path.as_deref() != Some(key.as_str()));
        let new_entry =
            self.parse_entry(&key, applied.source, applied.edited_tree, &mut diagnostics)?;
        self.commit_update(key, new_entry, diagnostics)
    }

    /// Remove a file and its graph. Removing an unknown path is a no-op.
    pub fn remove_file(&self, path: &str) -> Result<Self, ProjectError> {
        let key = normalize_key(path);
        if !self.files.contains_key(&key) {
            return Ok(self.clone());
        }

        let mut files = self.files.clone();
        files.remove(&key);
        let artifacts = Arc::new(analyze_project(&files, &self.registry));

        let mut tx = self.backend.begin_transaction()?;
        tx.remove_file(&key)?;
        tx.set_state(state_json(&files))?;
        tx.commit()?;

        let mut diagnostics = self.diagnostics.clone();
        diagnostics.retain(|d| d.file_path.as_deref() != Some(key.as_str()));

        Ok(Self {
            files,
            artifacts,
            diagnostics,
            registry: Arc::clone(&self.registry),
            backend: Arc::clone(&self.backend),
            limits: self.limits,
        })
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn get_scope_graph(&self, path: &str) -> Option<Arc<ScopeGraph>> {
        self.files
            .get(&normalize_key(path))
            .and_then(|e| e.graph.clone())
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn file_paths(&self) -> Vec<String> {
        self.files.keys().cloned().collect()
    }

    pub fn has_file(&self, path: &str) -> bool {
        self.files.contains_key(&normalize_key(path))
    }

    pub fn source_of(&self, path: &str) -> Option<&str> {
        self.files
            .get(&normalize_key(path))
            .map(|e| e.source.as_str())
    }

    pub fn go_to_definition(&self, path: &str, position: Position) -> Option<Def> {
        let key = normalize_key(path);
        let graph = self.files.get(&key)?.graph.as_deref()?;
        let no_imports = Vec::new();
        let imports = self.artifacts.imports.get(&key).unwrap_or(&no_imports);
        resolve::definition_at(graph, position, imports)
    }

    pub fn find_references(&self, path: &str, position: Position) -> Vec<RefLocation> {
        let key = normalize_key(path);
        let Some(graph) = self.files.get(&key).and_then(|e| e.graph.as_deref()) else {
            return Vec::new();
        };
        resolve::references_to(
            graph,
            position,
            &self.artifacts.graphs,
            &self.artifacts.imports,
        )
    }

    pub fn get_definitions(&self, path: &str) -> Vec<Def> {
        self.files
            .get(&normalize_key(path))
            .and_then(|e| e.graph.as_deref())
            .map(resolve::definitions_in)
            .unwrap_or_default()
    }

    pub fn get_all_definitions(&self) -> Vec<Def> {
        self.files
            .values()
            .filter_map(|e| e.graph.as_deref())
            .flat_map(resolve::definitions_in)
            .collect()
    }

    pub fn get_functions_in_file(&self, path: &str) -> Vec<Def> {
        self.files
            .get(&normalize_key(path))
            .and_then(|e| e.graph.as_deref())
            .map(resolve::functions_in)
            .unwrap_or_default()
    }

    pub fn get_exported_functions(&self, path: &str) -> Vec<Def> {
        self.files
            .get(&normalize_key(path))
            .and_then(|e| e.graph.as_deref())
            .map(resolve::exported_functions_in)
            .unwrap_or_default()
    }

    /// Imports that resolved to an exported definition; unresolved imports
    /// are omitted.
    pub fn get_imports_with_definitions(&self, path: &str) -> Vec<ImportInfo> {
        self.artifacts
            .imports
            .get(&normalize_key(path))
            .cloned()
            .unwrap_or_default()
    }

    pub fn get_function_calls(&self, def: &Def) -> Vec<FunctionCall> {
        self.get_calls_from_definition(def)
    }

    pub fn get_calls_from_definition(&self, def: &Def) -> Vec<FunctionCall> {
        calls_from_definition(def, &self.files, &self.artifacts, &self.registry)
    }

    pub fn get_call_graph(&self, options: &CallGraphOptions) -> CallGraph {
        build_call_graph(&self.files, &self.artifacts, &self.registry, options)
    }

    pub fn extract_call_graph(&self) -> CallGraph {
        self.get_call_graph(&CallGraphOptions::default())
    }

    pub fn get_class_relationships(&self, def: &Def) -> ClassRelationships {
        self.artifacts.inheritance.relationships(def)
    }

    pub fn find_subclasses(&self, def: &Def) -> Vec<Def> {
        self.artifacts.inheritance.subclasses_of(def)
    }

    pub fn find_implementations(&self, def: &Def) -> Vec<Def> {
        self.artifacts.inheritance.implementations_of(def)
    }

    pub fn get_inheritance_chain(&self, def: &Def) -> Vec<Def> {
        self.artifacts.inheritance.chain_of(def)
    }

    pub fn is_subclass_of(&self, child: &Def, ancestor: &Def) -> bool {
        self.artifacts.inheritance.is_subclass_of(child, ancestor)
    }

    /// A definition's body text with its docstring and decorators.
    pub fn get_source_with_context(&self, def: &Def, path: &str) -> Option<SourceContext> {
        let entry = self.files.get(&normalize_key(path))?;
        let span = def.enclosing_range.unwrap_or(def.range);
        Some(SourceContext {
            source: span.text(&entry.source).to_string(),
            docstring: def.docstring.clone(),
            decorators: def
                .metadata
                .as_ref()
                .map(|m| m.decorators.clone())
                .unwrap_or_default(),
        })
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn parse_entry(
        &self,
        key: &str,
        source: String,
        old_tree: Option<Tree>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<FileEntry, ProjectError> {
        parse_entry(&self.registry, &self.limits, key, source, old_tree, diagnostics)
    }

    /// Install an updated entry: new file map, re-derived artifacts, and a
    /// committed storage transaction. Storage failure aborts the update and
    /// the caller keeps the prior snapshot.
    fn commit_update(
        &self,
        key: String,
        entry: FileEntry,
        diagnostics: Vec<Diagnostic>,
    ) -> Result<Self, ProjectError> {
        let record = FileRecord {
            source: entry.source.clone(),
            language: entry.language.map(String::from),
            content_hash: entry.content_hash,
        };
        let graph = entry.graph.clone();

        let mut files = self.files.clone();
        files.insert(key.clone(), Arc::new(entry));
        let artifacts = Arc::new(analyze_project(&files, &self.registry));

        let mut tx = self.backend.begin_transaction()?;
        tx.update_file(&key, &record, graph.as_deref())?;
        tx.set_state(state_json(&files))?;
        tx.commit()?;

        Ok(Self {
            files,
            artifacts,
            diagnostics,
            registry: Arc::clone(&self.registry),
            backend: Arc::clone(&self.backend),
            limits: self.limits,
        })
    }

    /// Parse many files in parallel, analyze once, and (optionally) persist
    /// everything in a single transaction.
    fn build_bulk(
        &self,
        sources: Vec<(String, String)>,
        persist: bool,
    ) -> Result<Self, ProjectError> {
        let limits = self.limits;
        let registry = Arc::clone(&self.registry);

        // one parser per worker task; parsers are never shared
        let parsed: Vec<(String, FileEntry, Vec<Diagnostic>)> = sources
            .into_par_iter()
            .map(|(path, text)| {
                let key = normalize_key(&path);
                let mut diagnostics = Vec::new();
                parse_entry(&registry, &limits, &key, text, None, &mut diagnostics)
                    .map(|e| (key, e, diagnostics))
            })
            .collect::<Result<_, _>>()?;

        let mut files = self.files.clone();
        let mut diagnostics = self.diagnostics.clone();
        let mut records = Vec::new();
        for (key, entry, file_diags) in parsed {
            diagnostics.extend(file_diags);
            records.push((
                key.clone(),
                FileRecord {
                    source: entry.source.clone(),
                    language: entry.language.map(String::from),
                    content_hash: entry.content_hash,
                },
                entry.graph.clone(),
            ));
            files.insert(key, Arc::new(entry));
        }
        let artifacts = Arc::new(analyze_project(&files, &self.registry));

        if persist {
            let mut tx = self.backend.begin_transaction()?;
            for (key, record, graph) in &records {
                tx.update_file(key, record, graph.as_deref())?;
            }
            tx.set_state(state_json(&files))?;
            tx.commit()?;
        }

        Ok(Self {
            files,
            artifacts,
            diagnostics,
            registry: Arc::clone(&self.registry),
            backend: Arc::clone(&self.backend),
            limits: self.limits,
        })
    }
}

/// Parse one file into an entry. Oversized files and parser give-ups are
/// cached without a graph, with a warning diagnostic.
fn parse_entry(
    registry: &LanguageRegistry,
    limits: &ParseLimits,
    key: &str,
    source: String,
    old_tree: Option<Tree>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<FileEntry, ProjectError> {
    let hash = content_hash(&source);
    let Some(config) = registry.config_for_path(key) else {
        return Ok(FileEntry {
            source,
            language: None,
            content_hash: hash,
            tree: None,
            graph: None,
        });
    };

    let mut parser = FileParser::new();
    let tree = match parser.parse(config, key, &source, old_tree.as_ref(), limits) {
        Ok(tree) => tree,
        Err(e @ ParseError::FileTooLarge { .. }) => {
            diagnostics.push(Diagnostic::warning(Some(key), e.to_string()));
            None
        }
        Err(e) => return Err(e.into()),
    };

    let graph = match &tree {
        Some(tree) => Some(Arc::new(build_scope_graph(
            tree,
            &source,
            key,
            config,
            diagnostics,
        ))),
        None => {
            if source.len() <= limits.max_file_size {
                diagnostics.push(Diagnostic::warning(
                    Some(key),
                    "parser produced no tree; file cached without a graph",
                ));
            }
            None
        }
    };

    Ok(FileEntry {
        source,
        language: Some(config.name),
        content_hash: hash,
        tree,
        graph,
    })
}

fn normalize_key(path: &str) -> String {
    let forward = path.replace('\\', "/");
    forward.trim_start_matches("./").to_string()
}

fn state_json(files: &BTreeMap<String, Arc<FileEntry>>) -> serde_json::Value {
    serde_json::json!({
        "version": 1,
        "files": files.keys().collect::<Vec<_>>(),
    })
}
