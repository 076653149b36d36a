//! The per-file scope graph: scopes, definitions, imports, and references
//! held in one arena, with typed edges binding them.
//!
//! Nodes are addressed by integer ids (petgraph indices), so the ref↔def↔scope
//! cycles never become pointer cycles and the whole graph serializes flatly.

use petgraph::graph::Graph;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};

pub use petgraph::graph::NodeIndex;

use crate::symbol::{self, SymbolId};
use crate::types::{Def, DefMetadata, Position, Range, SymbolKind};

/// The relation between two nodes in the scope graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Child scope → parent scope.
    ScopeToScope,
    /// Definition → the scope it is bound in.
    DefToScope,
    /// Import → the scope it is bound in.
    ImportToScope,
    /// Reference → the scope it originated in.
    RefToScope,
    /// Reference → the definition it resolved to.
    RefToDef,
    /// Reference → the import it resolved to.
    RefToImport,
}

/// Where a definition is inserted relative to the scope containing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scoping {
    /// Innermost scope containing the definition.
    Local,
    /// Nearest non-block enclosing scope.
    Hoisted,
    /// The root scope.
    Global,
}

impl std::str::FromStr for Scoping {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(Scoping::Local),
            "hoist" => Ok(Scoping::Hoisted),
            "global" => Ok(Scoping::Global),
            other => Err(other.to_string()),
        }
    }
}

/// A lexical region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalScope {
    pub range: Range,
    /// CST node kind that produced this scope (`statement_block`, `block`, …).
    /// Hoisting walks past block-kind scopes.
    pub node_kind: String,
}

/// A definition node payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalDef {
    pub range: Range,
    pub name: String,
    pub symbol_kind: SymbolKind,
    /// Namespace index within the language's namespace list, if any.
    pub namespace: Option<u32>,
    /// Full body span for function/class-like definitions.
    pub enclosing_range: Option<Range>,
    pub signature: Option<String>,
    pub docstring: Option<String>,
    pub metadata: Option<DefMetadata>,
    pub is_exported: bool,
    /// Filled by the annotation pass once the container is known.
    pub symbol_id: Option<SymbolId>,
}

impl LocalDef {
    pub fn new(range: Range, name: String, symbol_kind: SymbolKind, namespace: Option<u32>) -> Self {
        Self {
            range,
            name,
            symbol_kind,
            namespace,
            enclosing_range: None,
            signature: None,
            docstring: None,
            metadata: None,
            is_exported: false,
            symbol_id: None,
        }
    }
}

/// An import binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalImport {
    pub range: Range,
    /// The name bound locally.
    pub name: String,
    /// Original exported name when the import renames (`import {a as b}`).
    pub source_name: Option<String>,
    /// Module path string as written in the import statement.
    pub source_module: Option<String>,
}

/// A reference node payload. Unresolved references are retained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalRef {
    pub range: Range,
    pub name: String,
    pub namespace: Option<u32>,
}

/// The type of a node in the scope graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Scope(LocalScope),
    Def(LocalDef),
    Import(LocalImport),
    Ref(LocalRef),
}

impl NodeKind {
    pub fn range(&self) -> Range {
        match self {
            NodeKind::Scope(s) => s.range,
            NodeKind::Def(d) => d.range,
            NodeKind::Import(i) => i.range,
            NodeKind::Ref(r) => r.range,
        }
    }
}

/// Iterator from a scope up through its ancestors to the root.
pub struct ScopeStack<'a> {
    graph: &'a ScopeGraph,
    current: Option<NodeIndex>,
}

impl Iterator for ScopeStack<'_> {
    type Item = NodeIndex;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current?;
        self.current = self.graph.parent_scope(current);
        Some(current)
    }
}

/// A graph of scopes and names for a single file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeGraph {
    graph: Graph<NodeKind, EdgeKind>,
    root_idx: NodeIndex,
    file_path: String,
    lang: String,
    /// The file's default-exported definition, when the language has one.
    default_export: Option<NodeIndex>,
}

impl ScopeGraph {
    /// Create a graph whose root scope spans the whole file.
    pub fn new(range: Range, file_path: &str, lang: &str) -> Self {
        let mut graph = Graph::new();
        let root_idx = graph.add_node(NodeKind::Scope(LocalScope {
            range,
            node_kind: "root".to_string(),
        }));
        Self {
            graph,
            root_idx,
            file_path: file_path.to_string(),
            lang: lang.to_string(),
            default_export: None,
        }
    }

    pub fn root(&self) -> NodeIndex {
        self.root_idx
    }

    pub fn default_export(&self) -> Option<NodeIndex> {
        self.default_export
    }

    pub fn set_default_export(&mut self, idx: NodeIndex) {
        self.default_export = Some(idx);
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    pub fn node(&self, idx: NodeIndex) -> Option<&NodeKind> {
        self.graph.node_weight(idx)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    // ------------------------------------------------------------------
    // Scope structure
    // ------------------------------------------------------------------

    /// The smallest scope that contains `range`, starting from the root.
    pub fn scope_by_range(&self, range: Range) -> Option<NodeIndex> {
        self.scope_by_range_from(range, self.root_idx)
    }

    fn scope_by_range_from(&self, range: Range, start: NodeIndex) -> Option<NodeIndex> {
        let target = self.graph[start].range();
        if !target.contains(&range) {
            return None;
        }
        let children: Vec<NodeIndex> = self
            .graph
            .edges_directed(start, Direction::Incoming)
            .filter(|e| *e.weight() == EdgeKind::ScopeToScope)
            .map(|e| e.source())
            .collect();
        for child in children {
            if let Some(found) = self.scope_by_range_from(range, child) {
                return Some(found);
            }
        }
        Some(start)
    }

    /// The parent of a scope, `None` for the root.
    pub fn parent_scope(&self, scope: NodeIndex) -> Option<NodeIndex> {
        if !matches!(self.graph.node_weight(scope), Some(NodeKind::Scope(_))) {
            return None;
        }
        self.graph
            .edges_directed(scope, Direction::Outgoing)
            .find(|e| *e.weight() == EdgeKind::ScopeToScope)
            .map(|e| e.target())
    }

    /// Walk from `start` up to the root scope.
    pub fn scope_stack(&self, start: NodeIndex) -> ScopeStack<'_> {
        ScopeStack {
            graph: self,
            current: Some(start),
        }
    }

    /// The scope a definition/import/reference is bound in.
    pub fn scope_of(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .edges_directed(idx, Direction::Outgoing)
            .find(|e| {
                matches!(
                    e.weight(),
                    EdgeKind::DefToScope | EdgeKind::ImportToScope | EdgeKind::RefToScope
                )
            })
            .map(|e| e.target())
    }

    // ------------------------------------------------------------------
    // Insertion
    // ------------------------------------------------------------------

    /// Insert a scope under the smallest scope containing it.
    pub fn insert_local_scope(&mut self, scope: LocalScope) -> NodeIndex {
        let parent = self
            .scope_by_range(scope.range)
            .unwrap_or(self.root_idx);
        let idx = self.graph.add_node(NodeKind::Scope(scope));
        self.graph.add_edge(idx, parent, EdgeKind::ScopeToScope);
        idx
    }

    /// Insert an import in the scope containing its statement.
    pub fn insert_import(&mut self, import: LocalImport) -> NodeIndex {
        let scope = self
            .scope_by_range(import.range)
            .unwrap_or(self.root_idx);
        let idx = self.graph.add_node(NodeKind::Import(import));
        self.graph.add_edge(idx, scope, EdgeKind::ImportToScope);
        idx
    }

    /// Insert a definition according to its scoping policy. `block_kinds`
    /// lists the scope node kinds hoisting must not stop at.
    pub fn insert_def(
        &mut self,
        def: LocalDef,
        scoping: Scoping,
        block_kinds: &[&str],
    ) -> NodeIndex {
        let target = match scoping {
            Scoping::Global => self.root_idx,
            Scoping::Local => self.scope_by_range(def.range).unwrap_or(self.root_idx),
            Scoping::Hoisted => {
                let defining = self.scope_by_range(def.range).unwrap_or(self.root_idx);
                self.hoist_target(defining, block_kinds)
            }
        };
        let idx = self.graph.add_node(NodeKind::Def(def));
        self.graph.add_edge(idx, target, EdgeKind::DefToScope);
        idx
    }

    /// One scope up from the defining scope, then past any block scopes.
    /// The defining scope itself is skipped so a hoisted name (a Python
    /// `def`, a TS `function`) binds outside its own body.
    fn hoist_target(&self, defining: NodeIndex, block_kinds: &[&str]) -> NodeIndex {
        let mut target = match self.parent_scope(defining) {
            Some(p) => p,
            None => return defining,
        };
        while let NodeKind::Scope(scope) = &self.graph[target] {
            if !block_kinds.contains(&scope.node_kind.as_str()) {
                break;
            }
            match self.parent_scope(target) {
                Some(p) => target = p,
                None => break,
            }
        }
        target
    }

    /// Insert a reference and resolve it against visible definitions and
    /// imports. Unresolved references are kept, with only a `RefToScope`
    /// edge. A reference never gets more than one resolution edge.
    pub fn insert_ref(&mut self, r: LocalRef) -> NodeIndex {
        let origin = self.scope_by_range(r.range).unwrap_or(self.root_idx);
        let resolution = self.resolve_name(origin, &r.name, r.namespace);
        let idx = self.graph.add_node(NodeKind::Ref(r));
        self.graph.add_edge(idx, origin, EdgeKind::RefToScope);
        if let Some((target, kind)) = resolution {
            self.graph.add_edge(idx, target, kind);
        }
        idx
    }

    /// Walk the scope stack looking for a definition or import named
    /// `name`. In any single scope a definition wins over an import; the
    /// first scope with a hit wins overall.
    fn resolve_name(
        &self,
        origin: NodeIndex,
        name: &str,
        namespace: Option<u32>,
    ) -> Option<(NodeIndex, EdgeKind)> {
        for scope in self.scope_stack(origin) {
            for (idx, def) in self.defs_in_scope(scope) {
                if def.name == name && namespaces_compatible(def.namespace, namespace) {
                    return Some((idx, EdgeKind::RefToDef));
                }
            }
            for (idx, import) in self.imports_in_scope(scope) {
                if import.name == name {
                    return Some((idx, EdgeKind::RefToImport));
                }
            }
        }
        None
    }

    // ------------------------------------------------------------------
    // Node iteration
    // ------------------------------------------------------------------

    pub fn defs(&self) -> impl Iterator<Item = (NodeIndex, &LocalDef)> {
        self.graph.node_indices().filter_map(|idx| match &self.graph[idx] {
            NodeKind::Def(d) => Some((idx, d)),
            _ => None,
        })
    }

    pub fn refs(&self) -> impl Iterator<Item = (NodeIndex, &LocalRef)> {
        self.graph.node_indices().filter_map(|idx| match &self.graph[idx] {
            NodeKind::Ref(r) => Some((idx, r)),
            _ => None,
        })
    }

    pub fn imports(&self) -> impl Iterator<Item = (NodeIndex, &LocalImport)> {
        self.graph.node_indices().filter_map(|idx| match &self.graph[idx] {
            NodeKind::Import(i) => Some((idx, i)),
            _ => None,
        })
    }

    pub fn scopes(&self) -> impl Iterator<Item = (NodeIndex, &LocalScope)> {
        self.graph.node_indices().filter_map(|idx| match &self.graph[idx] {
            NodeKind::Scope(s) => Some((idx, s)),
            _ => None,
        })
    }

    pub fn defs_in_scope(&self, scope: NodeIndex) -> Vec<(NodeIndex, &LocalDef)> {
        self.graph
            .edges_directed(scope, Direction::Incoming)
            .filter(|e| *e.weight() == EdgeKind::DefToScope)
            .filter_map(|e| match &self.graph[e.source()] {
                NodeKind::Def(d) => Some((e.source(), d)),
                _ => None,
            })
            .collect()
    }

    pub fn imports_in_scope(&self, scope: NodeIndex) -> Vec<(NodeIndex, &LocalImport)> {
        self.graph
            .edges_directed(scope, Direction::Incoming)
            .filter(|e| *e.weight() == EdgeKind::ImportToScope)
            .filter_map(|e| match &self.graph[e.source()] {
                NodeKind::Import(i) => Some((e.source(), i)),
                _ => None,
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Resolution lookups
    // ------------------------------------------------------------------

    /// Where a reference resolved to, if anywhere.
    pub fn resolution_of(&self, ref_idx: NodeIndex) -> Option<(NodeIndex, EdgeKind)> {
        self.graph
            .edges_directed(ref_idx, Direction::Outgoing)
            .find(|e| matches!(e.weight(), EdgeKind::RefToDef | EdgeKind::RefToImport))
            .map(|e| (e.target(), *e.weight()))
    }

    /// All references that resolved to a definition.
    pub fn refs_of_def(&self, def_idx: NodeIndex) -> Vec<NodeIndex> {
        self.graph
            .edges_directed(def_idx, Direction::Incoming)
            .filter(|e| *e.weight() == EdgeKind::RefToDef)
            .map(|e| e.source())
            .collect()
    }

    /// All references that resolved to an import.
    pub fn refs_of_import(&self, import_idx: NodeIndex) -> Vec<NodeIndex> {
        self.graph
            .edges_directed(import_idx, Direction::Incoming)
            .filter(|e| *e.weight() == EdgeKind::RefToImport)
            .map(|e| e.source())
            .collect()
    }

    // ------------------------------------------------------------------
    // Position lookups
    // ------------------------------------------------------------------

    /// The reference whose range starts exactly at `pos`.
    pub fn ref_starting_at(&self, pos: Position) -> Option<NodeIndex> {
        self.refs()
            .find(|(_, r)| r.range.start == pos)
            .map(|(idx, _)| idx)
    }

    /// The definition at `pos`: one whose name range contains it, else the
    /// tightest one whose enclosing range contains it.
    pub fn def_at_position(&self, pos: Position) -> Option<NodeIndex> {
        if let Some((idx, _)) = self
            .defs()
            .find(|(_, d)| d.range.contains_position(pos) || d.range.start == pos)
        {
            return Some(idx);
        }
        self.defs()
            .filter(|(_, d)| {
                d.enclosing_range
                    .is_some_and(|r| r.contains_position(pos))
            })
            .min_by_key(|(_, d)| d.enclosing_range.map(|r| r.byte_size()).unwrap_or(u32::MAX))
            .map(|(idx, _)| idx)
    }

    /// The import whose binding range contains or starts at `pos`.
    pub fn import_at_position(&self, pos: Position) -> Option<NodeIndex> {
        self.imports()
            .find(|(_, i)| i.range.contains_position(pos) || i.range.start == pos)
            .map(|(idx, _)| idx)
    }

    /// Is there a definition or import occupying exactly this range?
    /// Used to skip reference captures that coincide with binding sites.
    pub fn binding_at_range(&self, range: Range) -> bool {
        self.defs().any(|(_, d)| d.range == range)
            || self.imports().any(|(_, i)| i.range == range)
    }

    // ------------------------------------------------------------------
    // Payload access
    // ------------------------------------------------------------------

    pub fn def(&self, idx: NodeIndex) -> Option<&LocalDef> {
        match self.graph.node_weight(idx)? {
            NodeKind::Def(d) => Some(d),
            _ => None,
        }
    }

    pub fn def_mut(&mut self, idx: NodeIndex) -> Option<&mut LocalDef> {
        match self.graph.node_weight_mut(idx)? {
            NodeKind::Def(d) => Some(d),
            _ => None,
        }
    }

    pub fn import(&self, idx: NodeIndex) -> Option<&LocalImport> {
        match self.graph.node_weight(idx)? {
            NodeKind::Import(i) => Some(i),
            _ => None,
        }
    }

    pub fn reference(&self, idx: NodeIndex) -> Option<&LocalRef> {
        match self.graph.node_weight(idx)? {
            NodeKind::Ref(r) => Some(r),
            _ => None,
        }
    }

    /// Project a definition node into a flat [`Def`] value.
    pub fn def_value(&self, idx: NodeIndex) -> Option<Def> {
        let d = self.def(idx)?;
        let symbol_id = d
            .symbol_id
            .clone()
            .unwrap_or_else(|| SymbolId::new(&self.file_path, &d.name));
        Some(Def {
            symbol_id,
            name: d.name.clone(),
            symbol_kind: d.symbol_kind,
            file_path: self.file_path.clone(),
            range: d.range,
            enclosing_range: d.enclosing_range,
            signature: d.signature.clone(),
            docstring: d.docstring.clone(),
            metadata: d.metadata.clone(),
            is_exported: d.is_exported,
        })
    }

    /// The synthetic `<module>` definition spanning the whole file, used as
    /// the caller for module-level calls.
    pub fn synthetic_module_def(&self) -> Def {
        let range = self.graph[self.root_idx].range();
        Def {
            symbol_id: SymbolId::module(&self.file_path),
            name: symbol::MODULE_NAME.to_string(),
            symbol_kind: SymbolKind::Module,
            file_path: self.file_path.clone(),
            range,
            enclosing_range: Some(range),
            signature: None,
            docstring: None,
            metadata: None,
            is_exported: false,
        }
    }

    // ------------------------------------------------------------------
    // Invariant checking (used heavily by the test suite)
    // ------------------------------------------------------------------

    /// Verify the per-file structural invariants. Returns every violation
    /// found rather than stopping at the first.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut problems = Vec::new();

        let mut roots = 0usize;
        for (idx, scope) in self.scopes() {
            let parents = self
                .graph
                .edges_directed(idx, Direction::Outgoing)
                .filter(|e| *e.weight() == EdgeKind::ScopeToScope)
                .count();
            match parents {
                0 => roots += 1,
                1 => {
                    if let Some(parent) = self.parent_scope(idx) {
                        let parent_range = self.graph[parent].range();
                        if !parent_range.contains(&scope.range) {
                            problems.push(format!(
                                "scope {idx:?} range escapes its parent {parent:?}"
                            ));
                        }
                    }
                }
                n => problems.push(format!("scope {idx:?} has {n} parents")),
            }
        }
        if roots != 1 {
            problems.push(format!("expected exactly one root scope, found {roots}"));
        }

        for idx in self.graph.node_indices() {
            match &self.graph[idx] {
                NodeKind::Scope(_) => {}
                NodeKind::Def(_) | NodeKind::Import(_) => {
                    let scope_edges = self
                        .graph
                        .edges_directed(idx, Direction::Outgoing)
                        .filter(|e| {
                            matches!(e.weight(), EdgeKind::DefToScope | EdgeKind::ImportToScope)
                        })
                        .count();
                    if scope_edges != 1 {
                        problems.push(format!("node {idx:?} has {scope_edges} scope edges"));
                    }
                }
                NodeKind::Ref(_) => {
                    let scope_edges = self
                        .graph
                        .edges_directed(idx, Direction::Outgoing)
                        .filter(|e| *e.weight() == EdgeKind::RefToScope)
                        .count();
                    if scope_edges != 1 {
                        problems.push(format!("ref {idx:?} has {scope_edges} scope edges"));
                    }
                    let resolutions = self
                        .graph
                        .edges_directed(idx, Direction::Outgoing)
                        .filter(|e| {
                            matches!(e.weight(), EdgeKind::RefToDef | EdgeKind::RefToImport)
                        })
                        .count();
                    if resolutions > 1 {
                        problems.push(format!("ref {idx:?} has {resolutions} resolution edges"));
                    }
                }
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }
}

fn namespaces_compatible(def_ns: Option<u32>, ref_ns: Option<u32>) -> bool {
    match (def_ns, ref_ns) {
        // An untagged side belongs to all namespaces.
        (Some(d), Some(r)) => d == r,
        _ => true,
    }
}
