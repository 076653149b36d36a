//! Call-graph extraction and projection. Works off the scope graphs plus
//! the type trackers: references are classified by their CST shape, method
//! receivers resolve through the local→file tracker chain, and everything
//! outside a function body lands on the synthetic `<module>` caller.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Arc;

use fathom_core::graph::{EdgeKind, NodeIndex, ScopeGraph};
use fathom_core::symbol::SymbolId;
use fathom_core::types::{
    CallGraph, CallGraphEdge, CallGraphNode, CallRef, CallType, Def, FunctionCall, Range,
    SymbolKind,
};
use fathom_parsers::cst::node_at_range;
use fathom_parsers::registry::{CallShape, LanguageConfig, LanguageRegistry};

use crate::phases::ProjectArtifacts;
use crate::project::FileEntry;
use crate::type_tracker::{FileTypeTracker, LocalTypeTracker, TypeInfo};

/// Options for [`build_call_graph`].
pub struct CallGraphOptions {
    /// Include only files where the filter returns true.
    pub file_filter: Option<Box<dyn Fn(&str) -> bool + Send + Sync>>,
    /// Depth cap applied by BFS from every top-level node.
    pub max_depth: Option<u32>,
    /// Emit edges to the `<builtin>` sentinel for calls on unknown receivers.
    pub include_external: bool,
}

impl Default for CallGraphOptions {
    fn default() -> Self {
        Self {
            file_filter: None,
            max_depth: None,
            include_external: false,
        }
    }
}

/// Where a raw call landed.
#[derive(Debug, Clone)]
pub enum CallTarget {
    Def(Def),
    /// A method call on a receiver the trackers know nothing about.
    Builtin(String),
}

/// One classified call site, before projection.
#[derive(Debug, Clone)]
pub struct RawCall {
    pub caller: Def,
    pub target: CallTarget,
    pub range: Range,
    pub call_type: CallType,
    pub is_method_call: bool,
}

/// Extract every call originating in one file. Calls in nested function
/// bodies are attributed to the innermost enclosing function; calls outside
/// all bodies go to the `<module>` synthetic definition.
pub fn extract_file_calls(
    path: &str,
    entry: &FileEntry,
    config: &LanguageConfig,
    artifacts: &ProjectArtifacts,
) -> Vec<RawCall> {
    let (Some(graph), Some(tree)) = (entry.graph.as_deref(), entry.tree.as_ref()) else {
        return Vec::new();
    };
    let source = entry.source.as_str();
    let root = tree.root_node();

    let callers: Vec<(Range, Def)> = graph
        .defs()
        .filter(|(_, d)| d.symbol_kind.is_function_like())
        .filter_map(|(idx, d)| Some((d.enclosing_range?, graph.def_value(idx)?)))
        .collect();
    let class_ranges: Vec<Range> = graph
        .defs()
        .filter(|(_, d)| d.symbol_kind.is_class_like())
        .filter_map(|(_, d)| d.enclosing_range)
        .collect();
    let module_def = graph.synthetic_module_def();

    let no_imports = Vec::new();
    let file_imports = artifacts.imports.get(path).unwrap_or(&no_imports);
    let import_by_range: HashMap<(u32, u32), &Def> = file_imports
        .iter()
        .map(|i| {
            (
                (i.import_range.start_byte, i.import_range.end_byte),
                &i.definition,
            )
        })
        .collect();
    let import_by_name: HashMap<&str, &Def> = file_imports
        .iter()
        .map(|i| (i.local_name.as_str(), &i.definition))
        .collect();

    let file_tracker = artifacts
        .trackers
        .get(path)
        .cloned()
        .unwrap_or_else(|| Arc::new(FileTypeTracker::new()));

    // Group references by their caller. `None` is the module group; refs in
    // class bodies but outside methods belong to neither.
    let mut refs: Vec<_> = graph.refs().map(|(idx, r)| (idx, r.range)).collect();
    refs.sort_by_key(|(_, range)| range.start_byte);

    let mut groups: BTreeMap<Option<usize>, Vec<NodeIndex>> = BTreeMap::new();
    for (ref_idx, range) in refs {
        let caller = callers
            .iter()
            .enumerate()
            .filter(|(_, (body, _))| body.contains(&range))
            .min_by_key(|(_, (body, _))| body.byte_size())
            .map(|(i, _)| i);
        if caller.is_none() && class_ranges.iter().any(|cr| cr.contains(&range)) {
            continue;
        }
        groups.entry(caller).or_default().push(ref_idx);
    }

    let mut calls = Vec::new();
    for (caller_idx, ref_indices) in groups {
        let caller_def = match caller_idx {
            Some(i) => callers[i].1.clone(),
            None => module_def.clone(),
        };
        let mut tracker = LocalTypeTracker::new(Arc::clone(&file_tracker));

        for ref_idx in ref_indices {
            let Some(r) = graph.reference(ref_idx).cloned() else {
                continue;
            };
            let Some(node) = node_at_range(root, r.range) else {
                continue;
            };

            match (config.classify_call)(node, source) {
                CallShape::NotACall => {}
                CallShape::Direct { assigned_to } => {
                    let Some(target) = resolve_ref_target(graph, ref_idx, &import_by_range)
                    else {
                        continue;
                    };
                    if target.symbol_kind.is_class_like() && config.call_on_class_is_constructor
                    {
                        tracker = discover(tracker, assigned_to, &target, r.range);
                        calls.push(RawCall {
                            caller: caller_def.clone(),
                            target: CallTarget::Def(target),
                            range: r.range,
                            call_type: CallType::Constructor,
                            is_method_call: false,
                        });
                    } else {
                        calls.push(RawCall {
                            caller: caller_def.clone(),
                            target: CallTarget::Def(target),
                            range: r.range,
                            call_type: CallType::Direct,
                            is_method_call: false,
                        });
                    }
                }
                CallShape::Constructor { assigned_to } => {
                    let Some(target) = resolve_ref_target(graph, ref_idx, &import_by_range)
                    else {
                        continue;
                    };
                    tracker = discover(tracker, assigned_to, &target, r.range);
                    calls.push(RawCall {
                        caller: caller_def.clone(),
                        target: CallTarget::Def(target),
                        range: r.range,
                        call_type: CallType::Constructor,
                        is_method_call: false,
                    });
                }
                CallShape::Method { receiver } => {
                    if config.receiver_synonyms.contains(&receiver.as_str()) {
                        // `this.m()` resolves against the enclosing class
                        let Some(class_name) = caller_def
                            .metadata
                            .as_ref()
                            .and_then(|m| m.parent_class.clone())
                        else {
                            continue;
                        };
                        let Some(method) =
                            find_method(&artifacts.graphs, path, &class_name, &r.name)
                        else {
                            continue;
                        };
                        calls.push(RawCall {
                            caller: caller_def.clone(),
                            target: CallTarget::Def(method),
                            range: r.range,
                            call_type: CallType::Method,
                            is_method_call: true,
                        });
                    } else if let Some(info) =
                        tracker.lookup(&receiver, Some(r.range.start)).cloned()
                    {
                        // receiver variable with a discovered class
                        let Some(method) = find_method(
                            &artifacts.graphs,
                            &info.source_file,
                            &info.class_name,
                            &r.name,
                        ) else {
                            continue;
                        };
                        calls.push(RawCall {
                            caller: caller_def.clone(),
                            target: CallTarget::Def(method),
                            range: r.range,
                            call_type: CallType::Method,
                            is_method_call: true,
                        });
                    } else if let Some(class_def) =
                        resolve_class_in_file(graph, &import_by_name, &receiver)
                    {
                        // static form: `Store.create()`
                        let Some(method) = find_method(
                            &artifacts.graphs,
                            &class_def.file_path,
                            &class_def.name,
                            &r.name,
                        ) else {
                            continue;
                        };
                        calls.push(RawCall {
                            caller: caller_def.clone(),
                            target: CallTarget::Def(method),
                            range: r.range,
                            call_type: CallType::Method,
                            is_method_call: true,
                        });
                    } else {
                        // unknown receiver: record as a built-in call
                        calls.push(RawCall {
                            caller: caller_def.clone(),
                            target: CallTarget::Builtin(r.name.clone()),
                            range: r.range,
                            call_type: CallType::Method,
                            is_method_call: true,
                        });
                    }
                }
                CallShape::Associated {
                    type_name,
                    assigned_to,
                } => {
                    let Some(class_def) =
                        resolve_class_in_file(graph, &import_by_name, &type_name)
                    else {
                        continue;
                    };
                    if r.name == "new" {
                        tracker = discover(tracker, assigned_to, &class_def, r.range);
                        calls.push(RawCall {
                            caller: caller_def.clone(),
                            target: CallTarget::Def(class_def),
                            range: r.range,
                            call_type: CallType::Constructor,
                            is_method_call: false,
                        });
                    } else {
                        let Some(method) = find_method(
                            &artifacts.graphs,
                            &class_def.file_path,
                            &class_def.name,
                            &r.name,
                        ) else {
                            continue;
                        };
                        calls.push(RawCall {
                            caller: caller_def.clone(),
                            target: CallTarget::Def(method),
                            range: r.range,
                            call_type: CallType::Method,
                            is_method_call: true,
                        });
                    }
                }
            }
        }
    }
    calls
}

/// Bind `assigned_to` to the constructed class at the call position.
fn discover(
    tracker: LocalTypeTracker,
    assigned_to: Option<String>,
    class_def: &Def,
    range: Range,
) -> LocalTypeTracker {
    let Some(var) = assigned_to else {
        return tracker;
    };
    if !class_def.symbol_kind.is_class_like() {
        return tracker;
    }
    tracker.bind(
        &var,
        range.start,
        TypeInfo {
            class_name: class_def.name.clone(),
            class_symbol: Some(class_def.symbol_id.clone()),
            source_file: class_def.file_path.clone(),
        },
    )
}

/// What a reference's resolution edge points at, following imports to their
/// exported definitions.
fn resolve_ref_target(
    graph: &ScopeGraph,
    ref_idx: NodeIndex,
    import_by_range: &HashMap<(u32, u32), &Def>,
) -> Option<Def> {
    match graph.resolution_of(ref_idx)? {
        (idx, EdgeKind::RefToDef) => graph.def_value(idx),
        (idx, EdgeKind::RefToImport) => {
            let import = graph.import(idx)?;
            import_by_range
                .get(&(import.range.start_byte, import.range.end_byte))
                .map(|d| (*d).clone())
        }
        _ => None,
    }
}

/// Look up `name.method` inside the named class of a given file.
fn find_method(
    graphs: &BTreeMap<String, Arc<ScopeGraph>>,
    file: &str,
    class_name: &str,
    method: &str,
) -> Option<Def> {
    let graph = graphs.get(file)?;
    graph
        .defs()
        .find(|(_, d)| {
            matches!(d.symbol_kind, SymbolKind::Method | SymbolKind::Constructor)
                && d.name == method
                && d.metadata
                    .as_ref()
                    .is_some_and(|m| m.parent_class.as_deref() == Some(class_name))
        })
        .and_then(|(idx, _)| graph.def_value(idx))
}

/// A class named directly in a file: a local class definition or an import
/// that resolved to one.
fn resolve_class_in_file(
    graph: &ScopeGraph,
    import_by_name: &HashMap<&str, &Def>,
    name: &str,
) -> Option<Def> {
    if let Some((idx, _)) = graph
        .defs()
        .find(|(_, d)| d.name == name && d.symbol_kind.is_class_like())
    {
        return graph.def_value(idx);
    }
    import_by_name
        .get(name)
        .filter(|d| d.symbol_kind.is_class_like())
        .map(|d| (*d).clone())
}

/// Project the call graph across the given files.
pub fn build_call_graph(
    files: &BTreeMap<String, Arc<FileEntry>>,
    artifacts: &ProjectArtifacts,
    registry: &LanguageRegistry,
    options: &CallGraphOptions,
) -> CallGraph {
    let included = |path: &str| match &options.file_filter {
        Some(filter) => filter(path),
        None => true,
    };

    let mut all_calls: Vec<RawCall> = Vec::new();
    let mut nodes: BTreeMap<SymbolId, CallGraphNode> = BTreeMap::new();

    for (path, entry) in files {
        if !included(path) {
            continue;
        }
        let Some(config) = entry.language.and_then(|l| registry.config_by_name(l)) else {
            continue;
        };

        // every function-like definition is a node, called or not
        if let Some(graph) = entry.graph.as_deref() {
            for (idx, d) in graph.defs() {
                if !d.symbol_kind.is_function_like() {
                    continue;
                }
                if let Some(def) = graph.def_value(idx) {
                    insert_node(&mut nodes, def);
                }
            }
        }

        all_calls.extend(extract_file_calls(path, entry, config, artifacts));
    }

    // callers (including module synthetics) and call targets become nodes
    for call in &all_calls {
        insert_node(&mut nodes, call.caller.clone());
        if let CallTarget::Def(def) = &call.target {
            insert_node(&mut nodes, def.clone());
        }
    }

    let mut edges: Vec<CallGraphEdge> = Vec::new();
    let mut edge_seen: HashSet<(SymbolId, SymbolId, CallType)> = HashSet::new();
    for call in &all_calls {
        let to = match &call.target {
            CallTarget::Def(def) => def.symbol_id.clone(),
            CallTarget::Builtin(name) => {
                if !options.include_external {
                    continue;
                }
                SymbolId::builtin(name)
            }
        };
        if let Some(node) = nodes.get_mut(&call.caller.symbol_id) {
            node.calls.push(CallRef {
                symbol: to.clone(),
                range: call.range,
                kind: call.call_type,
            });
        }
        let key = (call.caller.symbol_id.clone(), to.clone(), call.call_type);
        if edge_seen.insert(key) {
            edges.push(CallGraphEdge {
                from: call.caller.symbol_id.clone(),
                to,
                call_type: call.call_type,
            });
        }
    }

    let mut graph = CallGraph {
        nodes,
        edges,
        top_level_nodes: Vec::new(),
    };
    graph.top_level_nodes = compute_top_level(&graph);

    if let Some(max_depth) = options.max_depth {
        apply_max_depth(&mut graph, max_depth);
    }
    graph
}

fn insert_node(nodes: &mut BTreeMap<SymbolId, CallGraphNode>, def: Def) {
    nodes.entry(def.symbol_id.clone()).or_insert_with(|| CallGraphNode {
        symbol: def.symbol_id.clone(),
        is_exported: def.is_exported,
        definition: def,
        calls: Vec::new(),
    });
}

fn compute_top_level(graph: &CallGraph) -> Vec<SymbolId> {
    let with_incoming: HashSet<&SymbolId> = graph
        .edges
        .iter()
        .filter(|e| graph.nodes.contains_key(&e.to))
        .map(|e| &e.to)
        .collect();
    graph
        .nodes
        .keys()
        .filter(|symbol| !with_incoming.contains(symbol))
        .cloned()
        .collect()
}

/// Keep only nodes within `max_depth` hops of a top-level node, and the
/// edges (and call entries) between survivors.
fn apply_max_depth(graph: &mut CallGraph, max_depth: u32) {
    let mut adjacency: HashMap<&SymbolId, Vec<&SymbolId>> = HashMap::new();
    for edge in &graph.edges {
        adjacency.entry(&edge.from).or_default().push(&edge.to);
    }

    let mut kept: HashSet<SymbolId> = HashSet::new();
    let mut queue: VecDeque<(&SymbolId, u32)> = graph
        .top_level_nodes
        .iter()
        .map(|symbol| (symbol, 0u32))
        .collect();
    while let Some((symbol, depth)) = queue.pop_front() {
        if depth > max_depth || !kept.insert(symbol.clone()) {
            continue;
        }
        if let Some(next) = adjacency.get(symbol) {
            for &target in next {
                if graph.nodes.contains_key(target) && !kept.contains(target) {
                    queue.push_back((target, depth + 1));
                }
            }
        }
    }

    graph.nodes.retain(|symbol, _| kept.contains(symbol));
    graph
        .edges
        .retain(|e| kept.contains(&e.from) && (kept.contains(&e.to) || e.to.is_builtin()));
    for node in graph.nodes.values_mut() {
        node.calls
            .retain(|c| kept.contains(&c.symbol) || c.symbol.is_builtin());
    }
    graph.top_level_nodes.retain(|s| kept.contains(s));
}

/// All calls leaving one definition, as resolved [`FunctionCall`]s.
pub fn calls_from_definition(
    def: &Def,
    files: &BTreeMap<String, Arc<FileEntry>>,
    artifacts: &ProjectArtifacts,
    registry: &LanguageRegistry,
) -> Vec<FunctionCall> {
    let Some(entry) = files.get(&def.file_path) else {
        return Vec::new();
    };
    let Some(config) = entry.language.and_then(|l| registry.config_by_name(l)) else {
        return Vec::new();
    };
    extract_file_calls(&def.file_path, entry, config, artifacts)
        .into_iter()
        .filter(|call| call.caller.symbol_id == def.symbol_id)
        .filter_map(|call| match call.target {
            CallTarget::Def(called) => Some(FunctionCall {
                caller_def: call.caller,
                called_def: called,
                call_location: call.range.start,
                is_method_call: call.is_method_call,
            }),
            CallTarget::Builtin(_) => None,
        })
        .collect()
}
