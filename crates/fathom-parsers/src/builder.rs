//! Scope-graph builder: runs a language's scope query over a CST and turns
//! the capture stream into a populated [`ScopeGraph`].
//!
//! Construction order matters: scopes outermost-first, then imports, then
//! definitions, then references (resolution happens at reference-insertion
//! time). A final annotation pass attaches enclosing ranges, containers,
//! export flags, metadata, and symbol ids.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, QueryCursor, Tree};

use fathom_core::diagnostics::Diagnostic;
use fathom_core::graph::{LocalDef, LocalImport, LocalRef, LocalScope, ScopeGraph, Scoping};
use fathom_core::symbol::{anonymous_name, qualified_name, SymbolId};
use fathom_core::types::{DefMetadata, Range, SymbolKind};

use crate::cst::{node_at_range, node_range};
use crate::registry::{ExportPolicy, LanguageConfig};
use crate::{python, rust_lang, typescript};

#[derive(Clone, Copy)]
struct DefCapture {
    kind: SymbolKind,
    scoping: Scoping,
}

/// Partition of the query's capture indices by the intent their names encode.
struct CaptureTable {
    scopes: HashSet<u32>,
    defs: HashMap<u32, DefCapture>,
    imports: HashSet<u32>,
    refs: HashMap<u32, Option<u32>>,
}

fn partition_captures(
    config: &LanguageConfig,
    file_path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> CaptureTable {
    let mut table = CaptureTable {
        scopes: HashSet::new(),
        defs: HashMap::new(),
        imports: HashSet::new(),
        refs: HashMap::new(),
    };

    for (i, name) in config.query.capture_names().iter().enumerate() {
        let i = i as u32;
        let parts: Vec<&str> = name.split('.').collect();
        match parts.as_slice() {
            ["local", "scope"] => {
                table.scopes.insert(i);
            }
            ["local", "import"] => {
                table.imports.insert(i);
            }
            [scoping, "definition", kind] => {
                match (Scoping::from_str(scoping), SymbolKind::from_str(kind)) {
                    (Ok(scoping), Ok(kind)) => {
                        table.defs.insert(i, DefCapture { kind, scoping });
                    }
                    _ => diagnostics.push(Diagnostic::warning(
                        Some(file_path),
                        format!("dropped invalid query capture @{name}"),
                    )),
                }
            }
            ["local", "reference"] => {
                table.refs.insert(i, None);
            }
            [ns, "reference"] => match config.namespace_index(ns) {
                Some(idx) => {
                    table.refs.insert(i, Some(idx));
                }
                None => diagnostics.push(Diagnostic::warning(
                    Some(file_path),
                    format!("dropped reference capture with unknown namespace @{name}"),
                )),
            },
            _ if name.starts_with('_') => {}
            _ => diagnostics.push(Diagnostic::warning(
                Some(file_path),
                format!("dropped unrecognized query capture @{name}"),
            )),
        }
    }
    table
}

/// Method beats function when two definition patterns capture the same
/// identifier (a Rust impl fn matches both the plain and the impl pattern).
fn def_precedence(kind: SymbolKind) -> u8 {
    match kind {
        SymbolKind::Constructor => 3,
        SymbolKind::Method => 2,
        _ => 1,
    }
}

/// Build the scope graph for one file.
pub fn build_scope_graph(
    tree: &Tree,
    source: &str,
    file_path: &str,
    config: &LanguageConfig,
    diagnostics: &mut Vec<Diagnostic>,
) -> ScopeGraph {
    let root_node = tree.root_node();
    let table = partition_captures(config, file_path, diagnostics);

    // Flatten the capture stream into per-intent buckets. A node captured by
    // several patterns under the same capture appears once.
    let mut seen: HashSet<(u32, u32, u32)> = HashSet::new();
    let mut scope_nodes: Vec<(Range, String)> = Vec::new();
    let mut def_nodes: HashMap<Range, DefCapture> = HashMap::new();
    let mut import_nodes: Vec<Range> = Vec::new();
    let mut ref_nodes: Vec<(Range, Option<u32>)> = Vec::new();

    let mut cursor = QueryCursor::new();
    let mut captures = cursor.captures(&config.query, root_node, source.as_bytes());
    while let Some((mat, capture_idx)) = captures.next() {
        let capture = mat.captures[*capture_idx];
        let index = capture.index;
        let range = node_range(&capture.node);
        if !seen.insert((index, range.start_byte, range.end_byte)) {
            continue;
        }
        if table.scopes.contains(&index) {
            scope_nodes.push((range, capture.node.kind().to_string()));
        } else if let Some(def) = table.defs.get(&index) {
            def_nodes
                .entry(range)
                .and_modify(|existing| {
                    if def_precedence(def.kind) > def_precedence(existing.kind) {
                        *existing = *def;
                    }
                })
                .or_insert(*def);
        } else if table.imports.contains(&index) {
            import_nodes.push(range);
        } else if let Some(ns) = table.refs.get(&index) {
            ref_nodes.push((range, *ns));
        }
    }

    let mut graph = ScopeGraph::new(node_range(&root_node), file_path, config.name);

    // Scopes outermost-first so parents exist before their children link in.
    scope_nodes.sort_by_key(|(r, _)| (r.start_byte, std::cmp::Reverse(r.end_byte)));
    for (range, node_kind) in scope_nodes {
        graph.insert_local_scope(LocalScope { range, node_kind });
    }

    for range in import_nodes {
        let parts = node_at_range(root_node, range)
            .map(|n| (config.import_parts)(n, source))
            .unwrap_or_default();
        graph.insert_import(LocalImport {
            range,
            name: range.text(source).to_string(),
            source_name: parts.source_name,
            source_module: parts.source_module,
        });
    }

    let mut defs: Vec<(Range, DefCapture)> = def_nodes.into_iter().collect();
    defs.sort_by_key(|(r, _)| r.start_byte);
    for (range, capture) in defs {
        let name = range.text(source).to_string();
        let namespace = config.namespace_of_kind(capture.kind);
        graph.insert_def(
            LocalDef::new(range, name, capture.kind, namespace),
            capture.scoping,
            config.block_scope_kinds,
        );
    }

    ref_nodes.sort_by_key(|(r, _)| r.start_byte);
    for (range, namespace) in ref_nodes {
        if graph.binding_at_range(range) {
            continue;
        }
        graph.insert_ref(LocalRef {
            range,
            name: range.text(source).to_string(),
            namespace,
        });
    }

    annotate(&mut graph, root_node, source, file_path, config);
    graph
}

/// Find the CST node that *defines* an identifier captured at `range`: the
/// nearest ancestor whose binding field is exactly the identifier's range.
/// Also used by the analyzer to reach a definition's item node.
pub fn defining_item<'t>(root: Node<'t>, range: Range) -> Option<Node<'t>> {
    node_at_range(root, range).and_then(|leaf| find_defining_item(leaf, range))
}

fn find_defining_item<'t>(leaf: Node<'t>, range: Range) -> Option<Node<'t>> {
    const BINDING_FIELDS: [&str; 4] = ["name", "pattern", "alias", "left"];
    let mut current = leaf;
    for _ in 0..6 {
        let parent = current.parent()?;
        for field in BINDING_FIELDS {
            if let Some(child) = parent.child_by_field_name(field) {
                if child.start_byte() == range.start_byte as usize
                    && child.end_byte() == range.end_byte as usize
                {
                    return Some(parent);
                }
            }
        }
        current = parent;
    }
    None
}

/// Post-build pass: enclosing ranges, containers, kinds, exports, metadata,
/// symbol ids, and the file's default export.
fn annotate(
    graph: &mut ScopeGraph,
    root_node: Node<'_>,
    source: &str,
    file_path: &str,
    config: &LanguageConfig,
) {
    let py_all = match config.export_policy {
        ExportPolicy::PythonConvention => python::dunder_all(root_node, source),
        _ => None,
    };
    let es_exports = match config.export_policy {
        ExportPolicy::EsModule => Some(typescript::exported_names(root_node, source)),
        _ => None,
    };

    let def_indices: Vec<_> = graph.defs().map(|(idx, _)| idx).collect();
    let root = graph.root();

    for idx in def_indices {
        let (range, name, mut kind) = {
            let d = graph.def(idx).expect("def index");
            (d.range, d.name.clone(), d.symbol_kind)
        };
        let leaf = node_at_range(root_node, range);
        let item = leaf.and_then(|n| find_defining_item(n, range));

        let container = item.and_then(|n| (config.method_container)(n, source));
        if container.is_some() && kind == SymbolKind::Function {
            kind = SymbolKind::Method;
        }
        if kind == SymbolKind::Method
            && name == "constructor"
            && config.export_policy == ExportPolicy::EsModule
        {
            kind = SymbolKind::Constructor;
        }

        // Variable-bound anonymous function expressions keep kind
        // variable/const/let and get no enclosing range.
        let enclosing_range = if kind.is_function_like() || kind.is_class_like() {
            item.map(|item_node| {
                let outer = match item_node.parent() {
                    Some(p) if p.kind() == "decorated_definition" => p,
                    _ => item_node,
                };
                node_range(&outer)
            })
        } else {
            None
        };

        let at_root = graph.scope_of(idx) == Some(root);
        let is_exported = match config.export_policy {
            ExportPolicy::EsModule => {
                at_root
                    && item.is_some_and(|n| {
                        typescript::is_def_exported(
                            n,
                            &name,
                            es_exports.as_ref().expect("es export index"),
                        )
                    })
            }
            ExportPolicy::PythonConvention => {
                at_root && python::is_name_exported(py_all.as_ref(), &name)
            }
            // Any `pub` marks the item exported, even inside a private
            // module. Nesting is not consulted.
            ExportPolicy::RustVisibility => item.is_some_and(rust_lang::has_visibility),
        };

        let is_default = config.export_policy == ExportPolicy::EsModule
            && item.is_some_and(typescript::is_default_export);

        let context = match (config.extract_context, item) {
            (Some(hook), Some(item_node)) if kind.is_function_like() || kind.is_class_like() => {
                Some(hook(item_node, source, &name))
            }
            _ => None,
        };

        let display_name = if name.is_empty() {
            anonymous_name(range.start.row, range.start.column)
        } else {
            name.clone()
        };
        let symbol_id = SymbolId::new(
            file_path,
            &qualified_name(&display_name, container.as_deref()),
        );

        let metadata = context.as_ref().map(|ctx| {
            let span = enclosing_range.unwrap_or(range);
            DefMetadata {
                line_count: span.end.row - span.start.row + 1,
                parameter_names: ctx.parameter_names.clone(),
                is_async: ctx.is_async,
                is_test: ctx.is_test,
                is_private: ctx.is_private,
                parent_class: container.clone(),
                decorators: ctx.decorators.clone(),
            }
        });

        let d = graph.def_mut(idx).expect("def index");
        d.symbol_kind = kind;
        d.enclosing_range = enclosing_range;
        d.is_exported = is_exported;
        d.symbol_id = Some(symbol_id);
        if let Some(ctx) = context {
            d.signature = ctx.signature;
            d.docstring = ctx.docstring;
        }
        d.metadata = metadata;
        if is_default {
            graph.set_default_export(idx);
        }
    }
}
