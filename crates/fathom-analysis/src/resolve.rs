//! Name resolution queries over built scope graphs: go-to-definition,
//! find-references, and the filtered definition projections.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use fathom_core::graph::{EdgeKind, ScopeGraph};
use fathom_core::types::{Def, ImportInfo, Position, Range};

/// One reference occurrence, for find-references results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefLocation {
    pub file_path: String,
    pub range: Range,
}

/// The definition a reference at `pos` points at. A reference resolved to
/// an import follows the import to the exported definition in its source
/// file.
pub fn definition_at(
    graph: &ScopeGraph,
    pos: Position,
    file_imports: &[ImportInfo],
) -> Option<Def> {
    let ref_idx = graph.ref_starting_at(pos)?;
    match graph.resolution_of(ref_idx)? {
        (idx, EdgeKind::RefToDef) => graph.def_value(idx),
        (idx, EdgeKind::RefToImport) => {
            let import = graph.import(idx)?;
            file_imports
                .iter()
                .find(|i| i.import_range == import.range)
                .map(|i| i.definition.clone())
        }
        _ => None,
    }
}

/// All references to the definition at `pos`: same-file references plus
/// references in other files that reach it through an import.
pub fn references_to(
    graph: &ScopeGraph,
    pos: Position,
    graphs: &BTreeMap<String, Arc<ScopeGraph>>,
    imports: &BTreeMap<String, Vec<ImportInfo>>,
) -> Vec<RefLocation> {
    let Some(def_idx) = graph.def_at_position(pos) else {
        return Vec::new();
    };
    let Some(def) = graph.def_value(def_idx) else {
        return Vec::new();
    };

    let mut locations: Vec<RefLocation> = graph
        .refs_of_def(def_idx)
        .into_iter()
        .filter_map(|idx| graph.reference(idx))
        .map(|r| RefLocation {
            file_path: def.file_path.clone(),
            range: r.range,
        })
        .collect();

    for (other_path, file_imports) in imports {
        for info in file_imports {
            if info.definition.symbol_id != def.symbol_id {
                continue;
            }
            let Some(other_graph) = graphs.get(other_path) else {
                continue;
            };
            let Some(import_idx) = other_graph
                .imports()
                .find(|(_, i)| i.range == info.import_range)
                .map(|(idx, _)| idx)
            else {
                continue;
            };
            locations.extend(
                other_graph
                    .refs_of_import(import_idx)
                    .into_iter()
                    .filter_map(|idx| other_graph.reference(idx))
                    .map(|r| RefLocation {
                        file_path: other_path.clone(),
                        range: r.range,
                    }),
            );
        }
    }

    locations.sort_by_key(|l| (l.file_path.clone(), l.range.start_byte));
    locations
}

/// Every definition in a graph, as flat values.
pub fn definitions_in(graph: &ScopeGraph) -> Vec<Def> {
    graph
        .defs()
        .filter_map(|(idx, _)| graph.def_value(idx))
        .collect()
}

/// Function-like definitions only.
pub fn functions_in(graph: &ScopeGraph) -> Vec<Def> {
    graph
        .defs()
        .filter(|(_, d)| d.symbol_kind.is_function_like())
        .filter_map(|(idx, _)| graph.def_value(idx))
        .collect()
}

/// Exported function-like definitions only.
pub fn exported_functions_in(graph: &ScopeGraph) -> Vec<Def> {
    graph
        .defs()
        .filter(|(_, d)| d.is_exported && d.symbol_kind.is_function_like())
        .filter_map(|(idx, _)| graph.def_value(idx))
        .collect()
}
