#![allow(dead_code)]

use fathom_analysis::Project;

/// Build a project from literal (path, source) pairs.
pub fn project_from(files: &[(&str, &str)]) -> Project {
    let mut project = Project::new().expect("empty project");
    for (path, text) in files {
        project = project
            .add_or_update_file(path, text)
            .unwrap_or_else(|e| panic!("add {path}: {e}"));
    }
    project
}

/// Symbol-id strings of a call graph's nodes.
pub fn node_ids(graph: &fathom_core::types::CallGraph) -> Vec<String> {
    graph.nodes.keys().map(|s| s.as_str().to_string()).collect()
}

/// (from, to, call_type) triples of a call graph's edges.
pub fn edge_triples(graph: &fathom_core::types::CallGraph) -> Vec<(String, String, String)> {
    graph
        .edges
        .iter()
        .map(|e| {
            (
                e.from.as_str().to_string(),
                e.to.as_str().to_string(),
                e.call_type.as_str().to_string(),
            )
        })
        .collect()
}

pub fn top_level_ids(graph: &fathom_core::types::CallGraph) -> Vec<String> {
    graph
        .top_level_nodes
        .iter()
        .map(|s| s.as_str().to_string())
        .collect()
}
