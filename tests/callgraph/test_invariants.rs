// Quantified call-graph invariants that must hold after every mutation.

use std::collections::BTreeSet;

use fathom_analysis::CallGraphOptions;

use crate::common::project_from;

const FILES: &[(&str, &str)] = &[
    (
        "lib.ts",
        "export function shared(){}\nexport class Widget { render(){} }\n",
    ),
    (
        "main.ts",
        "import {shared, Widget} from './lib';\nfunction local(){ shared(); const w = new Widget(); w.render(); }\nlocal();\n",
    ),
    (
        "util.py",
        "class Helper:\n    def go(self):\n        pass\n\ndef run():\n    h = Helper()\n    h.go()\n",
    ),
];

#[test]
/// Every edge's endpoints are present as nodes (builtins excepted when
/// include_external is on).
fn test_edge_endpoints_exist() {
    let project = project_from(FILES);
    for options in [
        CallGraphOptions::default(),
        CallGraphOptions {
            include_external: true,
            ..CallGraphOptions::default()
        },
    ] {
        let graph = project.get_call_graph(&options);
        for edge in &graph.edges {
            assert!(
                graph.nodes.contains_key(&edge.from),
                "missing caller node {}",
                edge.from
            );
            assert!(
                graph.nodes.contains_key(&edge.to)
                    || (options.include_external && edge.to.is_builtin()),
                "missing callee node {}",
                edge.to
            );
        }
    }
}

#[test]
/// top_level_nodes is exactly the set of nodes with no incoming edge.
fn test_top_level_definition() {
    let project = project_from(FILES);
    let graph = project.extract_call_graph();

    let with_incoming: BTreeSet<_> = graph
        .edges
        .iter()
        .filter(|e| graph.nodes.contains_key(&e.to))
        .map(|e| e.to.clone())
        .collect();
    let expected: BTreeSet<_> = graph
        .nodes
        .keys()
        .filter(|s| !with_incoming.contains(*s))
        .cloned()
        .collect();
    let actual: BTreeSet<_> = graph.top_level_nodes.iter().cloned().collect();
    assert_eq!(actual, expected);
}

#[test]
/// Re-adding a file with identical text yields the same node set and edge
/// multiset.
fn test_re_add_is_deterministic() {
    let project = project_from(FILES);
    let before = project.extract_call_graph();

    let re_added = project
        .add_or_update_file("main.ts", FILES[1].1)
        .expect("re-add");
    let after = re_added.extract_call_graph();

    let before_nodes: BTreeSet<_> = before.nodes.keys().cloned().collect();
    let after_nodes: BTreeSet<_> = after.nodes.keys().cloned().collect();
    assert_eq!(before_nodes, after_nodes);

    let mut before_edges: Vec<_> = before
        .edges
        .iter()
        .map(|e| (e.from.clone(), e.to.clone(), e.call_type))
        .collect();
    let mut after_edges: Vec<_> = after
        .edges
        .iter()
        .map(|e| (e.from.clone(), e.to.clone(), e.call_type))
        .collect();
    before_edges.sort();
    after_edges.sort();
    assert_eq!(before_edges, after_edges);
}

#[test]
/// Project-visible symbol ids (call-graph nodes) are unique by
/// construction: the map is keyed by them, so every definition must map to
/// a distinct id.
fn test_symbol_ids_unique_across_project() {
    let project = project_from(FILES);
    let mut seen = BTreeSet::new();
    for def in project.get_all_definitions() {
        if def.symbol_kind.is_function_like() || def.symbol_kind.is_class_like() {
            assert!(
                seen.insert(def.symbol_id.clone()),
                "duplicate symbol id {}",
                def.symbol_id
            );
        }
    }
}

#[test]
/// Scope-graph structural invariants hold for every file after mutations.
fn test_scope_graph_invariants_after_mutations() {
    let mut project = project_from(FILES);
    project = project
        .add_or_update_file("extra.ts", "export function extra(){}\n")
        .unwrap();
    project = project.remove_file("util.py").unwrap();

    for path in project.file_paths() {
        if let Some(graph) = project.get_scope_graph(&path) {
            graph
                .validate()
                .unwrap_or_else(|problems| panic!("{path}: {problems:?}"));
        }
    }
}
