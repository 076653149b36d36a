// get_call_graph option behavior: max_depth, file_filter, include_external.

use fathom_analysis::CallGraphOptions;

use crate::common::{edge_triples, project_from, top_level_ids};

const CHAIN: &str =
    "function l3(){}\nfunction l2(){ l3(); }\nfunction l1(){ l2(); }\nfunction l0(){ l1(); }\n";

#[test]
/// max_depth keeps nodes within the BFS radius of top-level nodes.
fn test_max_depth_prunes_deep_nodes() {
    let project = project_from(&[("chain.ts", CHAIN)]);
    let graph = project.get_call_graph(&CallGraphOptions {
        max_depth: Some(2),
        ..CallGraphOptions::default()
    });

    assert_eq!(graph.nodes.len(), 3, "kept: {:?}", graph.nodes.keys().collect::<Vec<_>>());
    let edges = edge_triples(&graph);
    assert!(!edges.iter().any(|(_, to, _)| to == "chain#l3"));
    assert_eq!(top_level_ids(&graph), vec!["chain#l0"]);
}

#[test]
/// Without a depth cap the whole chain survives.
fn test_no_depth_cap_keeps_chain() {
    let project = project_from(&[("chain.ts", CHAIN)]);
    let graph = project.extract_call_graph();
    assert_eq!(graph.nodes.len(), 4);
    assert_eq!(graph.edges.len(), 3);
}

#[test]
/// file_filter restricts which files contribute callers, but targets in
/// excluded files still appear as nodes.
fn test_file_filter() {
    let project = project_from(&[
        ("lib.ts", "export function shared(){}\nfunction internal(){ shared(); }\n"),
        (
            "main.ts",
            "import {shared} from './lib';\nfunction local(){ shared(); }\n",
        ),
    ]);
    let graph = project.get_call_graph(&CallGraphOptions {
        file_filter: Some(Box::new(|path: &str| path == "main.ts")),
        ..CallGraphOptions::default()
    });

    let edges = edge_triples(&graph);
    assert!(edges
        .iter()
        .any(|(from, to, _)| from == "main#local" && to == "lib#shared"));
    // lib.ts's own callers are excluded
    assert!(!edges.iter().any(|(from, _, _)| from == "lib#internal"));
    assert!(!graph
        .nodes
        .keys()
        .any(|s| s.as_str() == "lib#internal"));
}

#[test]
/// include_external surfaces calls on unknown receivers as `<builtin>`
/// edges; by default they are suppressed.
fn test_include_external_builtins() {
    let source = "function run(items) { items.push(1); }\n";
    let project = project_from(&[("b.ts", source)]);

    let without = project.extract_call_graph();
    assert!(
        !edge_triples(&without).iter().any(|(_, to, _)| to.starts_with("<builtin>#")),
        "builtin edges must be off by default"
    );

    let with = project.get_call_graph(&CallGraphOptions {
        include_external: true,
        ..CallGraphOptions::default()
    });
    let edges = edge_triples(&with);
    assert!(
        edges.contains(&("b#run".into(), "<builtin>#push".into(), "method".into())),
        "edges: {edges:?}"
    );
    // builtin callees are edge targets only, never nodes
    assert!(!with.nodes.keys().any(|s| s.is_builtin()));
}
