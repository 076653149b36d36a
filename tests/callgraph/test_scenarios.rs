// End-to-end call-graph behavior over literal inputs.

use crate::common::{edge_triples, node_ids, project_from, top_level_ids};

#[test]
/// An intra-file function call produces a single direct edge, and the
/// called function is no longer top-level.
fn test_intra_file_function_call() {
    let project = project_from(&[(
        "test.ts",
        "function helper() { return 42; }\nfunction main() { const r = helper(); return r; }\n",
    )]);
    let graph = project.extract_call_graph();

    let nodes = node_ids(&graph);
    assert!(nodes.contains(&"test#helper".to_string()), "nodes: {nodes:?}");
    assert!(nodes.contains(&"test#main".to_string()));

    let edges = edge_triples(&graph);
    let helper_edges: Vec<_> = edges
        .iter()
        .filter(|(from, to, _)| from == "test#main" && to == "test#helper")
        .collect();
    assert_eq!(helper_edges.len(), 1, "edges: {edges:?}");
    assert_eq!(helper_edges[0].2, "direct");

    assert_eq!(top_level_ids(&graph), vec!["test#main"]);
}

#[test]
/// A method call through `this` resolves against the enclosing class.
fn test_method_call_on_this() {
    let project = project_from(&[("test.ts", "class C { a(){} b(){ this.a(); } }\n")]);
    let graph = project.extract_call_graph();

    let nodes = node_ids(&graph);
    assert!(nodes.contains(&"test#C.a".to_string()), "nodes: {nodes:?}");
    assert!(nodes.contains(&"test#C.b".to_string()));

    let edges = edge_triples(&graph);
    assert!(
        edges.contains(&("test#C.b".into(), "test#C.a".into(), "method".into())),
        "edges: {edges:?}"
    );
    assert_eq!(top_level_ids(&graph), vec!["test#C.b"]);
}

#[test]
/// Imports link callers to exported definitions in other files.
fn test_cross_file_import_call() {
    let project = project_from(&[
        ("lib.ts", "export function shared(){}\n"),
        (
            "main.ts",
            "import {shared} from './lib';\nfunction local(){ shared(); }\n",
        ),
    ]);
    let graph = project.extract_call_graph();

    let nodes = node_ids(&graph);
    assert!(nodes.contains(&"lib#shared".to_string()), "nodes: {nodes:?}");
    assert!(nodes.contains(&"main#local".to_string()));

    let shared_node = &graph.nodes[&fathom_core::symbol::SymbolId::from_raw("lib#shared".into())];
    assert!(shared_node.is_exported);

    let edges = edge_triples(&graph);
    assert!(
        edges
            .iter()
            .any(|(from, to, _)| from == "main#local" && to == "lib#shared"),
        "edges: {edges:?}"
    );

    let top = top_level_ids(&graph);
    assert!(top.contains(&"main#local".to_string()));
    assert!(!top.contains(&"lib#shared".to_string()));
}

#[test]
/// Calls outside any function body are attributed to the synthetic
/// `<module>` definition.
fn test_module_level_call() {
    let project = project_from(&[("app.ts", "function setup(){}\nsetup();\n")]);
    let graph = project.extract_call_graph();

    let edges = edge_triples(&graph);
    assert!(
        edges
            .iter()
            .any(|(from, to, _)| from == "app#<module>" && to == "app#setup"),
        "edges: {edges:?}"
    );
    assert!(!top_level_ids(&graph).contains(&"app#setup".to_string()));
}

#[test]
/// A constructor assignment binds the variable's class, and method calls on
/// the variable resolve through that binding.
fn test_method_resolution_through_local_variable() {
    let project = project_from(&[(
        "builder.ts",
        "class G { insert(x){} }\nfunction build(){ const g = new G(); g.insert(\"x\"); }\n",
    )]);
    let graph = project.extract_call_graph();

    let edges = edge_triples(&graph);
    assert!(
        edges.contains(&("builder#build".into(), "builder#G".into(), "constructor".into())),
        "edges: {edges:?}"
    );
    assert!(
        edges.contains(&("builder#build".into(), "builder#G.insert".into(), "method".into())),
        "edges: {edges:?}"
    );
}

#[test]
/// Reassignment moves the binding: calls after `o = new B()` resolve
/// against B, and a method B does not have produces no edge.
fn test_reassignment_sensitive_resolution() {
    let project = project_from(&[(
        "re.ts",
        "class A { a(){} }  class B { b(){} }\nfunction t(){ let o = new A(); o.a(); o = new B(); o.b(); o.a(); }\n",
    )]);
    let graph = project.extract_call_graph();

    let a_node = &graph.nodes[&fathom_core::symbol::SymbolId::from_raw("re#t".into())];
    let calls_to_a_a = a_node
        .calls
        .iter()
        .filter(|c| c.symbol.as_str() == "re#A.a")
        .count();
    let calls_to_b_b = a_node
        .calls
        .iter()
        .filter(|c| c.symbol.as_str() == "re#B.b")
        .count();
    assert_eq!(calls_to_a_a, 1, "calls: {:?}", a_node.calls);
    assert_eq!(calls_to_b_b, 1);
}

#[test]
/// Recursion is an ordinary edge from a definition to itself.
fn test_recursion_is_normal() {
    let project = project_from(&[(
        "rec.ts",
        "function again(n) { if (n > 0) { again(n - 1); } }\n",
    )]);
    let graph = project.extract_call_graph();
    let edges = edge_triples(&graph);
    assert!(edges.contains(&("rec#again".into(), "rec#again".into(), "direct".into())));
    // a self-edge counts as incoming, so the function is not top-level
    assert!(!top_level_ids(&graph).contains(&"rec#again".to_string()));
}

#[test]
/// Calls in nested function bodies are attributed to the nested function,
/// not the outer one.
fn test_nested_function_attribution() {
    let project = project_from(&[(
        "nest.ts",
        "function target(){}\nfunction outer(){ function inner(){ target(); } inner(); }\n",
    )]);
    let graph = project.extract_call_graph();
    let edges = edge_triples(&graph);
    assert!(
        edges.contains(&("nest#inner".into(), "nest#target".into(), "direct".into())),
        "edges: {edges:?}"
    );
    assert!(
        !edges
            .iter()
            .any(|(from, to, _)| from == "nest#outer" && to == "nest#target"),
        "outer must not own inner's call: {edges:?}"
    );
    assert!(edges.contains(&("nest#outer".into(), "nest#inner".into(), "direct".into())));
}

#[test]
/// Python: calling a class binds the variable and later method calls
/// resolve through it.
fn test_python_constructor_and_method() {
    let project = project_from(&[(
        "store.py",
        "class Store:\n    def insert(self, x):\n        pass\n\ndef build():\n    s = Store()\n    s.insert(1)\n",
    )]);
    let graph = project.extract_call_graph();
    let edges = edge_triples(&graph);
    assert!(
        edges.contains(&("store#build".into(), "store#Store".into(), "constructor".into())),
        "edges: {edges:?}"
    );
    assert!(
        edges.contains(&("store#build".into(), "store#Store.insert".into(), "method".into())),
        "edges: {edges:?}"
    );
}

#[test]
/// Python: `self.helper()` resolves against the enclosing class.
fn test_python_self_method() {
    let project = project_from(&[(
        "svc.py",
        "class Svc:\n    def helper(self):\n        pass\n    def run(self):\n        self.helper()\n",
    )]);
    let graph = project.extract_call_graph();
    let edges = edge_triples(&graph);
    assert!(
        edges.contains(&("svc#Svc.run".into(), "svc#Svc.helper".into(), "method".into())),
        "edges: {edges:?}"
    );
}

#[test]
/// Rust: `Store::new()` is the constructor form; method calls on the bound
/// variable resolve through the impl.
fn test_rust_associated_new_and_method() {
    let project = project_from(&[(
        "store.rs",
        "pub struct Store;\n\nimpl Store {\n    pub fn new() -> Store { Store }\n    pub fn insert(&self, x: u32) {}\n}\n\npub fn build() {\n    let s = Store::new();\n    s.insert(1);\n}\n",
    )]);
    let graph = project.extract_call_graph();
    let edges = edge_triples(&graph);
    assert!(
        edges.contains(&("store#build".into(), "store#Store".into(), "constructor".into())),
        "edges: {edges:?}"
    );
    assert!(
        edges.contains(&("store#build".into(), "store#Store.insert".into(), "method".into())),
        "edges: {edges:?}"
    );
}

#[test]
/// Rust: cross-file call through a `use` declaration.
fn test_rust_cross_file_use() {
    let project = project_from(&[
        ("helpers.rs", "pub fn shared() {}\n"),
        ("main.rs", "use helpers::shared;\n\nfn main() { shared(); }\n"),
    ]);
    let graph = project.extract_call_graph();
    let edges = edge_triples(&graph);
    assert!(
        edges
            .iter()
            .any(|(from, to, _)| from == "main#main" && to == "helpers#shared"),
        "edges: {edges:?}"
    );
}

#[test]
/// Python: cross-file call through `from … import`.
fn test_python_cross_file_import() {
    let project = project_from(&[
        ("helpers.py", "def shared():\n    pass\n"),
        (
            "main.py",
            "from helpers import shared\n\ndef local():\n    shared()\n",
        ),
    ]);
    let graph = project.extract_call_graph();
    let edges = edge_triples(&graph);
    assert!(
        edges
            .iter()
            .any(|(from, to, _)| from == "main#local" && to == "helpers#shared"),
        "edges: {edges:?}"
    );
}
