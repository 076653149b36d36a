// get_function_calls / get_calls_from_definition value-level behavior.

use fathom_core::types::Position;

use crate::common::{edge_triples, project_from};

#[test]
/// FunctionCall carries caller, callee, location, and the method flag.
fn test_calls_from_definition_values() {
    let project = project_from(&[(
        "calls.ts",
        "class S { put(x){} }\nfunction helper(){}\nfunction run(){ helper(); const s = new S(); s.put(1); }\n",
    )]);
    let run = project
        .get_functions_in_file("calls.ts")
        .into_iter()
        .find(|d| d.name == "run")
        .expect("run def");

    let calls = project.get_calls_from_definition(&run);
    assert_eq!(calls.len(), 3, "calls: {calls:#?}");
    for call in &calls {
        assert_eq!(call.caller_def.symbol_id.as_str(), "calls#run");
        assert_eq!(call.call_location.row, 2);
    }

    let helper_call = calls
        .iter()
        .find(|c| c.called_def.name == "helper")
        .unwrap();
    assert!(!helper_call.is_method_call);

    let put_call = calls.iter().find(|c| c.called_def.name == "put").unwrap();
    assert!(put_call.is_method_call);
    assert_eq!(put_call.called_def.symbol_id.as_str(), "calls#S.put");
}

#[test]
/// get_function_calls is the same projection as get_calls_from_definition.
fn test_get_function_calls_alias() {
    let project = project_from(&[(
        "a.ts",
        "function leaf(){}\nfunction top(){ leaf(); }\n",
    )]);
    let top = project
        .get_functions_in_file("a.ts")
        .into_iter()
        .find(|d| d.name == "top")
        .unwrap();
    assert_eq!(
        project.get_function_calls(&top),
        project.get_calls_from_definition(&top)
    );
}

#[test]
/// Calls on an unresolved definition location produce nothing.
fn test_calls_for_unknown_definition() {
    let project = project_from(&[("a.ts", "function f(){}\n")]);
    let mut f = project
        .get_functions_in_file("a.ts")
        .into_iter()
        .next()
        .unwrap();
    f.file_path = "missing.ts".into();
    assert!(project.get_calls_from_definition(&f).is_empty());
}

#[test]
/// Python module-level calls land on the `<module>` caller.
fn test_python_module_level_call() {
    let project = project_from(&[(
        "boot.py",
        "def setup():\n    pass\n\nsetup()\n",
    )]);
    let graph = project.extract_call_graph();
    let edges = edge_triples(&graph);
    assert!(
        edges.contains(&("boot#<module>".into(), "boot#setup".into(), "direct".into())),
        "edges: {edges:?}"
    );
}

#[test]
/// Rust module-level calls (const initializers and the like) still classify;
/// calls inside functions never leak to the module caller.
fn test_rust_calls_stay_in_functions() {
    let project = project_from(&[(
        "m.rs",
        "fn leaf() {}\n\nfn top() {\n    leaf();\n}\n",
    )]);
    let graph = project.extract_call_graph();
    let edges = edge_triples(&graph);
    assert!(edges.contains(&("m#top".into(), "m#leaf".into(), "direct".into())));
    assert!(!edges.iter().any(|(from, _, _)| from == "m#<module>"));
}

#[test]
/// go_to_definition and the call graph agree on the same call site.
fn test_resolver_and_call_graph_agree() {
    let project = project_from(&[(
        "agree.ts",
        "function helper(){}\nfunction main(){ helper(); }\n",
    )]);
    let def = project
        .go_to_definition("agree.ts", Position::new(1, 17))
        .expect("definition");

    let main = project
        .get_functions_in_file("agree.ts")
        .into_iter()
        .find(|d| d.name == "main")
        .unwrap();
    let calls = project.get_calls_from_definition(&main);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].called_def.symbol_id, def.symbol_id);
}
