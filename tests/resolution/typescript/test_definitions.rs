use fathom_core::types::{Position, SymbolKind};

use crate::common::project_from;

#[test]
/// go_to_definition from a call site lands on the function definition.
fn test_go_to_definition_same_file() {
    let project = project_from(&[(
        "t.ts",
        "function helper() {}\nfunction main() { helper(); }\n",
    )]);
    // `helper()` on line 1 starts at column 18
    let def = project
        .go_to_definition("t.ts", Position::new(1, 18))
        .expect("definition");
    assert_eq!(def.name, "helper");
    assert_eq!(def.range.start, Position::new(0, 9));
}

#[test]
/// go_to_definition through an import returns the exported definition in
/// the source file.
fn test_go_to_definition_through_import() {
    let project = project_from(&[
        ("lib.ts", "export function shared(){}\n"),
        (
            "main.ts",
            "import {shared} from './lib';\nfunction local(){ shared(); }\n",
        ),
    ]);
    let def = project
        .go_to_definition("main.ts", Position::new(1, 18))
        .expect("definition");
    assert_eq!(def.file_path, "lib.ts");
    assert_eq!(def.symbol_id.as_str(), "lib#shared");
}

#[test]
/// find_references collects same-file references and references reaching
/// the definition through imports in other files.
fn test_find_references_cross_file() {
    let project = project_from(&[
        ("lib.ts", "export function shared(){}\nshared();\n"),
        (
            "main.ts",
            "import {shared} from './lib';\nfunction local(){ shared(); }\n",
        ),
    ]);
    // definition of shared at lib.ts 0:16
    let refs = project.find_references("lib.ts", Position::new(0, 16));
    let files: Vec<&str> = refs.iter().map(|r| r.file_path.as_str()).collect();
    assert!(files.contains(&"lib.ts"), "refs: {refs:?}");
    assert!(files.contains(&"main.ts"), "refs: {refs:?}");
}

#[test]
/// Unknown positions and unknown files resolve to nothing, never panic.
fn test_missing_lookups_return_empty() {
    let project = project_from(&[("t.ts", "function f(){}\n")]);
    assert!(project.go_to_definition("t.ts", Position::new(40, 0)).is_none());
    assert!(project.go_to_definition("missing.ts", Position::new(0, 0)).is_none());
    assert!(project.find_references("missing.ts", Position::new(0, 0)).is_empty());
    assert!(project.get_definitions("missing.ts").is_empty());
    assert!(project.get_scope_graph("missing.ts").is_none());
}

#[test]
/// get_functions_in_file and get_exported_functions filter by kind and
/// export flag.
fn test_function_projections() {
    let project = project_from(&[(
        "t.ts",
        "export function pub1(){}\nfunction priv1(){}\nexport const val = 1;\n",
    )]);
    let functions = project.get_functions_in_file("t.ts");
    let names: Vec<&str> = functions.iter().map(|d| d.name.as_str()).collect();
    assert!(names.contains(&"pub1"));
    assert!(names.contains(&"priv1"));
    assert!(!names.contains(&"val"));

    let exported = project.get_exported_functions("t.ts");
    let names: Vec<&str> = exported.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["pub1"]);
}

#[test]
/// An inner `let` shadows the outer binding for references inside the
/// block.
fn test_shadowing() {
    let project = project_from(&[(
        "s.ts",
        "const x = 1;\nfunction f() { let x = 2; return x; }\n",
    )]);
    // `return x` — x at line 1 col 33
    let def = project
        .go_to_definition("s.ts", Position::new(1, 33))
        .expect("definition");
    assert_eq!(def.range.start.row, 1, "must resolve to the inner let");
}

#[test]
/// Metadata carries parameters and async-ness for functions.
fn test_function_metadata() {
    let project = project_from(&[(
        "m.ts",
        "export async function fetchIt(url, options) { return 1; }\n",
    )]);
    let def = project
        .get_functions_in_file("m.ts")
        .into_iter()
        .find(|d| d.name == "fetchIt")
        .expect("def");
    let metadata = def.metadata.expect("metadata");
    assert!(metadata.is_async);
    assert_eq!(metadata.parameter_names, vec!["url", "options"]);
    assert_eq!(def.symbol_kind, SymbolKind::Function);
}

#[test]
/// get_source_with_context returns the full body span.
fn test_source_with_context() {
    let project = project_from(&[(
        "c.ts",
        "function body() { return 42; }\n",
    )]);
    let def = project
        .get_functions_in_file("c.ts")
        .into_iter()
        .find(|d| d.name == "body")
        .unwrap();
    let context = project
        .get_source_with_context(&def, "c.ts")
        .expect("context");
    assert!(context.source.contains("return 42"));
}
