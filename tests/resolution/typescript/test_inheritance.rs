use crate::common::project_from;

fn def_named(project: &fathom_analysis::Project, file: &str, name: &str) -> fathom_core::types::Def {
    project
        .get_definitions(file)
        .into_iter()
        .find(|d| d.name == name)
        .unwrap_or_else(|| panic!("no def {name} in {file}"))
}

#[test]
/// extends/implements clauses resolve to parent and interface definitions.
fn test_class_relationships() {
    let project = project_from(&[(
        "h.ts",
        "interface Runnable { }\nclass Base {}\nclass Child extends Base implements Runnable {}\n",
    )]);
    let child = def_named(&project, "h.ts", "Child");
    let relations = project.get_class_relationships(&child);
    assert_eq!(relations.parent.as_ref().map(|d| d.name.as_str()), Some("Base"));
    assert_eq!(relations.interfaces.len(), 1);
    assert_eq!(relations.interfaces[0].name, "Runnable");
}

#[test]
/// find_subclasses inverts the parent relation.
fn test_find_subclasses() {
    let project = project_from(&[(
        "h.ts",
        "class Base {}\nclass A extends Base {}\nclass B extends Base {}\n",
    )]);
    let base = def_named(&project, "h.ts", "Base");
    let mut names: Vec<String> = project
        .find_subclasses(&base)
        .into_iter()
        .map(|d| d.name)
        .collect();
    names.sort();
    assert_eq!(names, vec!["A", "B"]);
}

#[test]
/// The inheritance chain walks to the root, nearest parent first.
fn test_inheritance_chain_and_is_subclass() {
    let project = project_from(&[(
        "h.ts",
        "class A {}\nclass B extends A {}\nclass C extends B {}\n",
    )]);
    let a = def_named(&project, "h.ts", "A");
    let b = def_named(&project, "h.ts", "B");
    let c = def_named(&project, "h.ts", "C");

    let chain: Vec<String> = project
        .get_inheritance_chain(&c)
        .into_iter()
        .map(|d| d.name)
        .collect();
    assert_eq!(chain, vec!["B", "A"]);

    assert!(project.is_subclass_of(&c, &a));
    assert!(project.is_subclass_of(&b, &a));
    assert!(!project.is_subclass_of(&a, &c));
}

#[test]
/// Parents imported from another file still resolve.
fn test_cross_file_parent() {
    let project = project_from(&[
        ("base.ts", "export class Base {}\n"),
        (
            "child.ts",
            "import {Base} from './base';\nclass Child extends Base {}\n",
        ),
    ]);
    let child = def_named(&project, "child.ts", "Child");
    let relations = project.get_class_relationships(&child);
    assert_eq!(
        relations.parent.map(|d| d.symbol_id.as_str().to_string()),
        Some("base#Base".to_string())
    );
}

#[test]
/// find_implementations lists classes whose implements clause names the
/// interface.
fn test_find_implementations() {
    let project = project_from(&[(
        "h.ts",
        "interface Closeable {}\nclass File implements Closeable {}\nclass Socket implements Closeable {}\n",
    )]);
    let closeable = def_named(&project, "h.ts", "Closeable");
    let mut names: Vec<String> = project
        .find_implementations(&closeable)
        .into_iter()
        .map(|d| d.name)
        .collect();
    names.sort();
    assert_eq!(names, vec!["File", "Socket"]);
}
