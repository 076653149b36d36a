use crate::common::project_from;

fn def_named(project: &fathom_analysis::Project, file: &str, name: &str) -> fathom_core::types::Def {
    project
        .get_definitions(file)
        .into_iter()
        .find(|d| d.name == name)
        .unwrap_or_else(|| panic!("no def {name} in {file}"))
}

#[test]
/// Trait implementations are collected across impl blocks.
fn test_find_implementations() {
    let project = project_from(&[(
        "jobs.rs",
        "pub trait Runner {\n    fn run(&self);\n}\n\npub struct Fast;\npub struct Slow;\n\nimpl Runner for Fast {\n    fn run(&self) {}\n}\n\nimpl Runner for Slow {\n    fn run(&self) {}\n}\n",
    )]);
    let runner = def_named(&project, "jobs.rs", "Runner");
    let mut names: Vec<String> = project
        .find_implementations(&runner)
        .into_iter()
        .map(|d| d.name)
        .collect();
    names.sort();
    assert_eq!(names, vec!["Fast", "Slow"]);
}

#[test]
/// A struct's implemented traits appear in its relationships.
fn test_class_relationships_via_impls() {
    let project = project_from(&[(
        "jobs.rs",
        "pub trait Runner { fn run(&self); }\npub struct Job;\nimpl Runner for Job { fn run(&self) {} }\n",
    )]);
    let job = def_named(&project, "jobs.rs", "Job");
    let relations = project.get_class_relationships(&job);
    assert!(relations.parent.is_none());
    assert_eq!(relations.interfaces.len(), 1);
    assert_eq!(relations.interfaces[0].name, "Runner");
}

#[test]
/// Traits imported from another file still link implementations.
fn test_cross_file_trait_impl() {
    let project = project_from(&[
        ("traits.rs", "pub trait Encode {\n    fn encode(&self);\n}\n"),
        (
            "codec.rs",
            "use traits::Encode;\n\npub struct Frame;\n\nimpl Encode for Frame {\n    fn encode(&self) {}\n}\n",
        ),
    ]);
    let encode = def_named(&project, "traits.rs", "Encode");
    let implementations = project.find_implementations(&encode);
    assert_eq!(implementations.len(), 1);
    assert_eq!(implementations[0].symbol_id.as_str(), "codec#Frame");
}
