use fathom_core::types::{Position, SymbolKind};

use crate::common::project_from;

#[test]
/// Any `pub` variant marks an item exported; private items are not.
fn test_visibility_export() {
    let project = project_from(&[(
        "lib.rs",
        "pub fn open() {}\npub(crate) fn scoped() {}\nfn private_fn() {}\n",
    )]);
    let exported: Vec<String> = project
        .get_exported_functions("lib.rs")
        .into_iter()
        .map(|d| d.name)
        .collect();
    assert!(exported.contains(&"open".to_string()));
    assert!(exported.contains(&"scoped".to_string()));
    assert!(!exported.contains(&"private_fn".to_string()));
}

#[test]
/// `pub` items inside a private module are still marked exported; the
/// annotation does not consult nesting.
fn test_pub_in_private_module_still_exported() {
    let project = project_from(&[(
        "lib.rs",
        "mod inner {\n    pub fn reachable() {}\n    fn hidden() {}\n}\n",
    )]);
    let defs = project.get_definitions("lib.rs");
    let reachable = defs.iter().find(|d| d.name == "reachable").unwrap();
    let hidden = defs.iter().find(|d| d.name == "hidden").unwrap();
    assert!(reachable.is_exported);
    assert!(!hidden.is_exported);
}

#[test]
/// go_to_definition resolves a call through a `use` import.
fn test_go_to_definition_through_use() {
    let project = project_from(&[
        ("helpers.rs", "pub fn shared() {}\n"),
        ("main.rs", "use helpers::shared;\n\nfn main() { shared(); }\n"),
    ]);
    // `shared()` on line 2 starts at column 12
    let def = project
        .go_to_definition("main.rs", Position::new(2, 12))
        .expect("definition");
    assert_eq!(def.symbol_id.as_str(), "helpers#shared");
}

#[test]
/// Struct and enum definitions carry their kinds and type-namespace refs
/// resolve to them.
fn test_type_definitions() {
    let project = project_from(&[(
        "types.rs",
        "pub struct Config;\npub enum Mode { On, Off }\npub fn apply(c: Config, m: Mode) {}\n",
    )]);
    let defs = project.get_definitions("types.rs");
    let config = defs.iter().find(|d| d.name == "Config").unwrap();
    let mode = defs.iter().find(|d| d.name == "Mode").unwrap();
    assert_eq!(config.symbol_kind, SymbolKind::Struct);
    assert_eq!(mode.symbol_kind, SymbolKind::Enum);

    // the annotation `c: Config` references the struct
    let refs = project.find_references("types.rs", Position::new(0, 11));
    assert!(!refs.is_empty(), "type annotation should reference Config");
}

#[test]
/// Impl methods carry the implemented type as container.
fn test_impl_method_container() {
    let project = project_from(&[(
        "w.rs",
        "pub struct Widget;\n\nimpl Widget {\n    pub fn draw(&self) {}\n}\n",
    )]);
    let draw = project
        .get_definitions("w.rs")
        .into_iter()
        .find(|d| d.name == "draw")
        .unwrap();
    assert_eq!(draw.symbol_kind, SymbolKind::Method);
    assert_eq!(draw.symbol_id.as_str(), "w#Widget.draw");
}

#[test]
/// Renamed use imports keep the original export name.
fn test_use_as_rename() {
    let project = project_from(&[
        ("helpers.rs", "pub fn original() {}\n"),
        (
            "main.rs",
            "use helpers::original as renamed;\n\nfn main() { renamed(); }\n",
        ),
    ]);
    let imports = project.get_imports_with_definitions("main.rs");
    assert_eq!(imports.len(), 1);
    assert_eq!(imports[0].local_name, "renamed");
    assert_eq!(imports[0].definition.name, "original");
}
