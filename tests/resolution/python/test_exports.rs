use crate::common::project_from;

#[test]
/// Without __all__, underscore-prefixed module names are private and
/// dunder names count as exported.
fn test_underscore_convention() {
    let project = project_from(&[(
        "mod.py",
        "def visible():\n    pass\n\ndef _hidden():\n    pass\n\ndef __dunder__():\n    pass\n",
    )]);
    let exported: Vec<String> = project
        .get_exported_functions("mod.py")
        .into_iter()
        .map(|d| d.name)
        .collect();
    assert!(exported.contains(&"visible".to_string()));
    assert!(exported.contains(&"__dunder__".to_string()));
    assert!(!exported.contains(&"_hidden".to_string()));
}

#[test]
/// With __all__, exactly the listed names are exported.
fn test_dunder_all() {
    let project = project_from(&[(
        "mod.py",
        "__all__ = [\"chosen\"]\n\ndef chosen():\n    pass\n\ndef unlisted():\n    pass\n",
    )]);
    let exported: Vec<String> = project
        .get_exported_functions("mod.py")
        .into_iter()
        .map(|d| d.name)
        .collect();
    assert_eq!(exported, vec!["chosen"]);
}

#[test]
/// Nested functions are never exported.
fn test_nested_defs_not_exported() {
    let project = project_from(&[(
        "mod.py",
        "def outer():\n    def inner():\n        pass\n    return inner\n",
    )]);
    let exported: Vec<String> = project
        .get_exported_functions("mod.py")
        .into_iter()
        .map(|d| d.name)
        .collect();
    assert_eq!(exported, vec!["outer"]);
}
