use fathom_core::types::Position;

use crate::common::project_from;

#[test]
/// A call site resolves to the module-level def.
fn test_go_to_definition() {
    let project = project_from(&[(
        "m.py",
        "def helper():\n    pass\n\ndef main():\n    helper()\n",
    )]);
    // `helper()` on line 4 starts at column 4
    let def = project
        .go_to_definition("m.py", Position::new(4, 4))
        .expect("definition");
    assert_eq!(def.name, "helper");
    assert_eq!(def.range.start.row, 0);
}

#[test]
/// Dotted module paths resolve within the project tree.
fn test_package_import_resolution() {
    let project = project_from(&[
        ("pkg/helpers.py", "def shared():\n    pass\n"),
        (
            "main.py",
            "from pkg.helpers import shared\n\ndef run():\n    shared()\n",
        ),
    ]);
    let imports = project.get_imports_with_definitions("main.py");
    assert_eq!(imports.len(), 1);
    assert_eq!(imports[0].definition.symbol_id.as_str(), "pkg/helpers#shared");
}

#[test]
/// Renamed imports keep the original export name as the match key.
fn test_aliased_import() {
    let project = project_from(&[
        ("util.py", "def original():\n    pass\n"),
        (
            "main.py",
            "from util import original as alias\n\ndef run():\n    alias()\n",
        ),
    ]);
    let imports = project.get_imports_with_definitions("main.py");
    assert_eq!(imports.len(), 1);
    assert_eq!(imports[0].local_name, "alias");
    assert_eq!(imports[0].definition.name, "original");
}

#[test]
/// A relative import resolves against the importer's package directory.
fn test_relative_import() {
    let project = project_from(&[
        ("pkg/sibling.py", "def near():\n    pass\n"),
        (
            "pkg/mod.py",
            "from .sibling import near\n\ndef run():\n    near()\n",
        ),
    ]);
    let imports = project.get_imports_with_definitions("pkg/mod.py");
    assert_eq!(imports.len(), 1);
    assert_eq!(imports[0].definition.file_path, "pkg/sibling.py");
}

#[test]
/// Method definitions get qualified symbol ids and docstrings.
fn test_method_metadata() {
    let project = project_from(&[(
        "svc.py",
        "class Svc:\n    def run(self):\n        \"\"\"Runs it.\"\"\"\n        pass\n",
    )]);
    let run = project
        .get_definitions("svc.py")
        .into_iter()
        .find(|d| d.name == "run")
        .expect("run def");
    assert_eq!(run.symbol_id.as_str(), "svc#Svc.run");
    assert_eq!(run.docstring.as_deref(), Some("Runs it."));
    assert_eq!(
        run.metadata.unwrap().parent_class.as_deref(),
        Some("Svc")
    );
}
