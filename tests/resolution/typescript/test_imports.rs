use crate::common::project_from;

#[test]
/// Resolved imports pair the local name with the exported definition.
fn test_imports_with_definitions() {
    let project = project_from(&[
        ("lib.ts", "export function shared(){}\nexport function other(){}\n"),
        (
            "main.ts",
            "import {shared, other as renamed} from './lib';\nshared();\nrenamed();\n",
        ),
    ]);
    let imports = project.get_imports_with_definitions("main.ts");
    assert_eq!(imports.len(), 2, "imports: {imports:?}");

    let shared = imports.iter().find(|i| i.local_name == "shared").unwrap();
    assert_eq!(shared.definition.symbol_id.as_str(), "lib#shared");

    let renamed = imports.iter().find(|i| i.local_name == "renamed").unwrap();
    assert_eq!(renamed.definition.name, "other");
}

#[test]
/// Default imports match the target file's default export.
fn test_default_import() {
    let project = project_from(&[
        ("proc.ts", "export default function process(){}\n"),
        ("main.ts", "import proc from './proc';\nproc();\n"),
    ]);
    let imports = project.get_imports_with_definitions("main.ts");
    assert_eq!(imports.len(), 1);
    assert_eq!(imports[0].local_name, "proc");
    assert_eq!(imports[0].definition.name, "process");
}

#[test]
/// Imports of names the target does not export are omitted.
fn test_unresolved_import_omitted() {
    let project = project_from(&[
        ("lib.ts", "function hidden(){}\n"),
        ("main.ts", "import {hidden} from './lib';\nimport {gone} from './nope';\n"),
    ]);
    assert!(project.get_imports_with_definitions("main.ts").is_empty());
}

#[test]
/// Bare specifiers (node_modules packages) stay external.
fn test_bare_specifier_unresolved() {
    let project = project_from(&[
        ("main.ts", "import {readFile} from 'fs';\nreadFile();\n"),
    ]);
    assert!(project.get_imports_with_definitions("main.ts").is_empty());
}

#[test]
/// Imports resolve through index files.
fn test_index_file_resolution() {
    let project = project_from(&[
        ("util/index.ts", "export function tool(){}\n"),
        ("main.ts", "import {tool} from './util';\ntool();\n"),
    ]);
    let imports = project.get_imports_with_definitions("main.ts");
    assert_eq!(imports.len(), 1);
    assert_eq!(imports[0].definition.file_path, "util/index.ts");
}

#[test]
/// Relative paths with parent segments resolve against the importer's
/// directory.
fn test_parent_relative_import() {
    let project = project_from(&[
        ("shared/lib.ts", "export function deep(){}\n"),
        (
            "app/main.ts",
            "import {deep} from '../shared/lib';\ndeep();\n",
        ),
    ]);
    let imports = project.get_imports_with_definitions("app/main.ts");
    assert_eq!(imports.len(), 1);
    assert_eq!(imports[0].definition.symbol_id.as_str(), "shared/lib#deep");
}

#[test]
/// The whole-object CommonJS export form is importable; the per-property
/// form is not recognized.
fn test_commonjs_whole_object_export() {
    let project = project_from(&[
        ("cjs.ts", "function f(){}\nmodule.exports = { f };\n"),
        ("main.ts", "import {f} from './cjs';\nf();\n"),
    ]);
    let imports = project.get_imports_with_definitions("main.ts");
    assert_eq!(imports.len(), 1);
    assert_eq!(imports[0].definition.name, "f");
}
