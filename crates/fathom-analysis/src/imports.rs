//! Import resolution: map an import's source-module string to a project
//! file, then match the imported name against that file's exports.

use std::collections::BTreeMap;
use std::sync::Arc;

use fathom_core::graph::{LocalImport, ScopeGraph};
use fathom_core::types::Def;
use fathom_parsers::registry::ModulePathStyle;

/// Candidate extensions probed for TS/JS relative imports, in order.
const TS_PROBE_SUFFIXES: &[&str] = &[
    "", ".ts", ".tsx", ".js", ".jsx", ".mjs", ".cjs", "/index.ts", "/index.tsx", "/index.js",
];

/// The directory part of a project-relative path (`""` for the root).
fn dir_of(path: &str) -> &str {
    path.rsplit_once('/').map(|(d, _)| d).unwrap_or("")
}

/// Join a relative path onto a directory, resolving `.` and `..` segments
/// lexically.
fn join_relative(dir: &str, rel: &str) -> String {
    let mut segments: Vec<&str> = dir.split('/').filter(|s| !s.is_empty()).collect();
    for part in rel.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Resolve an import's source-module string to a file present in the
/// project. Returns `None` for bare specifiers and externals.
pub fn resolve_module_path<F>(
    importer: &str,
    source_module: &str,
    style: ModulePathStyle,
    has_file: F,
) -> Option<String>
where
    F: Fn(&str) -> bool,
{
    match style {
        ModulePathStyle::Relative => {
            if !source_module.starts_with('.') {
                return None;
            }
            let base = join_relative(dir_of(importer), source_module);
            for suffix in TS_PROBE_SUFFIXES {
                let candidate = format!("{base}{suffix}");
                if has_file(&candidate) {
                    return Some(candidate);
                }
            }
            None
        }
        ModulePathStyle::Dotted => {
            let dots = source_module.chars().take_while(|c| *c == '.').count();
            let rest = &source_module[dots..];
            let rel = rest.replace('.', "/");

            let mut bases = Vec::new();
            if dots == 0 {
                // absolute: project root first, importer's directory second
                bases.push(rel.clone());
                bases.push(join_relative(dir_of(importer), &rel));
            } else {
                // one leading dot is the importer's package; each further
                // dot ascends one directory
                let mut dir = dir_of(importer).to_string();
                for _ in 1..dots {
                    dir = dir_of(&dir).to_string();
                }
                bases.push(join_relative(&dir, &rel));
            }

            for base in bases {
                let trimmed = base.trim_end_matches('/');
                if trimmed.is_empty() {
                    continue;
                }
                for candidate in [format!("{trimmed}.py"), format!("{trimmed}/__init__.py")] {
                    if has_file(&candidate) {
                        return Some(candidate);
                    }
                }
            }
            None
        }
        ModulePathStyle::Sibling => {
            let path = source_module
                .trim_start_matches("crate::")
                .trim_start_matches("self::")
                .trim_start_matches("super::");
            let name = path.rsplit("::").next()?;
            if name.is_empty() {
                return None;
            }
            let dir = dir_of(importer);
            for candidate in [
                join_relative(dir, &format!("{name}.rs")),
                join_relative(dir, &format!("{name}/mod.rs")),
            ] {
                if has_file(&candidate) {
                    return Some(candidate);
                }
            }
            None
        }
    }
}

/// Find the exported definition an import binds to: the renamed source name
/// when present, the local name otherwise, and the target file's default
/// export for default imports.
pub fn resolve_import_target(
    import: &LocalImport,
    importer: &str,
    style: ModulePathStyle,
    graphs: &BTreeMap<String, Arc<ScopeGraph>>,
) -> Option<Def> {
    let source_module = import.source_module.as_deref()?;
    let target_file =
        resolve_module_path(importer, source_module, style, |p| graphs.contains_key(p))?;
    let graph = graphs.get(&target_file)?;

    if import.source_name.as_deref() == Some("default") {
        return graph.default_export().and_then(|idx| graph.def_value(idx));
    }

    let wanted = import.source_name.as_deref().unwrap_or(&import.name);
    graph
        .defs()
        .find(|(_, d)| d.is_exported && d.name == wanted)
        .and_then(|(idx, _)| graph.def_value(idx))
}
