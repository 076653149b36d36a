//! Python policy: `__all__`/underscore export convention, dotted imports,
//! call classification, containers, and context extraction.

use std::collections::HashSet;

use tree_sitter::Node;

use fathom_core::types::SymbolKind;

use crate::cst::node_text;
use crate::registry::{
    CallShape, ClassRelations, DefContext, ExportPolicy, ImportParts, LanguageConfig,
    ModulePathStyle, Namespace, RegistryError,
};

const NAMESPACES: &[Namespace] = &[Namespace {
    name: "value",
    kinds: &[
        SymbolKind::Function,
        SymbolKind::Method,
        SymbolKind::Generator,
        SymbolKind::Class,
        SymbolKind::Variable,
        SymbolKind::Const,
        SymbolKind::Let,
        SymbolKind::Constant,
        SymbolKind::Import,
        SymbolKind::Constructor,
        SymbolKind::Interface,
        SymbolKind::Enum,
        SymbolKind::Struct,
        SymbolKind::Trait,
        SymbolKind::Module,
    ],
}];

pub fn language_config() -> Result<LanguageConfig, RegistryError> {
    let language: tree_sitter::Language = tree_sitter_python::LANGUAGE.into();
    let query = crate::registry::compile_query(&language, "python")?;
    Ok(LanguageConfig {
        name: "python",
        display_name: "Python",
        extensions: &["py", "pyi"],
        language,
        query,
        namespaces: NAMESPACES,
        receiver_synonyms: &["self", "cls"],
        // Python scoping is function-level; nothing block-like to walk past.
        block_scope_kinds: &[],
        export_policy: ExportPolicy::PythonConvention,
        module_path_style: ModulePathStyle::Dotted,
        call_on_class_is_constructor: true,
        import_parts,
        classify_call,
        method_container,
        extract_context: Some(extract_context),
        class_relations,
        collect_trait_impls: None,
    })
}

// ---------------------------------------------------------------------------
// Exports
// ---------------------------------------------------------------------------

/// The names listed in a module-level `__all__ = [...]`, when present.
pub fn dunder_all(root: Node<'_>, source: &str) -> Option<HashSet<String>> {
    let mut cursor = root.walk();
    for stmt in root.named_children(&mut cursor) {
        if stmt.kind() != "expression_statement" {
            continue;
        }
        let Some(assignment) = stmt.named_child(0) else {
            continue;
        };
        if assignment.kind() != "assignment" {
            continue;
        }
        let Some(left) = assignment.child_by_field_name("left") else {
            continue;
        };
        if node_text(&left, source) != "__all__" {
            continue;
        }
        let Some(right) = assignment.child_by_field_name("right") else {
            continue;
        };
        if right.kind() != "list" {
            continue;
        }
        let mut names = HashSet::new();
        let mut list_cursor = right.walk();
        for entry in right.named_children(&mut list_cursor) {
            if entry.kind() == "string" {
                names.insert(trim_string_literal(node_text(&entry, source)));
            }
        }
        return Some(names);
    }
    None
}

/// With `__all__`, exactly its names are exported. Without it, names not
/// starting with an underscore are exported; dunder names count as exported.
pub fn is_name_exported(all: Option<&HashSet<String>>, name: &str) -> bool {
    match all {
        Some(names) => names.contains(name),
        None => {
            !name.starts_with('_') || (name.starts_with("__") && name.ends_with("__"))
        }
    }
}

fn trim_string_literal(raw: &str) -> String {
    raw.trim_matches(|c| c == '"' || c == '\'').to_string()
}

// ---------------------------------------------------------------------------
// Imports
// ---------------------------------------------------------------------------

fn import_parts(binding: Node<'_>, source: &str) -> ImportParts {
    let mut parts = ImportParts::default();
    let Some(parent) = binding.parent() else {
        return parts;
    };

    match parent.kind() {
        "dotted_name" => match parent.parent().map(|p| p.kind()) {
            // `import a.b` — the module is the full dotted path
            Some("import_statement") => {
                parts.source_module = Some(node_text(&parent, source).to_string());
            }
            // `from m import a`
            Some("import_from_statement") => {
                parts.source_module = parent
                    .parent()
                    .and_then(|p| p.child_by_field_name("module_name"))
                    .map(|m| node_text(&m, source).to_string());
            }
            _ => {}
        },
        "as_pattern_target" => {}
        "aliased_import" => {
            let name = parent
                .child_by_field_name("name")
                .map(|n| node_text(&n, source).to_string());
            match parent.parent().map(|p| p.kind()) {
                // `import a.b as c` binds the module a.b
                Some("import_statement") => {
                    parts.source_module = name;
                }
                // `from m import x as y`
                Some("import_from_statement") => {
                    parts.source_name = name;
                    parts.source_module = parent
                        .parent()
                        .and_then(|p| p.child_by_field_name("module_name"))
                        .map(|m| node_text(&m, source).to_string());
                }
                _ => {}
            }
        }
        _ => {}
    }
    parts
}

// ---------------------------------------------------------------------------
// Call classification
// ---------------------------------------------------------------------------

fn classify_call(ref_node: Node<'_>, source: &str) -> CallShape {
    let Some(parent) = ref_node.parent() else {
        return CallShape::NotACall;
    };

    match parent.kind() {
        // `f(...)` — whether it is a constructor depends on what `f`
        // resolves to; the analyzer promotes class callees.
        "call" => {
            if field_is(parent, "function", ref_node) {
                return CallShape::Direct {
                    assigned_to: assigned_name(parent, source),
                };
            }
        }
        "attribute" => {
            if field_is(parent, "attribute", ref_node) {
                if let Some(grandparent) = parent.parent() {
                    if grandparent.kind() == "call" && field_is(grandparent, "function", parent) {
                        let receiver = parent
                            .child_by_field_name("object")
                            .map(|o| node_text(&o, source).to_string())
                            .unwrap_or_default();
                        return CallShape::Method { receiver };
                    }
                }
            }
        }
        _ => {}
    }
    CallShape::NotACall
}

fn field_is(parent: Node<'_>, field: &str, node: Node<'_>) -> bool {
    parent
        .child_by_field_name(field)
        .is_some_and(|c| c.id() == node.id())
}

fn assigned_name(call_node: Node<'_>, source: &str) -> Option<String> {
    let parent = call_node.parent()?;
    if parent.kind() != "assignment" {
        return None;
    }
    let left = parent.child_by_field_name("left")?;
    if left.kind() == "identifier" {
        Some(node_text(&left, source).to_string())
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Containers, context, inheritance
// ---------------------------------------------------------------------------

/// A function is a method when it is a direct member of a class body,
/// stepping over a `decorated_definition` wrapper.
fn method_container(item: Node<'_>, source: &str) -> Option<String> {
    if item.kind() != "function_definition" {
        return None;
    }
    let mut node = item;
    if let Some(parent) = node.parent() {
        if parent.kind() == "decorated_definition" {
            node = parent;
        }
    }
    let block = node.parent()?;
    if block.kind() != "block" {
        return None;
    }
    let class_def = block.parent()?;
    if class_def.kind() != "class_definition" {
        return None;
    }
    class_def
        .child_by_field_name("name")
        .map(|n| node_text(&n, source).to_string())
}

fn extract_context(item: Node<'_>, source: &str, name: &str) -> DefContext {
    let is_dunder = name.starts_with("__") && name.ends_with("__");
    let mut ctx = DefContext {
        is_private: name.starts_with('_') && !is_dunder,
        is_test: name.starts_with("test_"),
        ..DefContext::default()
    };

    if let Some(body) = item.child_by_field_name("body") {
        ctx.signature = Some(source[item.start_byte()..body.start_byte()].trim().to_string());

        // docstring: the first statement of the body, when it is a string
        if let Some(first) = body.named_child(0) {
            if first.kind() == "expression_statement" {
                if let Some(expr) = first.named_child(0) {
                    if expr.kind() == "string" {
                        ctx.docstring =
                            Some(trim_docstring(node_text(&expr, source)));
                    }
                }
            }
        }
    }

    if let Some(params) = item.child_by_field_name("parameters") {
        let mut cursor = params.walk();
        for param in params.named_children(&mut cursor) {
            match param.kind() {
                "identifier" => {
                    ctx.parameter_names.push(node_text(&param, source).to_string());
                }
                "typed_parameter" | "list_splat_pattern" | "dictionary_splat_pattern" => {
                    if let Some(inner) = param.named_child(0) {
                        if inner.kind() == "identifier" {
                            ctx.parameter_names
                                .push(node_text(&inner, source).to_string());
                        }
                    }
                }
                "default_parameter" | "typed_default_parameter" => {
                    if let Some(n) = param.child_by_field_name("name") {
                        ctx.parameter_names.push(node_text(&n, source).to_string());
                    }
                }
                _ => {}
            }
        }
    }

    for i in 0..item.child_count() {
        if item.child(i).is_some_and(|c| c.kind() == "async") {
            ctx.is_async = true;
        }
    }

    if let Some(parent) = item.parent() {
        if parent.kind() == "decorated_definition" {
            let mut cursor = parent.walk();
            for child in parent.children(&mut cursor) {
                if child.kind() == "decorator" {
                    ctx.decorators.push(node_text(&child, source).to_string());
                }
            }
        }
    }

    ctx
}

fn trim_docstring(raw: &str) -> String {
    raw.trim_matches(|c| c == '"' || c == '\'').trim().to_string()
}

/// The first superclass is the parent; the rest are treated as interfaces.
fn class_relations(item: Node<'_>, source: &str) -> ClassRelations {
    let mut relations = ClassRelations::default();
    let Some(superclasses) = item.child_by_field_name("superclasses") else {
        return relations;
    };
    let mut cursor = superclasses.walk();
    for (i, base) in superclasses.named_children(&mut cursor).enumerate() {
        match base.kind() {
            "identifier" | "attribute" => {
                let text = node_text(&base, source).to_string();
                if i == 0 {
                    relations.parent = Some(text);
                } else {
                    relations.interfaces.push(text);
                }
            }
            "keyword_argument" => {}
            _ => {}
        }
    }
    relations
}
