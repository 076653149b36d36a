//! Rust policy: `pub` visibility, `use` imports, associated-function call
//! classification, impl-block containers, and trait-impl collection.

use tree_sitter::Node;

use fathom_core::types::SymbolKind;

use crate::cst::node_text;
use crate::registry::{
    CallShape, ClassRelations, DefContext, ExportPolicy, ImportParts, LanguageConfig,
    ModulePathStyle, Namespace, RegistryError, TraitImpl,
};

const NAMESPACES: &[Namespace] = &[
    Namespace {
        name: "value",
        kinds: &[
            SymbolKind::Function,
            SymbolKind::Method,
            SymbolKind::Generator,
            SymbolKind::Variable,
            SymbolKind::Const,
            SymbolKind::Let,
            SymbolKind::Constant,
            SymbolKind::Import,
            SymbolKind::Constructor,
            SymbolKind::Module,
        ],
    },
    Namespace {
        name: "type",
        kinds: &[
            SymbolKind::Class,
            SymbolKind::Struct,
            SymbolKind::Enum,
            SymbolKind::Interface,
            SymbolKind::Trait,
        ],
    },
];

pub fn language_config() -> Result<LanguageConfig, RegistryError> {
    let language: tree_sitter::Language = tree_sitter_rust::LANGUAGE.into();
    let query = crate::registry::compile_query(&language, "rust")?;
    Ok(LanguageConfig {
        name: "rust",
        display_name: "Rust",
        extensions: &["rs"],
        language,
        query,
        namespaces: NAMESPACES,
        receiver_synonyms: &["self"],
        block_scope_kinds: &["block"],
        export_policy: ExportPolicy::RustVisibility,
        module_path_style: ModulePathStyle::Sibling,
        call_on_class_is_constructor: false,
        import_parts,
        classify_call,
        method_container,
        extract_context: Some(extract_context),
        class_relations,
        collect_trait_impls: Some(collect_trait_impls),
    })
}

// ---------------------------------------------------------------------------
// Visibility
// ---------------------------------------------------------------------------

/// Any `pub` variant (`pub`, `pub(crate)`, `pub(super)`, `pub(in …)`).
pub fn has_visibility(item: Node<'_>) -> bool {
    let mut cursor = item.walk();
    let result = item
        .named_children(&mut cursor)
        .any(|c| c.kind() == "visibility_modifier");
    result
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
        "use_as_clause" => {
            if let Some(path) = parent.child_by_field_name("path") {
                let (module, name) = split_use_path(node_text(&path, source));
                parts.source_module = module;
                parts.source_name = Some(name);
            }
        }
        "scoped_identifier" => {
            // `use helpers::shared` — binding is the final segment
            parts.source_module = parent
                .child_by_field_name("path")
                .map(|p| node_text(&p, source).to_string());
        }
        "use_list" => {
            // `use helpers::{a, b}` — module comes from the scoped list
            parts.source_module = parent
                .parent()
                .filter(|p| p.kind() == "scoped_use_list")
                .and_then(|p| p.child_by_field_name("path"))
                .map(|p| node_text(&p, source).to_string());
        }
        "use_declaration" => {
            // `use helpers;` binds the module name itself
            parts.source_module = Some(node_text(&binding, source).to_string());
        }
        _ => {}
    }

    // A use_list binding nested under a scoped_identifier still needs the
    // outer list's module prefix.
    if parts.source_module.is_none() {
        let mut current = binding;
        while let Some(node) = current.parent() {
            if node.kind() == "scoped_use_list" {
                parts.source_module = node
                    .child_by_field_name("path")
                    .map(|p| node_text(&p, source).to_string());
                break;
            }
            if node.kind() == "use_declaration" {
                break;
            }
            current = node;
        }
    }

    parts
}

/// `a::b::c` → (`Some("a::b")`, `"c"`); `c` → (`None`, `"c"`).
fn split_use_path(path: &str) -> (Option<String>, String) {
    match path.rsplit_once("::") {
        Some((prefix, last)) => (Some(prefix.to_string()), last.to_string()),
        None => (None, path.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Call classification
// ---------------------------------------------------------------------------

fn classify_call(ref_node: Node<'_>, source: &str) -> CallShape {
    let Some(parent) = ref_node.parent() else {
        return CallShape::NotACall;
    };

    match parent.kind() {
        "call_expression" => {
            if field_is(parent, "function", ref_node) {
                return CallShape::Direct {
                    assigned_to: assigned_name(parent, source),
                };
            }
        }
        "field_expression" => {
            if field_is(parent, "field", ref_node) {
                if let Some(grandparent) = parent.parent() {
                    if grandparent.kind() == "call_expression"
                        && field_is(grandparent, "function", parent)
                    {
                        let receiver = parent
                            .child_by_field_name("value")
                            .map(|v| node_text(&v, source).to_string())
                            .unwrap_or_default();
                        return CallShape::Method { receiver };
                    }
                }
            }
        }
        "scoped_identifier" => {
            // `Type::assoc(...)`
            if field_is(parent, "name", ref_node) {
                if let Some(grandparent) = parent.parent() {
                    if grandparent.kind() == "call_expression"
                        && field_is(grandparent, "function", parent)
                    {
                        if let Some(path) = parent.child_by_field_name("path") {
                            let full = node_text(&path, source);
                            let type_name =
                                full.rsplit("::").next().unwrap_or(full).to_string();
                            return CallShape::Associated {
                                type_name,
                                assigned_to: assigned_name(grandparent, source),
                            };
                        }
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
    match parent.kind() {
        "let_declaration" => {
            let pattern = parent.child_by_field_name("pattern")?;
            if pattern.kind() == "identifier" {
                return Some(node_text(&pattern, source).to_string());
            }
            None
        }
        "assignment_expression" => {
            let left = parent.child_by_field_name("left")?;
            if left.kind() == "identifier" {
                return Some(node_text(&left, source).to_string());
            }
            None
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Containers, context, inheritance
// ---------------------------------------------------------------------------

/// Methods live in `impl` and `trait` bodies; the container is the
/// implemented type (or trait) name with generics stripped.
fn method_container(item: Node<'_>, source: &str) -> Option<String> {
    if !matches!(item.kind(), "function_item" | "function_signature_item") {
        return None;
    }
    let list = item.parent()?;
    if list.kind() != "declaration_list" {
        return None;
    }
    let owner = list.parent()?;
    match owner.kind() {
        "impl_item" => owner
            .child_by_field_name("type")
            .map(|t| base_type_name(t, source)),
        "trait_item" => owner
            .child_by_field_name("name")
            .map(|n| node_text(&n, source).to_string()),
        _ => None,
    }
}

fn extract_context(item: Node<'_>, source: &str, _name: &str) -> DefContext {
    let mut ctx = DefContext {
        is_private: !has_visibility(item),
        ..DefContext::default()
    };

    if let Some(body) = item.child_by_field_name("body") {
        ctx.signature = Some(source[item.start_byte()..body.start_byte()].trim().to_string());
    }

    if let Some(params) = item.child_by_field_name("parameters") {
        let mut cursor = params.walk();
        for param in params.named_children(&mut cursor) {
            match param.kind() {
                "parameter" => {
                    if let Some(pattern) = param.child_by_field_name("pattern") {
                        ctx.parameter_names
                            .push(node_text(&pattern, source).to_string());
                    }
                }
                "self_parameter" => {
                    ctx.parameter_names.push("self".to_string());
                }
                _ => {}
            }
        }
    }

    let mut cursor = item.walk();
    for child in item.children(&mut cursor) {
        if child.kind() == "function_modifiers" && node_text(&child, source).contains("async") {
            ctx.is_async = true;
        }
    }

    // doc comments and attributes sit above the item as siblings
    let mut doc_lines: Vec<String> = Vec::new();
    let mut prev = item.prev_sibling();
    while let Some(sibling) = prev {
        match sibling.kind() {
            "line_comment" => {
                let text = node_text(&sibling, source);
                if let Some(doc) = text.strip_prefix("///") {
                    doc_lines.push(doc.trim().to_string());
                } else {
                    break;
                }
            }
            "attribute_item" => {
                let text = node_text(&sibling, source).to_string();
                if text.contains("#[test]") || text.contains("#[tokio::test]") {
                    ctx.is_test = true;
                }
                ctx.decorators.push(text);
            }
            _ => break,
        }
        prev = sibling.prev_sibling();
    }
    if !doc_lines.is_empty() {
        doc_lines.reverse();
        ctx.docstring = Some(doc_lines.join("\n"));
    }
    ctx.decorators.reverse();

    ctx
}

/// Structs have no parent class; trait relationships come from impl blocks.
fn class_relations(_item: Node<'_>, _source: &str) -> ClassRelations {
    ClassRelations::default()
}

/// Walk the whole file collecting `impl Trait for Type` declarations,
/// including those nested in modules.
fn collect_trait_impls(root: Node<'_>, source: &str) -> Vec<TraitImpl> {
    let mut impls = Vec::new();
    collect_trait_impls_into(root, source, &mut impls);
    impls
}

fn collect_trait_impls_into(node: Node<'_>, source: &str, out: &mut Vec<TraitImpl>) {
    if node.kind() == "impl_item" {
        if let (Some(trait_node), Some(type_node)) = (
            node.child_by_field_name("trait"),
            node.child_by_field_name("type"),
        ) {
            let trait_text = node_text(&trait_node, source);
            out.push(TraitImpl {
                type_name: base_type_name(type_node, source),
                trait_name: trait_text
                    .rsplit("::")
                    .next()
                    .unwrap_or(trait_text)
                    .split('<')
                    .next()
                    .unwrap_or(trait_text)
                    .to_string(),
            });
        }
    }
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        collect_trait_impls_into(child, source, out);
    }
}

/// `Store<T>` → `Store`; `crate::x::Store` → `Store`.
fn base_type_name(node: Node<'_>, source: &str) -> String {
    let text = match node.kind() {
        "generic_type" => node
            .child_by_field_name("type")
            .map(|t| node_text(&t, source))
            .unwrap_or_else(|| node_text(&node, source)),
        _ => node_text(&node, source),
    };
    let last = text.rsplit("::").next().unwrap_or(text);
    last.split('<').next().unwrap_or(last).to_string()
}
