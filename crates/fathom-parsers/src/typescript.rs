//! TypeScript / JavaScript policy: export detection, import parts, call
//! classification, containers, and context extraction. TSX gets its own
//! grammar but shares every hook and the scope query.

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

const BLOCK_SCOPE_KINDS: &[&str] = &[
    "statement_block",
    "for_statement",
    "for_in_statement",
    "catch_clause",
];

pub fn language_config() -> Result<LanguageConfig, RegistryError> {
    let language: tree_sitter::Language =
        tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into();
    let query = crate::registry::compile_query(&language, "typescript")?;
    Ok(LanguageConfig {
        name: "typescript",
        display_name: "TypeScript",
        extensions: &["ts", "js", "mjs", "cjs"],
        language,
        query,
        namespaces: NAMESPACES,
        receiver_synonyms: &["this"],
        block_scope_kinds: BLOCK_SCOPE_KINDS,
        export_policy: ExportPolicy::EsModule,
        module_path_style: ModulePathStyle::Relative,
        call_on_class_is_constructor: false,
        import_parts,
        classify_call,
        method_container,
        extract_context: Some(extract_context),
        class_relations,
        collect_trait_impls: None,
    })
}

pub fn tsx_language_config() -> Result<LanguageConfig, RegistryError> {
    let language: tree_sitter::Language = tree_sitter_typescript::LANGUAGE_TSX.into();
    let query = crate::registry::compile_query(&language, "tsx")?;
    Ok(LanguageConfig {
        name: "tsx",
        display_name: "TSX",
        extensions: &["tsx", "jsx"],
        language,
        query,
        namespaces: NAMESPACES,
        receiver_synonyms: &["this"],
        block_scope_kinds: BLOCK_SCOPE_KINDS,
        export_policy: ExportPolicy::EsModule,
        module_path_style: ModulePathStyle::Relative,
        call_on_class_is_constructor: false,
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

/// File-level export name sets: `export { … }` members and the whole-object
/// `module.exports = { … }` form. Per-property CommonJS assignments
/// (`module.exports.f = …`) are deliberately not recognized.
pub struct EsExportIndex {
    clause_names: HashSet<String>,
    commonjs_names: HashSet<String>,
}

pub fn exported_names(root: Node<'_>, source: &str) -> EsExportIndex {
    let mut clause_names = HashSet::new();
    let mut commonjs_names = HashSet::new();

    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        match child.kind() {
            "export_statement" => {
                let mut inner = child.walk();
                for part in child.children(&mut inner) {
                    if part.kind() == "export_clause" {
                        let mut spec_cursor = part.walk();
                        for spec in part.named_children(&mut spec_cursor) {
                            if spec.kind() == "export_specifier" {
                                if let Some(name) = spec.child_by_field_name("name") {
                                    clause_names.insert(node_text(&name, source).to_string());
                                }
                            }
                        }
                    }
                }
            }
            "expression_statement" => {
                if let Some(names) = commonjs_export_object(child, source) {
                    commonjs_names.extend(names);
                }
            }
            _ => {}
        }
    }

    EsExportIndex {
        clause_names,
        commonjs_names,
    }
}

/// Matches `module.exports = { a, b: impl }` and returns the exported names.
fn commonjs_export_object(stmt: Node<'_>, source: &str) -> Option<Vec<String>> {
    let assignment = stmt.named_child(0)?;
    if assignment.kind() != "assignment_expression" {
        return None;
    }
    let left = assignment.child_by_field_name("left")?;
    if left.kind() != "member_expression" {
        return None;
    }
    let object = left.child_by_field_name("object")?;
    let property = left.child_by_field_name("property")?;
    if node_text(&object, source) != "module" || node_text(&property, source) != "exports" {
        return None;
    }
    let right = assignment.child_by_field_name("right")?;
    if right.kind() != "object" {
        return None;
    }

    let mut names = Vec::new();
    let mut cursor = right.walk();
    for entry in right.named_children(&mut cursor) {
        match entry.kind() {
            "pair" => {
                if let Some(key) = entry.child_by_field_name("key") {
                    names.push(node_text(&key, source).to_string());
                }
            }
            "shorthand_property_identifier" => {
                names.push(node_text(&entry, source).to_string());
            }
            _ => {}
        }
    }
    Some(names)
}

pub fn is_def_exported(item: Node<'_>, name: &str, index: &EsExportIndex) -> bool {
    if index.clause_names.contains(name) || index.commonjs_names.contains(name) {
        return true;
    }
    let mut current = item;
    while let Some(parent) = current.parent() {
        if parent.kind() == "export_statement" {
            return true;
        }
        current = parent;
    }
    false
}

pub fn is_default_export(item: Node<'_>) -> bool {
    let mut current = item;
    while let Some(parent) = current.parent() {
        if parent.kind() == "export_statement" {
            for i in 0..parent.child_count() {
                if parent.child(i).is_some_and(|c| c.kind() == "default") {
                    return true;
                }
            }
            return false;
        }
        current = parent;
    }
    false
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
        "import_specifier" => {
            let alias = parent.child_by_field_name("alias");
            if alias.is_some_and(|a| a.id() == binding.id()) {
                parts.source_name = parent
                    .child_by_field_name("name")
                    .map(|n| node_text(&n, source).to_string());
            }
        }
        // `import d from './m'` — the binding hangs directly off the clause
        "import_clause" => {
            parts.source_name = Some("default".to_string());
        }
        "namespace_import" => {}
        _ => {}
    }

    let mut current = binding;
    while let Some(node) = current.parent() {
        if node.kind() == "import_statement" {
            parts.source_module = node
                .child_by_field_name("source")
                .map(|s| trim_string_literal(node_text(&s, source)));
            break;
        }
        current = node;
    }
    parts
}

fn trim_string_literal(raw: &str) -> String {
    raw.trim_matches(|c| c == '"' || c == '\'' || c == '`').to_string()
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
        "new_expression" => {
            if field_is(parent, "constructor", ref_node) {
                return CallShape::Constructor {
                    assigned_to: assigned_name(parent, source),
                };
            }
        }
        "member_expression" => {
            if field_is(parent, "property", ref_node) {
                if let Some(grandparent) = parent.parent() {
                    if grandparent.kind() == "call_expression"
                        && field_is(grandparent, "function", parent)
                    {
                        let receiver = parent
                            .child_by_field_name("object")
                            .map(|o| node_text(&o, source).to_string())
                            .unwrap_or_default();
                        return CallShape::Method { receiver };
                    }
                    if grandparent.kind() == "new_expression"
                        && field_is(grandparent, "constructor", parent)
                    {
                        return CallShape::Constructor {
                            assigned_to: assigned_name(grandparent, source),
                        };
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

/// The variable an invocation's result lands in, for type discovery.
fn assigned_name(call_node: Node<'_>, source: &str) -> Option<String> {
    let parent = call_node.parent()?;
    match parent.kind() {
        "variable_declarator" => {
            let name = parent.child_by_field_name("name")?;
            if name.kind() == "identifier" {
                return Some(node_text(&name, source).to_string());
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

fn method_container(item: Node<'_>, source: &str) -> Option<String> {
    if item.kind() != "method_definition" {
        return None;
    }
    let body = item.parent()?;
    if body.kind() != "class_body" {
        return None;
    }
    let class_decl = body.parent()?;
    match class_decl.kind() {
        "class_declaration" | "abstract_class_declaration" | "class" => class_decl
            .child_by_field_name("name")
            .map(|n| node_text(&n, source).to_string()),
        _ => None,
    }
}

fn extract_context(item: Node<'_>, source: &str, name: &str) -> DefContext {
    let mut ctx = DefContext {
        is_private: name.starts_with('_') || name.starts_with('#'),
        is_test: name.starts_with("test"),
        ..DefContext::default()
    };

    if let Some(body) = item.child_by_field_name("body") {
        let sig = &source[item.start_byte()..body.start_byte()];
        ctx.signature = Some(sig.trim().to_string());
    }

    if let Some(params) = item.child_by_field_name("parameters") {
        let mut cursor = params.walk();
        for param in params.named_children(&mut cursor) {
            match param.kind() {
                "required_parameter" | "optional_parameter" => {
                    if let Some(pattern) = param.child_by_field_name("pattern") {
                        ctx.parameter_names
                            .push(node_text(&pattern, source).to_string());
                    }
                }
                "identifier" => {
                    ctx.parameter_names.push(node_text(&param, source).to_string());
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

    // JSDoc: the comment immediately above the definition (or its export
    // wrapper) is the docstring.
    let anchor = match item.parent() {
        Some(p) if p.kind() == "export_statement" => p,
        _ => item,
    };
    if let Some(prev) = anchor.prev_named_sibling() {
        if prev.kind() == "comment" {
            ctx.docstring = Some(node_text(&prev, source).to_string());
        }
    }

    let mut cursor = item.walk();
    for child in item.children(&mut cursor) {
        if child.kind() == "decorator" {
            ctx.decorators.push(node_text(&child, source).to_string());
        }
    }

    ctx
}

fn class_relations(item: Node<'_>, source: &str) -> ClassRelations {
    let mut relations = ClassRelations::default();
    let mut cursor = item.walk();
    for child in item.children(&mut cursor) {
        if child.kind() != "class_heritage" {
            continue;
        }
        let mut heritage_cursor = child.walk();
        for clause in child.children(&mut heritage_cursor) {
            match clause.kind() {
                "extends_clause" => {
                    if let Some(value) = clause.child_by_field_name("value") {
                        relations.parent = Some(base_type_name(value, source));
                    }
                }
                "implements_clause" => {
                    let mut type_cursor = clause.walk();
                    for ty in clause.named_children(&mut type_cursor) {
                        relations.interfaces.push(base_type_name(ty, source));
                    }
                }
                _ => {}
            }
        }
    }
    relations
}

/// `Base<T>` → `Base`.
fn base_type_name(node: Node<'_>, source: &str) -> String {
    match node.kind() {
        "generic_type" => node
            .child_by_field_name("name")
            .map(|n| node_text(&n, source).to_string())
            .unwrap_or_else(|| node_text(&node, source).to_string()),
        _ => {
            let text = node_text(&node, source);
            text.split('<').next().unwrap_or(text).to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{FileParser, ParseLimits};
    use crate::registry::LanguageRegistry;

    fn parse(source: &str) -> (tree_sitter::Tree, String) {
        let registry = LanguageRegistry::with_default_languages().unwrap();
        let config = registry.config_by_name("typescript").unwrap();
        let parsed = FileParser::new()
            .parse_file(config, "t.ts", source.to_string(), &ParseLimits::default())
            .unwrap();
        (parsed.tree.unwrap(), source.to_string())
    }

    #[test]
    fn test_commonjs_whole_object_export() {
        let (tree, source) = parse("function f() {}\nmodule.exports = { f, g: f };\n");
        let index = exported_names(tree.root_node(), &source);
        assert!(index.commonjs_names.contains("f"));
        assert!(index.commonjs_names.contains("g"));
    }

    #[test]
    fn test_commonjs_property_assignment_not_recognized() {
        let (tree, source) = parse("function f() {}\nmodule.exports.f = f;\n");
        let index = exported_names(tree.root_node(), &source);
        assert!(index.commonjs_names.is_empty());
    }

    #[test]
    fn test_export_clause_names() {
        let (tree, source) = parse("function a() {}\nexport { a as b };\n");
        let index = exported_names(tree.root_node(), &source);
        // `export { a as b }` exports the local definition `a`
        assert!(index.clause_names.contains("a"));
        assert!(!index.clause_names.contains("b"));
    }

    #[test]
    fn test_class_relations_extends_and_implements() {
        let (tree, source) =
            parse("class Child extends Base<T> implements Runnable, Closeable {}\n");
        let root = tree.root_node();
        let class_node = root.named_child(0).unwrap();
        let relations = class_relations(class_node, &source);
        assert_eq!(relations.parent.as_deref(), Some("Base"));
        assert_eq!(relations.interfaces, vec!["Runnable", "Closeable"]);
    }
}
