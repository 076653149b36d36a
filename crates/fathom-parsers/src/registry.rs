//! Language registry: binds file extensions to grammars, scope queries, and
//! the per-language policy hooks the builder and analyzer dispatch through.

use std::path::Path;

use tree_sitter::{Language, Node, Query};

use fathom_core::types::SymbolKind;

use crate::queries;
use crate::{python, rust_lang, typescript};

/// How a language marks definitions as exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportPolicy {
    /// `export` keyword, `export { … }` clauses, default exports, and the
    /// whole-object `module.exports = { … }` form.
    EsModule,
    /// `__all__` when present, else no-leading-underscore convention.
    PythonConvention,
    /// Any `pub` visibility variant, at any nesting depth.
    RustVisibility,
}

/// How a language's import source strings map onto project file paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModulePathStyle {
    /// `./x` / `../x` joined against the importer's directory, probing
    /// candidate extensions in a fixed order.
    Relative,
    /// Dotted module path treated as a directory path with `.py` appended.
    Dotted,
    /// Module path treated as a sibling `.rs` file of the importer.
    Sibling,
}

/// A set of symbol kinds that form one namespace. References tagged with a
/// namespace only resolve to definitions in the same namespace.
#[derive(Debug, Clone, Copy)]
pub struct Namespace {
    pub name: &'static str,
    pub kinds: &'static [SymbolKind],
}

/// What the call-graph analyzer learns from the CST node of a reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallShape {
    /// The reference is not the callee of any invocation.
    NotACall,
    /// `f(...)`; may still be a constructor if the callee is a class.
    Direct { assigned_to: Option<String> },
    /// `new F(...)`.
    Constructor { assigned_to: Option<String> },
    /// `recv.m(...)`.
    Method { receiver: String },
    /// `Type::m(...)`.
    Associated {
        type_name: String,
        assigned_to: Option<String>,
    },
}

/// Source-module information extracted from an import binding's CST context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportParts {
    /// Original exported name when the import renames; `Some("default")`
    /// for default imports.
    pub source_name: Option<String>,
    /// Module path string as written in the import statement.
    pub source_module: Option<String>,
}

/// Context extracted around a definition by the per-language hook.
#[derive(Debug, Clone, Default)]
pub struct DefContext {
    pub signature: Option<String>,
    pub docstring: Option<String>,
    pub decorators: Vec<String>,
    pub parameter_names: Vec<String>,
    pub is_async: bool,
    pub is_test: bool,
    pub is_private: bool,
}

/// Parent class and implemented interfaces named by a class-like definition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassRelations {
    pub parent: Option<String>,
    pub interfaces: Vec<String>,
}

/// One `impl Trait for Type` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraitImpl {
    pub type_name: String,
    pub trait_name: String,
}

pub type ImportPartsFn = fn(Node<'_>, &str) -> ImportParts;
pub type ClassifyCallFn = fn(Node<'_>, &str) -> CallShape;
pub type MethodContainerFn = fn(Node<'_>, &str) -> Option<String>;
pub type ExtractContextFn = fn(Node<'_>, &str, &str) -> DefContext;
pub type ClassRelationsFn = fn(Node<'_>, &str) -> ClassRelations;
pub type TraitImplsFn = fn(Node<'_>, &str) -> Vec<TraitImpl>;

/// Everything the engine knows about one language.
pub struct LanguageConfig {
    /// Canonical name (`"typescript"`, `"python"`, `"rust"`).
    pub name: &'static str,
    pub display_name: &'static str,
    pub extensions: &'static [&'static str],
    pub language: Language,
    /// Compiled scope query; shared by every parse of this language.
    pub query: Query,
    pub namespaces: &'static [Namespace],
    /// Receiver names that mean "the enclosing class instance".
    pub receiver_synonyms: &'static [&'static str],
    /// Scope node kinds hoisting walks past.
    pub block_scope_kinds: &'static [&'static str],
    pub export_policy: ExportPolicy,
    pub module_path_style: ModulePathStyle,
    /// Whether `X(...)` on a class-kind callee is a constructor call.
    pub call_on_class_is_constructor: bool,
    pub import_parts: ImportPartsFn,
    pub classify_call: ClassifyCallFn,
    pub method_container: MethodContainerFn,
    pub extract_context: Option<ExtractContextFn>,
    pub class_relations: ClassRelationsFn,
    pub collect_trait_impls: Option<TraitImplsFn>,
}

impl LanguageConfig {
    /// Namespace index for a reference tag (`<ns>.reference`).
    pub fn namespace_index(&self, name: &str) -> Option<u32> {
        self.namespaces
            .iter()
            .position(|ns| ns.name == name)
            .map(|i| i as u32)
    }

    /// Namespace index a definition of this kind belongs to.
    pub fn namespace_of_kind(&self, kind: SymbolKind) -> Option<u32> {
        self.namespaces
            .iter()
            .position(|ns| ns.kinds.contains(&kind))
            .map(|i| i as u32)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("query compilation error for {language}: {message}")]
    Query { language: &'static str, message: String },
}

/// The set of registered languages, looked up by extension.
pub struct LanguageRegistry {
    configs: Vec<LanguageConfig>,
}

impl LanguageRegistry {
    /// Registry with TypeScript/JavaScript (plus TSX), Python, and Rust.
    pub fn with_default_languages() -> Result<Self, RegistryError> {
        Ok(Self {
            configs: vec![
                typescript::language_config()?,
                typescript::tsx_language_config()?,
                python::language_config()?,
                rust_lang::language_config()?,
            ],
        })
    }

    pub fn config_for_extension(&self, ext: &str) -> Option<&LanguageConfig> {
        self.configs
            .iter()
            .find(|c| c.extensions.contains(&ext))
    }

    pub fn config_for_path(&self, path: &str) -> Option<&LanguageConfig> {
        let ext = Path::new(path).extension()?.to_str()?;
        self.config_for_extension(ext)
    }

    pub fn config_by_name(&self, name: &str) -> Option<&LanguageConfig> {
        self.configs.iter().find(|c| c.name == name)
    }

    pub fn languages(&self) -> impl Iterator<Item = &LanguageConfig> {
        self.configs.iter()
    }
}

/// Compile a language's scope query, mapping errors into [`RegistryError`].
pub(crate) fn compile_query(
    language: &Language,
    name: &'static str,
) -> Result<Query, RegistryError> {
    let source = queries::query_source(name).ok_or(RegistryError::Query {
        language: name,
        message: "no scope query registered".into(),
    })?;
    Query::new(language, source).map_err(|e| RegistryError::Query {
        language: name,
        message: e.to_string(),
    })
}
