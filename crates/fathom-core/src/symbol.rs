//! Stable symbol identifiers of the form `<module_path>#<qualified_name>`.

use serde::{Deserialize, Serialize};

/// Qualified name used for the synthetic per-file module definition.
pub const MODULE_NAME: &str = "<module>";

/// Module-path sentinel for built-in callees.
pub const BUILTIN_MODULE: &str = "<builtin>";

/// Source extensions recognized for module-path normalization. Exactly one
/// of these suffixes is stripped; unknown suffixes (`config.prod`) survive.
const KNOWN_EXTENSIONS: &[&str] = &[
    "ts", "tsx", "js", "jsx", "mjs", "cjs", "py", "pyi", "rs",
];

/// A stable string identifying a definition across the project.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SymbolId(String);

impl SymbolId {
    /// Build an id from a raw file path and an already-qualified name.
    pub fn new(file_path: &str, qualified_name: &str) -> Self {
        Self(format!(
            "{}#{}",
            normalize_module_path(file_path),
            qualified_name
        ))
    }

    /// Id for the synthetic `<module>` definition of a file.
    pub fn module(file_path: &str) -> Self {
        Self::new(file_path, MODULE_NAME)
    }

    /// Id for a built-in callee, e.g. `<builtin>#push`.
    pub fn builtin(method_name: &str) -> Self {
        Self(format!("{BUILTIN_MODULE}#{method_name}"))
    }

    pub fn from_raw(raw: String) -> Self {
        Self(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `<normalized_module_path>` half of the id.
    pub fn module_path(&self) -> &str {
        self.0.split_once('#').map(|(m, _)| m).unwrap_or(&self.0)
    }

    /// The `<qualified_name>` half of the id.
    pub fn qualified_name(&self) -> &str {
        self.0.split_once('#').map(|(_, q)| q).unwrap_or("")
    }

    pub fn is_builtin(&self) -> bool {
        self.module_path() == BUILTIN_MODULE
    }

    pub fn is_module(&self) -> bool {
        self.qualified_name() == MODULE_NAME
    }
}

impl std::fmt::Display for SymbolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize a file path into a module path: forward slashes, no leading
/// slash, one known source extension stripped. Idempotent.
pub fn normalize_module_path(path: &str) -> String {
    let forward = path.replace('\\', "/");
    let trimmed = forward.trim_start_matches('/');

    let (dir, file) = match trimmed.rsplit_once('/') {
        Some((d, f)) => (Some(d), f),
        None => (None, trimmed),
    };

    let stem = match file.rsplit_once('.') {
        // A leading dot is a hidden-file marker, not an extension separator.
        Some((base, ext)) if !base.is_empty() && KNOWN_EXTENSIONS.contains(&ext) => base,
        _ => file,
    };

    match dir {
        Some(d) => format!("{d}/{stem}"),
        None => stem.to_string(),
    }
}

/// Name assigned to anonymous definitions, keyed by their start position.
pub fn anonymous_name(row: u32, column: u32) -> String {
    format!("<anonymous_line_{row}_col_{column}>")
}

/// Qualified name for a definition: methods are prefixed by their container.
pub fn qualified_name(name: &str, container: Option<&str>) -> String {
    match container {
        Some(c) => format!("{c}.{name}"),
        None => name.to_string(),
    }
}
