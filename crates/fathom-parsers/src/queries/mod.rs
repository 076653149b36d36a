//! Per-language scope queries. Capture names carry the intent:
//! `local.scope`, `<scoping>.definition.<kind>`, `local.import`, and
//! `local.reference` / `<namespace>.reference`.

pub const TYPESCRIPT_QUERIES: &str = include_str!("typescript.scm");
pub const PYTHON_QUERIES: &str = include_str!("python.scm");
pub const RUST_QUERIES: &str = include_str!("rust.scm");

/// The scope-query source for a registered language name.
pub fn query_source(lang_name: &str) -> Option<&'static str> {
    match lang_name {
        "typescript" | "tsx" | "javascript" => Some(TYPESCRIPT_QUERIES),
        "python" => Some(PYTHON_QUERIES),
        "rust" => Some(RUST_QUERIES),
        _ => None,
    }
}
