//! Tree-sitter parsing and scope-graph construction for fathom.
//!
//! - [`registry`] — Language configs: grammars, scope queries, policy hooks
//! - [`queries`] — The per-language `.scm` scope queries
//! - [`cache`] — Source cache: text + CST + incremental edits
//! - [`builder`] — Scope-graph construction from query captures
//! - [`typescript`] / [`python`] / [`rust_lang`] — Per-language policies
//! - [`walker`] — Directory scanning for the standalone entry point
//! - [`cst`] — Coordinate conversions between tree-sitter and the data model

pub mod builder;
pub mod cache;
pub mod cst;
pub mod python;
pub mod queries;
pub mod registry;
pub mod rust_lang;
pub mod typescript;
pub mod walker;
