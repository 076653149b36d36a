//! Cross-file analysis for fathom: name resolution, import resolution, type
//! tracking, call-graph extraction, inheritance, and the project coordinator.
//!
//! - [`project`] — The [`Project`](project::Project) snapshot API
//! - [`resolve`] — Go-to-definition / find-references over scope graphs
//! - [`imports`] — Module-path resolution and import→export matching
//! - [`type_tracker`] — Immutable variable→class trackers
//! - [`call_graph`] — Call extraction, classification, and projection
//! - [`inheritance`] — Class relationship maps
//! - [`phases`] — The two-phase (parallel, then merge) analysis pipeline

pub mod call_graph;
pub mod imports;
pub mod inheritance;
pub mod phases;
pub mod project;
pub mod resolve;
pub mod type_tracker;

pub use call_graph::CallGraphOptions;
pub use fathom_parsers::cache::ParseLimits;
pub use project::{Project, ProjectError};
