//! Two-phase project analysis. Phase 1 looks at one file at a time and is
//! embarrassingly parallel; phase 2 is a deterministic single-threaded merge
//! ordered by file path.

use std::collections::BTreeMap;
use std::sync::Arc;

use rayon::prelude::*;

use fathom_core::graph::{LocalImport, ScopeGraph};
use fathom_core::types::{Def, ImportInfo};
use fathom_parsers::builder::defining_item;
use fathom_parsers::cst::node_at_range;
use fathom_parsers::registry::{CallShape, ClassRelations, LanguageConfig, LanguageRegistry, TraitImpl};

use crate::imports::resolve_import_target;
use crate::inheritance::InheritanceMap;
use crate::project::FileEntry;
use crate::type_tracker::{FileTypeTracker, ProjectTypeRegistry, TypeInfo};

/// Everything phase 1 learns about one file.
pub struct AnalysisResult {
    pub file_path: String,
    pub exports: Vec<Def>,
    pub imports: Vec<LocalImport>,
    pub tracker: FileTypeTracker,
    pub class_relations: Vec<(Def, ClassRelations)>,
    pub trait_impls: Vec<TraitImpl>,
}

/// Phase-2 output: the derived cross-file state the query surface reads.
#[derive(Default)]
pub struct ProjectArtifacts {
    pub graphs: BTreeMap<String, Arc<ScopeGraph>>,
    pub trackers: BTreeMap<String, Arc<FileTypeTracker>>,
    pub imports: BTreeMap<String, Vec<ImportInfo>>,
    pub type_registry: ProjectTypeRegistry,
    pub inheritance: InheritanceMap,
}

/// Phase 1: independent per-file analysis over an immutable input.
pub fn analyze_file(path: &str, entry: &FileEntry, config: &LanguageConfig) -> AnalysisResult {
    let mut result = AnalysisResult {
        file_path: path.to_string(),
        exports: Vec::new(),
        imports: Vec::new(),
        tracker: FileTypeTracker::new(),
        class_relations: Vec::new(),
        trait_impls: Vec::new(),
    };

    let (Some(graph), Some(tree)) = (entry.graph.as_deref(), entry.tree.as_ref()) else {
        return result;
    };
    let source = entry.source.as_str();
    let root = tree.root_node();

    for (idx, d) in graph.defs() {
        if !d.is_exported {
            continue;
        }
        if let Some(def) = graph.def_value(idx) {
            result.tracker = result.tracker.with_exported(&def.name);
            result.exports.push(def);
        }
    }

    result.imports = graph.imports().map(|(_, i)| i.clone()).collect();

    // Seed module-level type discoveries: `x = new C()` outside any
    // function body binds x at file scope.
    let function_ranges: Vec<_> = graph
        .defs()
        .filter(|(_, d)| d.symbol_kind.is_function_like())
        .filter_map(|(_, d)| d.enclosing_range)
        .collect();
    for (ref_idx, r) in graph.refs() {
        if function_ranges.iter().any(|fr| fr.contains(&r.range)) {
            continue;
        }
        let Some(node) = node_at_range(root, r.range) else {
            continue;
        };
        let assigned = match (config.classify_call)(node, source) {
            CallShape::Constructor { assigned_to } => assigned_to,
            CallShape::Direct { assigned_to } if config.call_on_class_is_constructor => {
                assigned_to
            }
            CallShape::Associated { assigned_to, .. } => assigned_to,
            _ => None,
        };
        let Some(var_name) = assigned else { continue };
        let Some((target_idx, kind)) = graph.resolution_of(ref_idx) else {
            continue;
        };
        if kind != fathom_core::graph::EdgeKind::RefToDef {
            continue;
        }
        let Some(class_def) = graph.def_value(target_idx) else {
            continue;
        };
        if !class_def.symbol_kind.is_class_like() {
            continue;
        }
        result.tracker = result.tracker.with_variable_type(
            &var_name,
            r.range.start,
            TypeInfo {
                class_name: class_def.name.clone(),
                class_symbol: Some(class_def.symbol_id.clone()),
                source_file: class_def.file_path.clone(),
            },
        );
    }

    for (idx, d) in graph.defs() {
        if !d.symbol_kind.is_class_like() {
            continue;
        }
        let (Some(def), Some(item)) = (graph.def_value(idx), defining_item(root, d.range)) else {
            continue;
        };
        let relations = (config.class_relations)(item, source);
        if relations.parent.is_some() || !relations.interfaces.is_empty() {
            result.class_relations.push((def, relations));
        }
    }

    if let Some(collect) = config.collect_trait_impls {
        result.trait_impls = collect(root, source);
    }

    result
}

/// Run both phases over the whole file set.
pub fn analyze_project(
    files: &BTreeMap<String, Arc<FileEntry>>,
    registry: &LanguageRegistry,
) -> ProjectArtifacts {
    // Phase 1 fans out; results come back in path order regardless of
    // completion order.
    let mut results: Vec<AnalysisResult> = files
        .par_iter()
        .filter_map(|(path, entry)| {
            let config = entry.language.and_then(|l| registry.config_by_name(l))?;
            Some(analyze_file(path, entry, config))
        })
        .collect();
    results.sort_by(|a, b| a.file_path.cmp(&b.file_path));

    let mut artifacts = ProjectArtifacts::default();
    for (path, entry) in files {
        if let Some(graph) = &entry.graph {
            artifacts.graphs.insert(path.clone(), Arc::clone(graph));
        }
    }

    // Merge exports into the project registry.
    let mut type_registry = ProjectTypeRegistry::new();
    for result in &results {
        for def in &result.exports {
            if def.symbol_kind.is_class_like() {
                type_registry = type_registry.with_export(
                    &result.file_path,
                    &def.name,
                    TypeInfo {
                        class_name: def.name.clone(),
                        class_symbol: Some(def.symbol_id.clone()),
                        source_file: def.file_path.clone(),
                    },
                );
            }
        }
    }
    artifacts.type_registry = type_registry;

    // Resolve imports against the now-complete graph set, and grow each
    // file's tracker with the classes its imports bind.
    for result in &mut results {
        let Some(config) = files
            .get(&result.file_path)
            .and_then(|e| e.language)
            .and_then(|l| registry.config_by_name(l))
        else {
            continue;
        };
        let mut resolved = Vec::new();
        let mut tracker = std::mem::take(&mut result.tracker);
        for import in &result.imports {
            let Some(def) = resolve_import_target(
                import,
                &result.file_path,
                config.module_path_style,
                &artifacts.graphs,
            ) else {
                continue;
            };
            if def.symbol_kind.is_class_like() {
                tracker = tracker.with_imported_class(
                    &import.name,
                    TypeInfo {
                        class_name: def.name.clone(),
                        class_symbol: Some(def.symbol_id.clone()),
                        source_file: def.file_path.clone(),
                    },
                );
            }
            resolved.push(ImportInfo {
                local_name: import.name.clone(),
                import_range: import.range,
                file_path: result.file_path.clone(),
                definition: def,
            });
        }
        artifacts
            .imports
            .insert(result.file_path.clone(), resolved);
        artifacts
            .trackers
            .insert(result.file_path.clone(), Arc::new(tracker));
    }

    let inheritance = InheritanceMap::build(&results, &artifacts);
    artifacts.inheritance = inheritance;
    artifacts
}
