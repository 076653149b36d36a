//! Class relationships: parent classes, implemented interfaces/traits, and
//! the reverse maps. Built once per snapshot during phase 2.

use std::collections::HashMap;

use fathom_core::symbol::SymbolId;
use fathom_core::types::Def;

use crate::phases::{AnalysisResult, ProjectArtifacts};

/// Resolved relationships of one class.
#[derive(Debug, Clone, Default)]
pub struct ClassRelationships {
    pub parent: Option<Def>,
    pub interfaces: Vec<Def>,
}

#[derive(Debug, Clone, Default)]
pub struct InheritanceMap {
    parents: HashMap<SymbolId, Def>,
    interfaces: HashMap<SymbolId, Vec<Def>>,
    subclasses: HashMap<SymbolId, Vec<SymbolId>>,
    implementors: HashMap<SymbolId, Vec<SymbolId>>,
    defs: HashMap<SymbolId, Def>,
}

impl InheritanceMap {
    /// Resolve every class's named parent/interfaces to definitions and
    /// fold Rust trait impls in.
    pub fn build(results: &[AnalysisResult], artifacts: &ProjectArtifacts) -> Self {
        let mut map = InheritanceMap::default();

        for result in results {
            for (class_def, relations) in &result.class_relations {
                map.defs
                    .insert(class_def.symbol_id.clone(), class_def.clone());
                if let Some(parent_name) = &relations.parent {
                    if let Some(parent) =
                        resolve_class_name(&result.file_path, parent_name, artifacts)
                    {
                        map.add_parent(class_def.clone(), parent);
                    }
                }
                for interface_name in &relations.interfaces {
                    if let Some(interface) =
                        resolve_class_name(&result.file_path, interface_name, artifacts)
                    {
                        map.add_interface(class_def.clone(), interface);
                    }
                }
            }

            for trait_impl in &result.trait_impls {
                let ty = resolve_class_name(&result.file_path, &trait_impl.type_name, artifacts);
                let tr = resolve_class_name(&result.file_path, &trait_impl.trait_name, artifacts);
                if let (Some(ty), Some(tr)) = (ty, tr) {
                    map.add_interface(ty, tr);
                }
            }
        }

        map
    }

    fn add_parent(&mut self, child: Def, parent: Def) {
        self.defs.insert(child.symbol_id.clone(), child.clone());
        self.defs.insert(parent.symbol_id.clone(), parent.clone());
        self.subclasses
            .entry(parent.symbol_id.clone())
            .or_default()
            .push(child.symbol_id.clone());
        self.parents.insert(child.symbol_id, parent);
    }

    fn add_interface(&mut self, implementor: Def, interface: Def) {
        self.defs
            .insert(implementor.symbol_id.clone(), implementor.clone());
        self.defs
            .insert(interface.symbol_id.clone(), interface.clone());
        self.implementors
            .entry(interface.symbol_id.clone())
            .or_default()
            .push(implementor.symbol_id.clone());
        self.interfaces
            .entry(implementor.symbol_id)
            .or_default()
            .push(interface);
    }

    pub fn relationships(&self, class: &Def) -> ClassRelationships {
        ClassRelationships {
            parent: self.parents.get(&class.symbol_id).cloned(),
            interfaces: self
                .interfaces
                .get(&class.symbol_id)
                .cloned()
                .unwrap_or_default(),
        }
    }

    pub fn subclasses_of(&self, class: &Def) -> Vec<Def> {
        self.subclasses
            .get(&class.symbol_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.defs.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn implementations_of(&self, interface: &Def) -> Vec<Def> {
        self.implementors
            .get(&interface.symbol_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.defs.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The chain of parents from `class` upward, nearest first. Cycles in
    /// malformed input terminate at the first repeat.
    pub fn chain_of(&self, class: &Def) -> Vec<Def> {
        let mut chain = Vec::new();
        let mut seen = std::collections::HashSet::new();
        let mut current = class.symbol_id.clone();
        while let Some(parent) = self.parents.get(&current) {
            if !seen.insert(parent.symbol_id.clone()) {
                break;
            }
            chain.push(parent.clone());
            current = parent.symbol_id.clone();
        }
        chain
    }

    pub fn is_subclass_of(&self, child: &Def, ancestor: &Def) -> bool {
        self.chain_of(child)
            .iter()
            .any(|d| d.symbol_id == ancestor.symbol_id)
    }
}

/// A class name mentioned in a file resolves to the same file's class defs
/// first, then to whatever an import of that name points at.
fn resolve_class_name(file: &str, name: &str, artifacts: &ProjectArtifacts) -> Option<Def> {
    if let Some(graph) = artifacts.graphs.get(file) {
        if let Some((idx, _)) = graph
            .defs()
            .find(|(_, d)| d.name == name && d.symbol_kind.is_class_like())
        {
            return graph.def_value(idx);
        }
    }
    artifacts
        .imports
        .get(file)?
        .iter()
        .find(|i| i.local_name == name && i.definition.symbol_kind.is_class_like())
        .map(|i| i.definition.clone())
}
