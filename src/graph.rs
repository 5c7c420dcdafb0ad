// src/graph.rs
//! The resolved module graph handed over by the build tool.
//!
//! Modules live in an arena and refer to their issuer by [`ModuleId`], so an
//! issuer chain is a walk over indices rather than over owned references. The
//! graph makes no acyclicity promise; walkers must guard against revisits.

use crate::error::GraphError;
use serde::Deserialize;
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

/// Index of a module inside a [`ModuleGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(usize);

/// One module the build resolved.
#[derive(Debug, Clone, Default)]
pub struct ResolvedModule {
    /// Physical source file; `None` for virtual modules.
    pub resource: Option<PathBuf>,
    /// The module whose import pulled this one in.
    pub issuer: Option<ModuleId>,
}

#[derive(Debug, Clone, Default)]
pub struct ModuleGraph {
    modules: Vec<ResolvedModule>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a module and returns its id. Scan order is append order.
    pub fn add(&mut self, resource: Option<PathBuf>, issuer: Option<ModuleId>) -> ModuleId {
        let id = ModuleId(self.modules.len());
        self.modules.push(ResolvedModule { resource, issuer });
        id
    }

    /// Re-points a module's issuer. Lets hosts wire forward references.
    pub fn set_issuer(&mut self, id: ModuleId, issuer: Option<ModuleId>) {
        if let Some(module) = self.modules.get_mut(id.0) {
            module.issuer = issuer;
        }
    }

    pub fn get(&self, id: ModuleId) -> Option<&ResolvedModule> {
        self.modules.get(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ModuleId, &ResolvedModule)> {
        self.modules
            .iter()
            .enumerate()
            .map(|(idx, module)| (ModuleId(idx), module))
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// On-disk form of a module graph, as dumped by a build tool.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphFile {
    /// Project root the build ran in.
    #[serde(default)]
    pub context: Option<PathBuf>,
    pub modules: Vec<ModuleRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModuleRecord {
    /// Build-tool identifier, referenced by other records' `issuer`.
    pub id: String,
    #[serde(default)]
    pub resource: Option<PathBuf>,
    #[serde(default)]
    pub issuer: Option<String>,
}

impl GraphFile {
    pub fn load(path: &Path) -> Result<Self, GraphError> {
        let data = fs::read(path)?;
        Self::from_slice(&data)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, GraphError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Builds the arena, resolving issuer identifiers to ids.
    ///
    /// An issuer naming no record is dropped. When two records share an
    /// identifier, issuer references resolve to the first of them.
    pub fn into_graph(self) -> (Option<PathBuf>, ModuleGraph) {
        let mut graph = ModuleGraph::new();
        let mut ids: HashMap<String, ModuleId> = HashMap::new();
        let mut pending: Vec<(ModuleId, String)> = Vec::new();

        for record in self.modules {
            let id = graph.add(record.resource, None);
            if ids.contains_key(&record.id) {
                log::debug!("duplicate module identifier {:?}", record.id);
            } else {
                ids.insert(record.id, id);
            }
            if let Some(issuer) = record.issuer {
                pending.push((id, issuer));
            }
        }

        for (id, issuer) in pending {
            match ids.get(&issuer) {
                Some(issuer_id) => graph.set_issuer(id, Some(*issuer_id)),
                None => log::debug!("issuer {:?} names no module, ignoring", issuer),
            }
        }

        (self.context, graph)
    }
}
