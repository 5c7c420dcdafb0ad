// src/aggregate.rs
//! One pass over the module graph: package name -> installed instances.

use crate::graph::{ModuleGraph, ModuleId};
use crate::issuer::{render_issuer_path, trace_chain};
use crate::locator::PackageLocator;
use crate::normalize::PathNormalizer;
use crate::source::PackageSource;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// One physical installation of a package at one version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Instance {
    pub version: String,
    /// Normalized package root.
    pub path: String,
    /// Normalized resource of the first module that pulled this instance in.
    pub issuer: Option<String>,
    /// Distinct rendered issuer chains, in first-seen order.
    pub issuer_paths: Vec<String>,
}

impl Instance {
    fn new(version: String, path: String, issuer: Option<String>) -> Self {
        Self {
            version,
            path,
            issuer,
            issuer_paths: Vec::new(),
        }
    }

    fn add_issuer_path(&mut self, rendered: String) {
        if !self.issuer_paths.contains(&rendered) {
            self.issuer_paths.push(rendered);
        }
    }
}

/// Package name -> instances in first-encountered order, one per version.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct PackageInstanceMap {
    packages: BTreeMap<String, Vec<Instance>>,
}

impl PackageInstanceMap {
    pub fn get(&self, name: &str) -> Option<&[Instance]> {
        self.packages.get(name).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Instance])> {
        self.packages
            .iter()
            .map(|(name, instances)| (name.as_str(), instances.as_slice()))
    }

    /// Number of distinct package names.
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    fn instance_mut(&mut self, name: &str, version: &str) -> Option<&mut Instance> {
        self.packages
            .get_mut(name)?
            .iter_mut()
            .find(|i| i.version == version)
    }

    fn push(&mut self, name: String, instance: Instance) {
        self.packages.entry(name).or_default().push(instance);
    }
}

/// Aggregation state for one report pass.
pub struct Aggregator<'a, S: PackageSource + ?Sized> {
    locator: PackageLocator<'a, S>,
    normalizer: PathNormalizer,
    map: PackageInstanceMap,
}

impl<'a, S: PackageSource + ?Sized> Aggregator<'a, S> {
    pub fn new(source: &'a S, context: &Path) -> Self {
        Self {
            locator: PackageLocator::new(source),
            normalizer: PathNormalizer::new(context),
            map: PackageInstanceMap::default(),
        }
    }

    /// Records one module's contribution. Modules without a resource or
    /// outside any package contribute nothing.
    pub fn add_module(&mut self, graph: &ModuleGraph, id: ModuleId) {
        let Some(module) = graph.get(id) else { return };
        let Some(resource) = module.resource.as_deref() else { return };
        let Some(pkg) = self.locator.locate(resource) else {
            log::debug!("no package owns {}", resource.display());
            return;
        };

        let issuer_resource = module
            .issuer
            .and_then(|issuer| graph.get(issuer))
            .and_then(|issuer| issuer.resource.as_deref());

        if self.map.instance_mut(&pkg.name, &pkg.version).is_none() {
            let path = self.normalizer.normalize_path(&pkg.root_path);
            let issuer = issuer_resource.map(|r| self.normalizer.normalize_path(r));
            self.map
                .push(pkg.name.clone(), Instance::new(pkg.version.clone(), path, issuer));
        }

        if issuer_resource.is_some() {
            let chain = trace_chain(graph, &mut self.locator, Some(id));
            let rendered = render_issuer_path(&chain);
            if let Some(instance) = self.map.instance_mut(&pkg.name, &pkg.version) {
                instance.add_issuer_path(rendered);
            }
        }
    }

    pub fn finish(self) -> PackageInstanceMap {
        self.map
    }
}

/// Builds the instance map for every module of `graph`, in graph order.
pub fn aggregate<S: PackageSource + ?Sized>(
    graph: &ModuleGraph,
    source: &S,
    context: &Path,
) -> PackageInstanceMap {
    let mut aggregator = Aggregator::new(source, context);
    for (id, _) in graph.iter() {
        aggregator.add_module(graph, id);
    }
    let map = aggregator.finish();
    log::debug!("aggregated {} modules into {} packages", graph.len(), map.len());
    map
}
