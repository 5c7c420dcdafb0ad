// src/issuer.rs
//! Reconstructs "who pulled this in" chains from issuer back-references.

use crate::graph::{ModuleGraph, ModuleId};
use crate::locator::PackageLocator;
use crate::source::PackageSource;
use std::collections::HashSet;

/// Prefix of every rendered issuer path.
pub const ROOT_MARKER: &str = "~/";
pub const CHAIN_SEPARATOR: &str = " -> ";

/// Distinct `name@version` entries of the packages that issued `module`,
/// closest issuer first.
pub fn trace_issuers<S: PackageSource + ?Sized>(
    graph: &ModuleGraph,
    locator: &mut PackageLocator<'_, S>,
    module: ModuleId,
) -> Vec<String> {
    let start = graph.get(module).and_then(|m| m.issuer);
    trace_chain(graph, locator, start)
}

/// Walks the issuer chain beginning at `start` (inclusive).
///
/// Stops at the first module without a resource, at the end of the chain, or
/// on revisiting a module. Modules that resolve to no package contribute
/// nothing but do not stop the walk. Entries are deduplicated by exact string.
pub fn trace_chain<S: PackageSource + ?Sized>(
    graph: &ModuleGraph,
    locator: &mut PackageLocator<'_, S>,
    start: Option<ModuleId>,
) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut visited: HashSet<ModuleId> = HashSet::new();
    let mut current = start;

    while let Some(id) = current {
        if !visited.insert(id) {
            log::warn!("issuer chain revisits a module, truncating after {} steps", visited.len());
            break;
        }
        let Some(module) = graph.get(id) else { break };
        let Some(resource) = module.resource.as_deref() else { break };

        if let Some(pkg) = locator.locate(resource) {
            let spec = pkg.spec();
            if !names.contains(&spec) {
                names.push(spec);
            }
        }
        current = module.issuer;
    }

    names
}

/// Renders a closest-first chain root-first, without its closest entry.
///
/// `["c@1", "b@1", "a@1"]` renders as `~/a@1 -> b@1`. A single entry renders
/// as the bare `~/`.
pub fn render_issuer_path(names: &[String]) -> String {
    let body = match names.split_first() {
        Some((_closest, rest)) => rest
            .iter()
            .rev()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(CHAIN_SEPARATOR),
        None => String::new(),
    };
    format!("{ROOT_MARKER}{body}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemoryPackageSource;

    fn source() -> MemoryPackageSource {
        MemoryPackageSource::new()
            .with_package("/p", "app", "1.0.0")
            .with_package("/p/node_modules/a", "a", "1.0.0")
            .with_package("/p/node_modules/b", "b", "2.0.0")
            .with_package("/p/node_modules/c", "c", "3.0.0")
    }

    #[test]
    fn test_trace_issuers_closest_first() {
        let source = source();
        let mut locator = PackageLocator::new(&source);
        let mut graph = ModuleGraph::new();
        let a = graph.add(Some("/p/node_modules/a/index.js".into()), None);
        let b = graph.add(Some("/p/node_modules/b/index.js".into()), Some(a));
        let c = graph.add(Some("/p/node_modules/c/index.js".into()), Some(b));

        assert_eq!(
            trace_issuers(&graph, &mut locator, c),
            vec!["b@2.0.0", "a@1.0.0"]
        );
        assert_eq!(
            trace_chain(&graph, &mut locator, Some(c)),
            vec!["c@3.0.0", "b@2.0.0", "a@1.0.0"]
        );
        assert!(trace_issuers(&graph, &mut locator, a).is_empty());
    }

    #[test]
    fn test_trace_dedupes_repeated_packages() {
        let source = source();
        let mut locator = PackageLocator::new(&source);
        let mut graph = ModuleGraph::new();
        let entry = graph.add(Some("/p/src/index.js".into()), None);
        let a1 = graph.add(Some("/p/node_modules/a/index.js".into()), Some(entry));
        let a2 = graph.add(Some("/p/node_modules/a/lib/util.js".into()), Some(a1));
        let b = graph.add(Some("/p/node_modules/b/index.js".into()), Some(a2));

        assert_eq!(
            trace_issuers(&graph, &mut locator, b),
            vec!["a@1.0.0", "app@1.0.0"]
        );
    }

    #[test]
    fn test_trace_stops_at_virtual_module() {
        let source = source();
        let mut locator = PackageLocator::new(&source);
        let mut graph = ModuleGraph::new();
        let a = graph.add(Some("/p/node_modules/a/index.js".into()), None);
        let virt = graph.add(None, Some(a));
        let b = graph.add(Some("/p/node_modules/b/index.js".into()), Some(virt));

        assert!(trace_issuers(&graph, &mut locator, b).is_empty());
    }

    #[test]
    fn test_trace_skips_unresolvable_issuer() {
        let source = source();
        let mut locator = PackageLocator::new(&source);
        let mut graph = ModuleGraph::new();
        let a = graph.add(Some("/p/node_modules/a/index.js".into()), None);
        let loose = graph.add(Some("/tmp/generated.js".into()), Some(a));
        let b = graph.add(Some("/p/node_modules/b/index.js".into()), Some(loose));

        assert_eq!(trace_issuers(&graph, &mut locator, b), vec!["a@1.0.0"]);
    }

    #[test]
    fn test_trace_terminates_on_cycle() {
        let source = source();
        let mut locator = PackageLocator::new(&source);
        let mut graph = ModuleGraph::new();
        let a = graph.add(Some("/p/node_modules/a/index.js".into()), None);
        let b = graph.add(Some("/p/node_modules/b/index.js".into()), Some(a));
        graph.set_issuer(a, Some(b));
        let c = graph.add(Some("/p/node_modules/c/index.js".into()), Some(b));

        assert_eq!(
            trace_issuers(&graph, &mut locator, c),
            vec!["b@2.0.0", "a@1.0.0"]
        );
    }

    #[test]
    fn test_render_issuer_path() {
        let chain: Vec<String> = ["c@3.0.0", "b@2.0.0", "a@1.0.0"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(render_issuer_path(&chain), "~/a@1.0.0 -> b@2.0.0");
        assert_eq!(render_issuer_path(&chain[..2]), "~/b@2.0.0");
    }

    #[test]
    fn test_render_single_and_empty() {
        assert_eq!(render_issuer_path(&["a@1.0.0".to_string()]), "~/");
        assert_eq!(render_issuer_path(&[]), "~/");
    }
}
