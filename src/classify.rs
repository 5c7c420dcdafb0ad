// src/classify.rs
//! Decides which instance sets count as duplicated.

use crate::aggregate::{Instance, PackageInstanceMap};
use deno_semver::Version;
use serde::Serialize;
use std::collections::BTreeMap;

/// Duplicated package name -> its duplicated instances, versions ascending.
pub type DuplicateMap = BTreeMap<String, Vec<Instance>>;

/// Duplication policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// Two or more versions of a name are a duplicate.
    #[default]
    Strict,
    /// Only two or more versions sharing a major version are a duplicate.
    Relaxed,
}

impl Policy {
    pub fn from_strict(strict: bool) -> Self {
        if strict {
            Policy::Strict
        } else {
            Policy::Relaxed
        }
    }
}

/// What an [`ExcludeRule`] gets to look at.
#[derive(Debug, Clone, Copy)]
pub struct ExcludeCandidate<'a> {
    pub name: &'a str,
    pub version: &'a str,
    pub path: &'a str,
    pub issuer: Option<&'a str>,
    pub issuer_paths: &'a [String],
}

impl<'a> ExcludeCandidate<'a> {
    pub fn new(name: &'a str, instance: &'a Instance) -> Self {
        Self {
            name,
            version: &instance.version,
            path: &instance.path,
            issuer: instance.issuer.as_deref(),
            issuer_paths: &instance.issuer_paths,
        }
    }
}

/// Removes instances from the report.
pub trait ExcludeRule {
    /// `true` drops the candidate.
    fn excludes(&self, candidate: &ExcludeCandidate<'_>) -> bool;
}

impl<F> ExcludeRule for F
where
    F: Fn(&ExcludeCandidate<'_>) -> bool,
{
    fn excludes(&self, candidate: &ExcludeCandidate<'_>) -> bool {
        self(candidate)
    }
}

/// A list of rules; any rule excluding a candidate excludes it.
#[derive(Default)]
pub struct RuleSet(Vec<Box<dyn ExcludeRule>>);

impl RuleSet {
    pub fn push(&mut self, rule: impl ExcludeRule + 'static) {
        self.0.push(Box::new(rule));
    }

    pub fn push_boxed(&mut self, rule: Box<dyn ExcludeRule>) {
        self.0.push(rule);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl ExcludeRule for RuleSet {
    fn excludes(&self, candidate: &ExcludeCandidate<'_>) -> bool {
        self.0.iter().any(|rule| rule.excludes(candidate))
    }
}

/// Integer major version, parsed the way npm reads versions (a leading `v` or
/// `=` is accepted). `None` when the text is not a version.
pub fn major_version(version: &str) -> Option<u64> {
    Version::parse_from_npm(version.trim())
        .ok()
        .map(|v| v.major)
}

/// Picks out the duplicated instance sets of `map`.
pub fn classify(
    map: &PackageInstanceMap,
    policy: Policy,
    exclude: Option<&dyn ExcludeRule>,
) -> DuplicateMap {
    let mut out = DuplicateMap::new();

    for (name, instances) in map.iter() {
        if instances.len() <= 1 {
            continue;
        }

        let mut filtered: Vec<Instance> = match policy {
            Policy::Strict => instances.to_vec(),
            Policy::Relaxed => same_major_groups(instances),
        };
        if filtered.is_empty() {
            continue;
        }

        if let Some(rule) = exclude {
            filtered.retain(|instance| !rule.excludes(&ExcludeCandidate::new(name, instance)));
            if filtered.len() <= 1 {
                log::debug!("{name}: exclusions leave {} instance(s), not reported", filtered.len());
                continue;
            }
        }

        // plain string order, so "10.0.0" sorts before "9.0.0"
        filtered.sort_by(|a, b| a.version.cmp(&b.version));
        out.insert(name.to_string(), filtered);
    }

    out
}

/// Instances whose major-version group has two or more members, in input order.
///
/// A version that does not parse forms a group of its own, so it never
/// qualifies.
fn same_major_groups(instances: &[Instance]) -> Vec<Instance> {
    let majors: Vec<Option<u64>> = instances
        .iter()
        .map(|i| major_version(&i.version))
        .collect();

    let mut group_sizes: BTreeMap<u64, usize> = BTreeMap::new();
    for major in majors.iter().flatten() {
        *group_sizes.entry(*major).or_default() += 1;
    }

    instances
        .iter()
        .zip(&majors)
        .filter(|(instance, major)| match major {
            Some(m) => group_sizes[m] >= 2,
            None => {
                log::debug!("unparsable version {:?}, not grouped", instance.version);
                false
            }
        })
        .map(|(instance, _)| instance.clone())
        .collect()
}
