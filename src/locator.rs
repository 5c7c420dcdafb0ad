// src/locator.rs
//! Maps a file path to the package that owns it.

use crate::source::{PackageManifest, PackageSource};
use serde::Serialize;
use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
};

/// The `(name, version)` a package declares, plus the directory that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PackageIdentity {
    pub name: String,
    pub version: String,
    pub root_path: PathBuf,
}

impl PackageIdentity {
    /// `name@version`
    pub fn spec(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PackageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// Resolves file paths to their owning package.
///
/// Parsed manifests are cached per root directory for the lifetime of the
/// locator, which is one report pass.
pub struct PackageLocator<'a, S: PackageSource + ?Sized> {
    source: &'a S,
    cache: HashMap<PathBuf, Option<PackageManifest>>,
}

impl<'a, S: PackageSource + ?Sized> PackageLocator<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            cache: HashMap::new(),
        }
    }

    /// Finds the nearest package above `file_path` whose manifest has a name.
    ///
    /// Anonymous manifests (workspace roots, `private` markers without a name)
    /// are stepped over by searching again from the parent of their directory.
    /// Unreadable or invalid manifests end the search with `None`.
    pub fn locate(&mut self, file_path: &Path) -> Option<PackageIdentity> {
        let mut from = file_path.to_path_buf();
        loop {
            let root = self.source.find_package_root(&from)?;
            let manifest = self.manifest(&root)?;
            match manifest.name {
                Some(name) => {
                    log::trace!("{} -> {}@{}", file_path.display(), name, manifest.version);
                    return Some(PackageIdentity {
                        name,
                        version: manifest.version,
                        root_path: root,
                    });
                }
                None => {
                    log::trace!("anonymous manifest in {}, retrying above", root.display());
                    from = root.parent()?.to_path_buf();
                }
            }
        }
    }

    fn manifest(&mut self, root: &Path) -> Option<PackageManifest> {
        if let Some(cached) = self.cache.get(root) {
            return cached.clone();
        }
        let parsed = match self.source.read_manifest(root) {
            Ok(m) => Some(m),
            Err(e) => {
                log::debug!("ignoring package manifest: {e}");
                None
            }
        };
        self.cache.insert(root.to_path_buf(), parsed.clone());
        parsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemoryPackageSource;

    #[test]
    fn test_locate_nearest_package() {
        let source = MemoryPackageSource::new()
            .with_package("/proj", "app", "1.0.0")
            .with_package("/proj/node_modules/react", "react", "18.2.0");
        let mut locator = PackageLocator::new(&source);

        let id = locator
            .locate(Path::new("/proj/node_modules/react/cjs/react.js"))
            .unwrap();
        assert_eq!(id.name, "react");
        assert_eq!(id.version, "18.2.0");
        assert_eq!(id.root_path, PathBuf::from("/proj/node_modules/react"));
        assert_eq!(id.spec(), "react@18.2.0");
        assert_eq!(id.spec(), id.to_string());
    }

    #[test]
    fn test_locate_skips_anonymous_manifest() {
        let source = MemoryPackageSource::new()
            .with_package("/proj/node_modules/lib", "lib", "3.1.0")
            .with_manifest("/proj/node_modules/lib/esm", r#"{"type":"module"}"#);
        let mut locator = PackageLocator::new(&source);

        let id = locator
            .locate(Path::new("/proj/node_modules/lib/esm/index.js"))
            .unwrap();
        assert_eq!(id.name, "lib");
        assert_eq!(id.version, "3.1.0");
        assert_eq!(id.root_path, PathBuf::from("/proj/node_modules/lib"));
    }

    #[test]
    fn test_locate_anonymous_all_the_way_up() {
        let source = MemoryPackageSource::new()
            .with_manifest("/", r#"{"private":true}"#)
            .with_manifest("/proj", r#"{"workspaces":[]}"#);
        let mut locator = PackageLocator::new(&source);
        assert_eq!(locator.locate(Path::new("/proj/src/index.js")), None);
    }

    #[test]
    fn test_locate_outside_any_package() {
        let source = MemoryPackageSource::new().with_package("/proj", "app", "1.0.0");
        let mut locator = PackageLocator::new(&source);
        assert_eq!(locator.locate(Path::new("/tmp/loose.js")), None);
    }

    #[test]
    fn test_locate_invalid_manifest_is_not_found() {
        let source = MemoryPackageSource::new()
            .with_package("/proj", "app", "1.0.0")
            .with_manifest("/proj/node_modules/broken", "{ nope");
        let mut locator = PackageLocator::new(&source);
        assert_eq!(
            locator.locate(Path::new("/proj/node_modules/broken/index.js")),
            None
        );
    }

    #[test]
    fn test_locate_missing_version_reads_empty() {
        let source = MemoryPackageSource::new().with_manifest("/proj", r#"{"name":"app"}"#);
        let mut locator = PackageLocator::new(&source);
        let id = locator.locate(Path::new("/proj/index.js")).unwrap();
        assert_eq!(id.version, "");
        assert_eq!(id.to_string(), "app@");
    }
}
