// src/source.rs
//! Where package metadata comes from.

use crate::error::ManifestError;
use serde_json::Value as Json;
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

/// Package metadata file name.
pub const MANIFEST_FILE: &str = "package.json";

/// The parts of a `package.json` the checker cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageManifest {
    /// `None` when the field is missing, empty, or not a string.
    pub name: Option<String>,
    pub version: String,
}

impl PackageManifest {
    pub fn from_slice(path: &Path, bytes: &[u8]) -> Result<Self, ManifestError> {
        let v: Json = serde_json::from_slice(bytes).map_err(|e| ManifestError::Json {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let name = v
            .get("name")
            .and_then(|n| n.as_str())
            .filter(|n| !n.is_empty())
            .map(|n| n.to_string());
        let version = v
            .get("version")
            .and_then(|s| s.as_str())
            .unwrap_or_default()
            .to_string();
        Ok(PackageManifest { name, version })
    }
}

/// File-system capabilities the locator needs.
pub trait PackageSource {
    /// Nearest directory at or above `from` holding a manifest file.
    fn find_package_root(&self, from: &Path) -> Option<PathBuf>;

    /// Reads and parses the manifest in `root`.
    fn read_manifest(&self, root: &Path) -> Result<PackageManifest, ManifestError>;
}

/// Reads manifests from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsPackageSource;

impl PackageSource for FsPackageSource {
    fn find_package_root(&self, from: &Path) -> Option<PathBuf> {
        from.ancestors()
            .find(|dir| dir.join(MANIFEST_FILE).is_file())
            .map(Path::to_path_buf)
    }

    fn read_manifest(&self, root: &Path) -> Result<PackageManifest, ManifestError> {
        let path = root.join(MANIFEST_FILE);
        let data = fs::read(&path).map_err(|e| ManifestError::Io {
            path: path.clone(),
            message: e.to_string(),
        })?;
        PackageManifest::from_slice(&path, &data)
    }
}

/// Manifests held in memory, keyed by package root directory.
///
/// For hosts whose modules never touch a real disk (virtual file systems,
/// remote builds) and for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryPackageSource {
    manifests: HashMap<PathBuf, String>,
}

impl MemoryPackageSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, root: impl Into<PathBuf>, manifest_json: impl Into<String>) {
        self.manifests.insert(root.into(), manifest_json.into());
    }

    pub fn with_manifest(mut self, root: impl Into<PathBuf>, manifest_json: impl Into<String>) -> Self {
        self.insert(root, manifest_json);
        self
    }

    /// Shorthand for a manifest carrying just `name` and `version`.
    pub fn with_package(self, root: impl Into<PathBuf>, name: &str, version: &str) -> Self {
        let json = serde_json::json!({ "name": name, "version": version }).to_string();
        self.with_manifest(root, json)
    }
}

impl PackageSource for MemoryPackageSource {
    fn find_package_root(&self, from: &Path) -> Option<PathBuf> {
        from.ancestors()
            .find(|dir| self.manifests.contains_key(*dir))
            .map(Path::to_path_buf)
    }

    fn read_manifest(&self, root: &Path) -> Result<PackageManifest, ManifestError> {
        let path = root.join(MANIFEST_FILE);
        let data = self.manifests.get(root).ok_or_else(|| ManifestError::Io {
            path: path.clone(),
            message: "not found".to_string(),
        })?;
        PackageManifest::from_slice(&path, data.as_bytes())
    }
}
