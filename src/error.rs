// src/error.rs
//! Error types. Only configuration and graph-loading errors ever reach a caller;
//! manifest errors are absorbed by the locator.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to read or parse a `package.json`.
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("io error reading {path}: {message}")]
    Io { path: PathBuf, message: String },
    #[error("json parse error in {path}: {message}")]
    Json { path: PathBuf, message: String },
}

/// Failure to load a module graph file handed over by the host.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("module graph parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure to load the checker configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("io error reading config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
