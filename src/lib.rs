// src/lib.rs
//! Finds npm packages bundled more than once at conflicting versions.
//!
//! A build hands over its resolved module graph; each module is mapped to the
//! package that owns it, instances of the same package name are grouped by
//! version, and names with conflicting instances are reported together with
//! the import chains that pulled each instance in.
//!
//! ```ignore
//! use dupinspect::{Checker, CheckerOptions, Diagnostics, FsPackageSource, GraphFile};
//!
//! let (context, graph) = GraphFile::load("stats.json".as_ref())?.into_graph();
//! let mut sink = Diagnostics::new();
//! Checker::new(CheckerOptions::default()).check(
//!     &graph,
//!     &FsPackageSource,
//!     context.as_deref().unwrap_or(".".as_ref()),
//!     &mut sink,
//! );
//! for warning in &sink.warnings {
//!     eprintln!("{warning}");
//! }
//! ```

pub mod aggregate;
pub mod checker;
pub mod classify;
pub mod config;
pub mod error;
pub mod graph;
pub mod issuer;
pub mod locator;
pub mod normalize;
pub mod report;
pub mod source;

pub use aggregate::{aggregate, Instance, PackageInstanceMap};
pub use checker::{Checker, PassSummary};
pub use classify::{classify, DuplicateMap, ExcludeCandidate, ExcludeRule, Policy, RuleSet};
pub use config::{CheckerOptions, ConfigFile, PatternRule, PatternSpec};
pub use error::{ConfigError, GraphError, ManifestError};
pub use graph::{GraphFile, ModuleGraph, ModuleId, ResolvedModule};
pub use locator::{PackageIdentity, PackageLocator};
pub use normalize::PathNormalizer;
pub use report::{format_report, Diagnostics, ReportOptions, Style};
pub use source::{FsPackageSource, MemoryPackageSource, PackageManifest, PackageSource};
