// src/normalize.rs
//! Compact, project-relative rendering of install paths.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

/// Marker standing in for a nested `node_modules` directory.
pub const NESTED_MARKER: &str = "/~/";

static NESTED_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[/\\]node_modules[/\\]").expect("static regex"));

/// Rewrites paths relative to one project root.
#[derive(Debug, Clone)]
pub struct PathNormalizer {
    context: String,
}

impl PathNormalizer {
    pub fn new(context: impl AsRef<Path>) -> Self {
        let raw = context.as_ref().to_string_lossy();
        let collapsed = collapse_nested(&raw);
        let context = collapsed.trim_end_matches(['/', '\\']).to_string();
        Self { context }
    }

    /// Collapses nested-dependency segments, then makes the result relative
    /// to the project root (`./...`) when it lies under it.
    ///
    /// `normalize(normalize(p)) == normalize(p)`.
    pub fn normalize(&self, path: &str) -> String {
        let collapsed = collapse_nested(path);
        match self.strip_context(&collapsed) {
            Some(rest) => format!(".{rest}"),
            None => collapsed,
        }
    }

    pub fn normalize_path(&self, path: &Path) -> String {
        self.normalize(&path.to_string_lossy())
    }

    fn strip_context<'p>(&self, path: &'p str) -> Option<&'p str> {
        if self.context.is_empty() || self.context == "." {
            return None;
        }
        let rest = path.strip_prefix(self.context.as_str())?;
        // only at a component boundary: "/proj" must not claim "/project"
        if rest.is_empty() || rest.starts_with(['/', '\\']) {
            Some(rest)
        } else {
            None
        }
    }
}

/// Replaces every `<sep>node_modules<sep>` with [`NESTED_MARKER`].
///
/// Runs to a fixed point so back-to-back segments
/// (`node_modules/node_modules`) cannot survive a single sweep.
pub fn collapse_nested(path: &str) -> String {
    let mut out = path.to_string();
    while NESTED_SEGMENT.is_match(&out) {
        out = NESTED_SEGMENT.replace_all(&out, NESTED_MARKER).into_owned();
    }
    out
}
