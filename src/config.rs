// src/config.rs
//! Checker options and the optional config file they can be loaded from.

use crate::classify::{ExcludeCandidate, ExcludeRule, Policy, RuleSet};
use crate::error::ConfigError;
use regex::Regex;
use serde::Deserialize;
use std::{fmt, fs, path::Path};

/// Options for one checker pass.
pub struct CheckerOptions {
    /// Append each instance's immediate issuer to its report line.
    pub verbose: bool,
    /// Append the resolution hint to the last diagnostic.
    pub show_help: bool,
    /// Emit diagnostics as errors instead of warnings.
    pub emit_error: bool,
    /// See [`Policy`].
    pub strict: bool,
    pub exclude: Option<Box<dyn ExcludeRule>>,
}

impl Default for CheckerOptions {
    fn default() -> Self {
        Self {
            verbose: false,
            show_help: true,
            emit_error: false,
            strict: true,
            exclude: None,
        }
    }
}

impl fmt::Debug for CheckerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckerOptions")
            .field("verbose", &self.verbose)
            .field("show_help", &self.show_help)
            .field("emit_error", &self.emit_error)
            .field("strict", &self.strict)
            .field("exclude", &self.exclude.is_some())
            .finish()
    }
}

impl CheckerOptions {
    pub fn policy(&self) -> Policy {
        Policy::from_strict(self.strict)
    }

    pub fn with_exclude(mut self, rule: impl ExcludeRule + 'static) -> Self {
        self.exclude = Some(Box::new(rule));
        self
    }
}

/// Config file contents. Every field is optional; absent fields keep defaults.
///
/// ```yaml
/// strict: false
/// exclude:
///   - name: "^lodash$"
///     version: "^3\\."
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub verbose: Option<bool>,
    pub show_help: Option<bool>,
    pub emit_error: Option<bool>,
    pub strict: Option<bool>,
    pub exclude: Vec<PatternSpec>,
}

/// One exclude entry: regexes over instance fields, all of which must match.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PatternSpec {
    pub name: Option<String>,
    pub version: Option<String>,
    pub path: Option<String>,
}

impl ConfigFile {
    /// Loads YAML or JSON.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&text)?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn into_options(self) -> CheckerOptions {
        let defaults = CheckerOptions::default();
        let mut rules = RuleSet::default();
        for spec in &self.exclude {
            rules.push(PatternRule::new(spec));
        }
        CheckerOptions {
            verbose: self.verbose.unwrap_or(defaults.verbose),
            show_help: self.show_help.unwrap_or(defaults.show_help),
            emit_error: self.emit_error.unwrap_or(defaults.emit_error),
            strict: self.strict.unwrap_or(defaults.strict),
            exclude: if rules.is_empty() {
                None
            } else {
                Some(Box::new(rules))
            },
        }
    }
}

/// Exclude rule built from regexes.
#[derive(Debug, Clone)]
pub struct PatternRule {
    name: Option<Regex>,
    version: Option<Regex>,
    path: Option<Regex>,
}

impl PatternRule {
    pub fn new(spec: &PatternSpec) -> Self {
        Self {
            name: spec.name.as_deref().and_then(compile_pattern),
            version: spec.version.as_deref().and_then(compile_pattern),
            path: spec.path.as_deref().and_then(compile_pattern),
        }
    }

    /// Matches on package name only.
    pub fn name(pattern: &str) -> Self {
        Self {
            name: compile_pattern(pattern),
            version: None,
            path: None,
        }
    }
}

impl ExcludeRule for PatternRule {
    fn excludes(&self, c: &ExcludeCandidate<'_>) -> bool {
        let checks = [
            (&self.name, c.name),
            (&self.version, c.version),
            (&self.path, c.path),
        ];
        let mut any = false;
        for (rx, value) in checks {
            if let Some(rx) = rx {
                if !rx.is_match(value) {
                    return false;
                }
                any = true;
            }
        }
        any
    }
}

/// Compiles `pattern`, falling back to a literal match if it is not a valid regex.
fn compile_pattern(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(rx) => Some(rx),
        Err(_) => {
            log::warn!("invalid exclude pattern {pattern:?}, matching it literally");
            Regex::new(&regex::escape(pattern)).ok()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Instance;

    fn instance(version: &str, path: &str) -> Instance {
        Instance {
            version: version.to_string(),
            path: path.to_string(),
            issuer: None,
            issuer_paths: Vec::new(),
        }
    }

    #[test]
    fn test_defaults() {
        let opts = CheckerOptions::default();
        assert!(!opts.verbose);
        assert!(opts.show_help);
        assert!(!opts.emit_error);
        assert!(opts.strict);
        assert!(opts.exclude.is_none());
        assert_eq!(opts.policy(), Policy::Strict);
    }

    #[test]
    fn test_parse_yaml_config() {
        let config = ConfigFile::parse(
            "strict: false\nemit_error: true\nexclude:\n  - name: \"^lodash$\"\n    version: \"^3\\\\.\"\n",
        )
        .unwrap();
        let opts = config.into_options();
        assert!(!opts.strict);
        assert!(opts.emit_error);
        assert!(opts.show_help);

        let rule = opts.exclude.unwrap();
        let old = instance("3.10.1", "./~/lodash");
        let new = instance("4.17.21", "./~/lodash");
        assert!(rule.excludes(&ExcludeCandidate::new("lodash", &old)));
        assert!(!rule.excludes(&ExcludeCandidate::new("lodash", &new)));
        assert!(!rule.excludes(&ExcludeCandidate::new("lodash-es", &old)));
    }

    #[test]
    fn test_parse_json_config() {
        let config = ConfigFile::parse(r#"{"verbose": true, "show_help": false}"#).unwrap();
        let opts = config.into_options();
        assert!(opts.verbose);
        assert!(!opts.show_help);
        assert!(opts.exclude.is_none());
    }

    #[test]
    fn test_empty_config_is_default() {
        let opts = ConfigFile::parse("  \n").unwrap().into_options();
        assert!(opts.strict);
        assert!(opts.show_help);
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(matches!(
            ConfigFile::parse("stric: true"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn test_pattern_rule_fields() {
        let rule = PatternRule::new(&PatternSpec {
            name: None,
            version: None,
            path: Some("~/legacy".to_string()),
        });
        let nested = instance("1.0.0", "./~/legacy/~/react");
        let top = instance("2.0.0", "./~/react");
        assert!(rule.excludes(&ExcludeCandidate::new("react", &nested)));
        assert!(!rule.excludes(&ExcludeCandidate::new("react", &top)));

        let empty = PatternRule::new(&PatternSpec::default());
        assert!(!empty.excludes(&ExcludeCandidate::new("react", &top)));
    }

    #[test]
    fn test_invalid_regex_matches_literally() {
        let rule = PatternRule::name("core-js(");
        let i = instance("1.0.0", "./~/x");
        assert!(rule.excludes(&ExcludeCandidate::new("core-js(", &i)));
        assert!(!rule.excludes(&ExcludeCandidate::new("core-js", &i)));
    }
}
