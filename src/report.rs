// src/report.rs
//! Turns classified duplicates into diagnostic messages.

use crate::aggregate::Instance;
use crate::classify::DuplicateMap;
use colored::{ColoredString, Colorize};
use serde::Serialize;
use std::fmt::Write;

pub const HELP_TEXT: &str = "Check how you can resolve duplicate packages:";
pub const HELP_URL: &str = "https://github.com/darrenscerri/duplicate-package-checker-webpack-plugin#resolving-duplicate-packages-in-your-bundle";

/// Whether messages carry ANSI colour codes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Style {
    #[default]
    Plain,
    Colored,
}

impl Style {
    fn paint(self, text: &str, color: impl Fn(&str) -> ColoredString) -> String {
        match self {
            Style::Plain => text.to_string(),
            Style::Colored => color(text).to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    pub verbose: bool,
    pub show_help: bool,
    pub style: Style,
}

/// The host's diagnostic channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `messages`, in order, to `errors` or `warnings`.
    pub fn emit(&mut self, messages: Vec<String>, as_error: bool) {
        if as_error {
            self.errors.extend(messages);
        } else {
            self.warnings.extend(messages);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}

/// One message per duplicated name, names ascending, versions ascending as
/// plain strings.
pub fn format_report(duplicates: &DuplicateMap, opts: &ReportOptions) -> Vec<String> {
    let mut names: Vec<&String> = duplicates.keys().collect();
    names.sort();

    let mut messages: Vec<String> = names
        .into_iter()
        .map(|name| format_package(name, &duplicates[name], opts))
        .collect();

    if opts.show_help {
        if let Some(last) = messages.last_mut() {
            let _ = write!(
                last,
                "\n\n{}\n{}",
                opts.style.paint(HELP_TEXT, |s| s.white().bold()),
                HELP_URL
            );
        }
    }
    messages
}

fn format_package(name: &str, instances: &[Instance], opts: &ReportOptions) -> String {
    let style = opts.style;
    let mut sorted: Vec<&Instance> = instances.iter().collect();
    sorted.sort_by(|a, b| a.version.cmp(&b.version));

    let mut out = String::new();
    out.push_str(name);
    let _ = write!(
        out,
        "\n  {}{}{}",
        style.paint("Multiple versions of ", |s| s.yellow()),
        style.paint(name, |s| s.green().bold()),
        style.paint(" found:", |s| s.yellow()),
    );

    for instance in sorted {
        let _ = write!(
            out,
            "\n    {} {}",
            style.paint(&instance.version, |s| s.green().bold()),
            style.paint(&instance.path, |s| s.white().bold()),
        );
        if opts.verbose {
            if let Some(issuer) = &instance.issuer {
                let _ = write!(out, " from {}", style.paint(issuer, |s| s.white().bold()));
            }
        }
        for issuer_path in &instance.issuer_paths {
            let _ = write!(out, "\n      {issuer_path}");
        }
    }
    out
}
