// src/checker.rs
//! One report pass: aggregate, classify, format, emit.

use crate::aggregate::aggregate;
use crate::classify::{classify, DuplicateMap};
use crate::config::CheckerOptions;
use crate::graph::ModuleGraph;
use crate::report::{format_report, Diagnostics, ReportOptions, Style};
use crate::source::PackageSource;
use serde::Serialize;
use std::path::Path;

/// Counts from one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassSummary {
    pub modules: usize,
    pub packages: usize,
    pub duplicates: usize,
    pub messages: usize,
}

/// Runs duplicate checks with fixed options. Holds no per-pass state, so one
/// checker can serve any number of builds.
#[derive(Debug, Default)]
pub struct Checker {
    options: CheckerOptions,
    style: Style,
}

impl Checker {
    pub fn new(options: CheckerOptions) -> Self {
        Self {
            options,
            style: Style::Plain,
        }
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn options(&self) -> &CheckerOptions {
        &self.options
    }

    /// Aggregates and classifies without formatting.
    pub fn find_duplicates<S: PackageSource + ?Sized>(
        &self,
        graph: &ModuleGraph,
        source: &S,
        context: &Path,
    ) -> DuplicateMap {
        let map = aggregate(graph, source, context);
        classify(&map, self.options.policy(), self.options.exclude.as_deref())
    }

    /// Runs a full pass and appends the resulting messages to `sink`.
    ///
    /// Always completes; returning is the completion signal, with or without
    /// duplicates.
    pub fn check<S: PackageSource + ?Sized>(
        &self,
        graph: &ModuleGraph,
        source: &S,
        context: &Path,
        sink: &mut Diagnostics,
    ) -> PassSummary {
        self.check_detailed(graph, source, context, sink).0
    }

    /// Like [`Checker::check`], also handing back the classified duplicates.
    pub fn check_detailed<S: PackageSource + ?Sized>(
        &self,
        graph: &ModuleGraph,
        source: &S,
        context: &Path,
        sink: &mut Diagnostics,
    ) -> (PassSummary, DuplicateMap) {
        let map = aggregate(graph, source, context);
        let duplicates = classify(&map, self.options.policy(), self.options.exclude.as_deref());
        let messages = format_report(
            &duplicates,
            &ReportOptions {
                verbose: self.options.verbose,
                show_help: self.options.show_help,
                style: self.style,
            },
        );

        let summary = PassSummary {
            modules: graph.len(),
            packages: map.len(),
            duplicates: duplicates.len(),
            messages: messages.len(),
        };
        log::info!(
            "checked {} modules in {} packages, {} duplicated",
            summary.modules,
            summary.packages,
            summary.duplicates
        );

        sink.emit(messages, self.options.emit_error);
        (summary, duplicates)
    }
}
