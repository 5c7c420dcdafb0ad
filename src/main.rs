// src/main.rs
use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use dupinspect::{
    Checker, CheckerOptions, ConfigFile, Diagnostics, DuplicateMap, FsPackageSource, GraphFile,
    PassSummary, PatternRule, RuleSet, Style,
};
use serde::Serialize;
use std::{
    fs,
    io::IsTerminal,
    path::{Path, PathBuf},
    process::ExitCode,
};

#[derive(Parser, Debug)]
#[command(name = "dupinspect", version, about = "Report npm packages bundled more than once at conflicting versions")]
struct Cli {
    /// Module graph dumped by the build (JSON)
    graph: PathBuf,

    /// Project root used to shorten paths (defaults to the graph's context, then the current directory)
    #[arg(long, value_name = "DIR")]
    context: Option<PathBuf>,

    /// Config file (YAML or JSON)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Show the module that first pulled in each instance
    #[arg(long)]
    verbose: bool,

    /// Append the resolution hint to the report
    #[arg(long, value_name = "BOOL", action = ArgAction::Set)]
    show_help: Option<bool>,

    /// Report duplicates as errors (exit status 1) instead of warnings
    #[arg(long)]
    emit_error: bool,

    /// Only report versions that share a major version
    #[arg(long)]
    relaxed: bool,

    /// Exclude packages whose name matches any of these regex patterns. Repeatable.
    #[arg(short = 'x', long = "exclude", value_name = "REGEX")]
    excludes: Vec<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Write output to a file (use '-' for stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Disable coloured output
    #[arg(long)]
    no_color: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', action = ArgAction::Count)]
    log_level: u8,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    summary: PassSummary,
    duplicates: &'a DuplicateMap,
    diagnostics: &'a Diagnostics,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    let options = build_options(&cli)?;
    let (graph_context, graph) = GraphFile::load(&cli.graph)
        .with_context(|| format!("failed to load module graph {}", cli.graph.display()))?
        .into_graph();
    let context = match cli.context.clone().or(graph_context) {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    let checker = Checker::new(options).with_style(report_style(&cli));
    log::debug!("{:?}", checker.options());

    let source = FsPackageSource;
    let mut sink = Diagnostics::new();
    let (summary, duplicates) = checker.check_detailed(&graph, &source, &context, &mut sink);

    let buf = match cli.format {
        Format::Json => serde_json::to_string_pretty(&JsonReport {
            summary,
            duplicates: &duplicates,
            diagnostics: &sink,
        })?,
        Format::Text => render_text(&sink),
    };

    match &cli.output {
        Some(path) if path.as_os_str() == "-" => println!("{buf}"),
        Some(path) => write_output(path, &buf)?,
        None => match cli.format {
            Format::Json => println!("{buf}"),
            Format::Text if !buf.is_empty() => eprint!("{buf}"),
            Format::Text => {}
        },
    }

    Ok(if sink.errors.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn init_logging(level: u8) {
    let filter = match level {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .format_timestamp(None)
        .init();
}

/// Config file first, then command-line flags on top.
fn build_options(cli: &Cli) -> Result<CheckerOptions> {
    let mut options = match &cli.config {
        Some(path) => ConfigFile::load(path)?.into_options(),
        None => CheckerOptions::default(),
    };

    if cli.verbose {
        options.verbose = true;
    }
    if let Some(show_help) = cli.show_help {
        options.show_help = show_help;
    }
    if cli.emit_error {
        options.emit_error = true;
    }
    if cli.relaxed {
        options.strict = false;
    }

    if !cli.excludes.is_empty() {
        let mut rules = RuleSet::default();
        if let Some(existing) = options.exclude.take() {
            rules.push_boxed(existing);
        }
        for pattern in &cli.excludes {
            rules.push(PatternRule::name(pattern));
        }
        options.exclude = Some(Box::new(rules));
    }

    Ok(options)
}

/// Colour only text reports going straight to a terminal.
fn report_style(cli: &Cli) -> Style {
    let colored = matches!(cli.format, Format::Text)
        && !cli.no_color
        && cli.output.is_none()
        && std::io::stderr().is_terminal();
    if colored {
        Style::Colored
    } else {
        Style::Plain
    }
}

fn render_text(sink: &Diagnostics) -> String {
    let mut out = String::new();
    for (label, messages) in [("ERROR", &sink.errors), ("WARNING", &sink.warnings)] {
        for message in messages {
            out.push_str(label);
            out.push_str(" in ");
            out.push_str(message);
            out.push_str("\n\n");
        }
    }
    out
}

fn write_output(path: &Path, buf: &str) -> Result<()> {
    fs::write(path, buf).with_context(|| format!("failed to write {}", path.display()))
}
