//! model-audit CLI - spreadsheet model auditor

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use model_audit::{
    analyze_with, audit_workbook, open_workbook, AuditOptions, AuditReport, CycleLimits,
    GraphBuilder, Severity,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "model-audit")]
#[command(
    author,
    version,
    about = "Audit spreadsheet financial models for structural and numerical problems"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every audit check and print the findings
    Audit {
        /// Input spreadsheet file (xlsx, xlsm, csv)
        input: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// JSON file with audit options
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Leading columns ignored by the plug scan
        #[arg(long)]
        skip_columns: Option<usize>,

        /// Stop cycle enumeration after this many cycles (0 = no limit)
        #[arg(long)]
        max_cycles: Option<usize>,

        /// Do not report circular references as findings
        #[arg(long)]
        no_cycle_findings: bool,
    },

    /// Show dependency graph statistics
    Graph {
        /// Input spreadsheet file
        input: PathBuf,

        /// List orphaned calculations
        #[arg(long)]
        orphans: bool,

        /// List formulas that could not be parsed
        #[arg(long)]
        parse_errors: bool,
    },

    /// List all sheets in a workbook
    Sheets {
        /// Input spreadsheet file
        input: PathBuf,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Audit {
            input,
            format,
            config,
            skip_columns,
            max_cycles,
            no_cycle_findings,
        } => {
            let mut options = match config {
                Some(path) => {
                    tracing::info!(path = %path.display(), "loading audit options");
                    AuditOptions::from_json_file(&path)
                        .with_context(|| format!("Failed to load options '{}'", path.display()))?
                }
                None => AuditOptions::default(),
            };
            if let Some(skip) = skip_columns {
                options.plug.skip_columns = skip;
            }
            if let Some(max) = max_cycles {
                options.cycles.max_cycles = max;
            }
            if no_cycle_findings {
                options.report_cycles = false;
            }
            audit(&input, format, &options)
        }
        Commands::Graph {
            input,
            orphans,
            parse_errors,
        } => show_graph(&input, orphans, parse_errors),
        Commands::Sheets { input } => list_sheets(&input),
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn open(input: &Path) -> Result<model_audit::Workbook> {
    tracing::info!(input = %input.display(), "opening workbook");
    let workbook =
        open_workbook(input).with_context(|| format!("Failed to open '{}'", input.display()))?;
    tracing::debug!(
        sheets = workbook.sheet_count(),
        skipped = workbook.skipped_sheets().len(),
        formulas = workbook.formula_count(),
        "workbook loaded"
    );
    Ok(workbook)
}

fn model_name(input: &Path) -> String {
    input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string())
}

fn audit(input: &Path, format: OutputFormat, options: &AuditOptions) -> Result<()> {
    let workbook = open(input)?;
    let report = audit_workbook(model_name(input), &workbook, options);
    tracing::info!(
        issues = report.issues.len(),
        complexity = report.complexity.score,
        "audit finished"
    );

    let mut stdout = io::stdout().lock();
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut stdout, &report)
                .context("Failed to serialize report")?;
            writeln!(stdout)?;
        }
        OutputFormat::Text => print_report(&mut stdout, &report)?,
    }
    Ok(())
}

fn print_report(out: &mut impl Write, report: &AuditReport) -> Result<()> {
    writeln!(out, "Model: {}", report.model)?;
    writeln!(
        out,
        "Sheets: {} ({} skipped)",
        report.sheet_count,
        report.skipped_sheets.len()
    )?;
    for skipped in &report.skipped_sheets {
        writeln!(out, "  skipped '{}': {}", skipped.name, skipped.reason)?;
    }
    writeln!(out, "Formula cells: {}", report.formula_cells)?;

    let stats = &report.structure;
    writeln!(
        out,
        "Graph: {} nodes, {} edges, {} parse errors",
        stats.node_count, stats.edge_count, stats.parse_errors
    )?;
    writeln!(
        out,
        "Circular references: {}{}",
        stats.circular_references,
        if stats.cycles_truncated { "+" } else { "" }
    )?;
    writeln!(
        out,
        "Orphaned calculations: {}",
        stats.orphaned_calculations.len()
    )?;
    writeln!(out, "Complexity: {}/5", report.complexity.score)?;
    if !report.complexity.rationale.is_empty() {
        writeln!(out, "  drivers: {}", report.complexity.rationale)?;
    }

    writeln!(out)?;
    writeln!(out, "Issues: {}", report.issues.len())?;

    for severity in Severity::DESCENDING {
        let issues: Vec<_> = report.issues_with_severity(severity).collect();
        if issues.is_empty() {
            continue;
        }

        writeln!(out)?;
        writeln!(out, "== {} ({}) ==", severity, issues.len())?;
        for issue in issues {
            writeln!(out, "- {} @ {}", issue.kind(), issue.location())?;
            writeln!(out, "    {}", issue.detail())?;

            let explanation = issue.explanation();
            if !explanation.why.is_empty() {
                writeln!(out, "    Why: {}", explanation.why)?;
            }
            if !explanation.cause.is_empty() {
                writeln!(out, "    Cause: {}", explanation.cause)?;
            }
            if !explanation.fix.is_empty() {
                writeln!(out, "    Fix: {}", explanation.fix)?;
            }
        }
    }

    Ok(())
}

fn show_graph(input: &Path, orphans: bool, parse_errors: bool) -> Result<()> {
    let workbook = open(input)?;
    let graph = GraphBuilder::build_workbook(&workbook);
    let stats = analyze_with(&graph, &CycleLimits::default());
    tracing::info!(
        nodes = stats.node_count,
        edges = stats.edge_count,
        cycles = stats.circular_references,
        "dependency graph analyzed"
    );

    println!("File: {}", input.display());
    println!("Nodes: {}", stats.node_count);
    println!("Edges: {}", stats.edge_count);
    println!("Formula cells: {}", stats.formula_cells);
    println!("Parse errors: {}", stats.parse_errors);
    println!(
        "Circular references: {}{}",
        stats.circular_references,
        if stats.cycles_truncated { "+" } else { "" }
    );
    for cycle in &stats.cycle_samples {
        let path: Vec<&str> = cycle.iter().map(|n| n.as_str()).collect();
        println!("  {}", path.join(" -> "));
    }
    println!(
        "Orphaned calculations: {}",
        stats.orphaned_calculations.len()
    );
    println!("Complexity score: {:.3}", stats.complexity_score);

    if orphans {
        println!();
        for node in &stats.orphaned_calculations {
            println!("{}", node);
        }
    }

    if parse_errors {
        println!();
        for failure in graph.parse_failures() {
            println!("{}\t{}\t{}", failure.node, failure.formula, failure.error);
        }
    }

    Ok(())
}

fn list_sheets(input: &Path) -> Result<()> {
    let workbook = open(input)?;

    for (i, sheet) in workbook.worksheets().enumerate() {
        let (rows, cols) = sheet.dimensions();
        println!(
            "{}\t{}\t{}x{}\t{} formulas",
            i,
            sheet.name(),
            rows,
            cols,
            sheet.formulas().formula_count()
        );
    }
    for skipped in workbook.skipped_sheets() {
        println!("-\t{}\tskipped: {}", skipped.name, skipped.reason);
    }

    Ok(())
}
