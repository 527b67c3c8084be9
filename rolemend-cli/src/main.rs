//! rolemend — reconcile team role records across the document store and
//! its relational projection.
//!
//! # Usage
//!
//! ```text
//! rolemend [--dry-run] [--config <path>] [--json]
//! ```
//!
//! Live mode asks for confirmation before mutating anything. The process
//! exits 0 even when individual actions failed — failures are counted in
//! the summary, and a critical connection failure is printed to stderr
//! while the (empty) summary still renders.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use rolemend_core::config;
use rolemend_engine::{Engine, Report};
use rolemend_store::{JsonDocumentStore, SqliteRoleStore};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "rolemend",
    version,
    about = "Audit and repair team role records across both backing stores",
    long_about = None,
)]
struct Cli {
    /// Compute and report actions without mutating either store.
    #[arg(long)]
    dry_run: bool,

    /// Path to the run configuration (default: ~/.rolemend/config.yaml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emit the final report as machine-readable JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    print_mode_banner(cli.dry_run);
    if !cli.dry_run {
        confirm_live_run()?;
    }

    // Per-action errors are already folded into the report; only an
    // infrastructure failure lands here, and it still gets a summary.
    let report = match execute(&cli) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("{} {e:#}", "critical:".red().bold());
            Report::new(cli.dry_run)
        }
    };

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("failed to serialize report JSON")?
        );
    } else {
        print_summary(&report);
    }
    Ok(())
}

fn execute(cli: &Cli) -> Result<Report> {
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => {
            let home = dirs::home_dir().context("could not determine home directory")?;
            config::default_path_at(&home)
        }
    };
    let cfg = config::load(&config_path).context("failed to load configuration")?;

    println!(
        "Connecting to document store at {}...",
        cfg.document_store.display()
    );
    let docs = JsonDocumentStore::open(&cfg.document_store)
        .context("failed to open the document store")?;
    println!(
        "Connecting to relational store at {}...",
        cfg.relational_store.display()
    );
    let rel = SqliteRoleStore::open(&cfg.relational_store)
        .context("failed to open the relational store")?;

    let report = Engine::new(docs, rel, cli.dry_run).run()?;
    Ok(report)
}

// ---------------------------------------------------------------------------
// Console rendering
// ---------------------------------------------------------------------------

fn print_mode_banner(dry_run: bool) {
    if dry_run {
        println!(
            "{}",
            "--- running in dry-run mode; no changes will be made ---"
                .yellow()
                .bold()
        );
    } else {
        println!(
            "{}",
            "--- running in live mode; changes will be applied ---"
                .red()
                .bold()
        );
    }
}

fn confirm_live_run() -> Result<()> {
    print!("Press ENTER to continue or Ctrl-C to abort... ");
    io::stdout().flush().context("failed to flush stdout")?;

    let mut line = String::new();
    let read = io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read confirmation")?;
    if read == 0 {
        anyhow::bail!("no confirmation received; aborting before any changes");
    }
    Ok(())
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "action")]
    action: &'static str,
    #[tabled(rename = "count")]
    count: u64,
}

fn print_summary(report: &Report) {
    let prefix = if report.dry_run { "[dry-run] " } else { "" };
    println!();
    println!("{prefix}{}", "reconciliation summary".bold());

    let rows = vec![
        SummaryRow {
            action: "roles created",
            count: report.created,
        },
        SummaryRow {
            action: "roles deleted",
            count: report.deleted,
        },
        SummaryRow {
            action: "roles deactivated",
            count: report.deactivated,
        },
        SummaryRow {
            action: "skipped (already correct)",
            count: report.skipped,
        },
        SummaryRow {
            action: "errors",
            count: report.errors,
        },
    ];
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    if report.errors > 0 {
        println!(
            "{}",
            format!(
                "{} action(s) failed; re-running will pick up where this run left off.",
                report.errors
            )
            .yellow()
        );
    }
}
