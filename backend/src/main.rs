//! Payroll CLI - Consolidate monthly payroll sheets
//!
//! # Main Commands
//!
//! ```bash
//! payroll run                                  # Run with ./payroll.toml
//! payroll run --config q1.toml --output q1.xlsx
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! payroll sheets nomina.xlsx                   # List sheets of a workbook
//! payroll preview nomina.xlsx --sheet Enero    # Normalize one sheet to JSON
//! ```

use clap::{Parser, Subcommand};
use payroll::source::{open_workbook, WorkbookSource};
use payroll::transform::normalize_table;
use payroll::{run, ColumnMap, PipelineConfig, SourceError, DEFAULT_CONFIG_FILE};
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "payroll")]
#[command(about = "Consolidate monthly payroll sheets into an enriched report", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full pipeline: load, unify, enrich, summarize and write the report
    Run {
        /// Configuration file
        #[arg(short, long, env = "PAYROLL_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,

        /// Input workbook or CSV directory (overrides the config)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output workbook (overrides the config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write the summary as JSON
        #[arg(long)]
        summary_json: Option<PathBuf>,
    },

    /// List the sheets of a workbook
    Sheets {
        /// Input workbook or CSV directory
        input: PathBuf,
    },

    /// Normalize one sheet and print its records as JSON
    Preview {
        /// Input workbook or CSV directory
        input: PathBuf,

        /// Sheet to read
        #[arg(short, long)]
        sheet: String,

        /// Number of records to print
        #[arg(short, long, default_value = "10")]
        rows: usize,
    },
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            config,
            input,
            output,
            summary_json,
        } => cmd_run(&config, input, output, summary_json),

        Commands::Sheets { input } => cmd_sheets(&input),

        Commands::Preview { input, sheet, rows } => cmd_preview(&input, &sheet, rows),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        let mut source = e.source();
        while let Some(cause) = source {
            eprintln!("   caused by: {}", cause);
            source = cause.source();
        }
        std::process::exit(1);
    }
}

fn cmd_run(
    config_path: &Path,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    summary_json: Option<PathBuf>,
) -> Result<(), Box<dyn Error>> {
    let mut config = PipelineConfig::load(config_path)?;
    if let Some(input) = input {
        config.files.input = input;
    }
    if let Some(output) = output {
        config.files.output = output;
    }
    if summary_json.is_some() {
        config.files.summary_json = summary_json;
    }

    eprintln!("📄 Processing: {}", config.files.input.display());
    let result = run(&config)?;

    for skipped in &result.skipped_periods {
        eprintln!("   ⚠️  Skipped {}: {}", skipped.sheet, skipped.reason);
    }

    println!();
    println!("{:<35} {}", "Metric", "Value");
    println!("{}", "-".repeat(56));
    for row in result.summary.rows() {
        println!("{:<35} {}", row.metric, row.value);
    }

    eprintln!("\n💾 Report written to: {}", config.files.output.display());
    if let Some(path) = &config.files.summary_json {
        eprintln!("💾 Summary written to: {}", path.display());
    }
    Ok(())
}

fn cmd_sheets(input: &Path) -> Result<(), Box<dyn Error>> {
    let workbook = open_workbook(input)?;
    for name in workbook.sheet_names() {
        println!("{}", name);
    }
    Ok(())
}

fn cmd_preview(input: &Path, sheet: &str, rows: usize) -> Result<(), Box<dyn Error>> {
    let mut workbook = open_workbook(input)?;
    let raw = workbook
        .read_sheet(sheet)?
        .ok_or_else(|| SourceError::SheetNotFound(sheet.to_string()))?;

    let table = normalize_table(&raw, &ColumnMap::default())?;
    eprintln!("📋 {}: {} records, columns: {}", table.label, table.records.len(), table.columns.join(", "));

    let shown = &table.records[..rows.min(table.records.len())];
    println!("{}", serde_json::to_string_pretty(shown)?);
    Ok(())
}
