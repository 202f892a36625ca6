//! High-level pipeline API for payroll consolidation.
//!
//! Combines every step: loading the period sheets, normalization,
//! unification, compensation, enrichment and the summary.
//!
//! # Example
//!
//! ```rust,ignore
//! use payroll::config::PipelineConfig;
//! use payroll::transform::pipeline::run;
//!
//! let config = PipelineConfig::load("payroll.toml")?;
//! let output = run(&config)?;
//! println!("Consolidated {} records", output.records.len());
//! ```

use serde::Serialize;

use crate::config::{ColumnMap, PipelineConfig};
use crate::error::{PipelineResult, SourceError};
use crate::export::{write_outputs, Report};
use crate::logs::RunLog;
use crate::models::EnrichedRecord;
use crate::source::{open_workbook, WorkbookSource};
use crate::summary::{summarize, Summary};

use super::derive::compute_compensation;
use super::enrich::{enrich, ReferenceIndex};
use super::normalize::{normalize_reference, normalize_table, NormalizedTable};
use super::unify::unify;

/// A period that could not be loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedPeriod {
    pub sheet: String,
    pub reason: String,
}

/// Result of a complete pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    /// Unified input columns, in first-seen order
    pub columns: Vec<String>,

    /// Enriched records, one per unique input row
    pub records: Vec<EnrichedRecord>,

    pub summary: Summary,

    /// Periods that made it into the record set, in request order
    pub loaded_periods: Vec<String>,

    pub skipped_periods: Vec<SkippedPeriod>,

    /// Exact duplicate rows removed during unification
    pub duplicates_removed: usize,

    /// Records with no matching reference employee
    pub unmatched: usize,

    pub log: RunLog,
}

/// Run the in-memory part of the pipeline against an open workbook.
///
/// Period sheets that are missing, unreadable or malformed are skipped
/// with a warning. The reference sheet is mandatory: if it is absent,
/// unreadable or malformed the run fails.
pub fn run_pipeline(
    source: &mut dyn WorkbookSource,
    periods: &[String],
    reference: &str,
    columns: &ColumnMap,
) -> PipelineResult<PipelineOutput> {
    let mut log = RunLog::new();

    // Step 1: Period tables
    log.info(format!("Loading {} period sheet(s)...", periods.len()));
    let mut tables: Vec<NormalizedTable> = Vec::with_capacity(periods.len());
    let mut skipped_periods = Vec::new();

    for sheet in periods {
        match load_period(source, sheet, columns) {
            Ok(table) => {
                log.success(format!("{}: {} rows", sheet, table.records.len()));
                tables.push(table);
            }
            Err(reason) => {
                log.warning(format!("Skipping period '{}': {}", sheet, reason));
                skipped_periods.push(SkippedPeriod {
                    sheet: sheet.clone(),
                    reason,
                });
            }
        }
    }

    // Step 2: Unify
    log.info("Unifying period tables...");
    let unified = unify(tables)?;
    if unified.duplicates_removed > 0 {
        log.warning(format!("Removed {} duplicate row(s)", unified.duplicates_removed));
    }
    log.success(format!(
        "{} records from {} period(s)",
        unified.records.len(),
        unified.sources.len()
    ));

    // Step 3: Compensation
    let compensated = compute_compensation(unified.records);

    // Step 4: Reference table
    log.info(format!("Loading reference sheet '{}'...", reference));
    let reference_table = source
        .read_sheet(reference)?
        .ok_or_else(|| SourceError::SheetNotFound(reference.to_string()))?;
    let employees = normalize_reference(&reference_table, columns)?;
    let index = ReferenceIndex::build(&employees)?;
    if index.skipped_blank > 0 {
        log.warning(format!(
            "{} reference row(s) without an employee id ignored",
            index.skipped_blank
        ));
    }
    log.success(format!("{} reference employees", index.len()));

    // Step 5: Enrich
    log.info("Joining hire dates...");
    let enrichment = enrich(compensated, &index);
    if enrichment.unmatched > 0 {
        log.warning(format!(
            "{} record(s) without a matching reference employee",
            enrichment.unmatched
        ));
    }

    // Step 6: Summary
    let summary = summarize(&enrichment.records);
    log.success(format!(
        "{} records, {} unique employees",
        summary.total_records, summary.unique_employees
    ));

    Ok(PipelineOutput {
        columns: unified.columns,
        records: enrichment.records,
        summary,
        loaded_periods: unified.sources,
        skipped_periods,
        duplicates_removed: unified.duplicates_removed,
        unmatched: enrichment.unmatched,
        log,
    })
}

/// Read and normalize one period sheet. Failures come back as a reason.
fn load_period(
    source: &mut dyn WorkbookSource,
    sheet: &str,
    columns: &ColumnMap,
) -> Result<NormalizedTable, String> {
    let raw = match source.read_sheet(sheet) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Err(SourceError::SheetNotFound(sheet.to_string()).to_string()),
        Err(e) => return Err(e.to_string()),
    };
    normalize_table(&raw, columns).map_err(|e| e.to_string())
}

/// Run the full pipeline described by `config` and write its outputs.
///
/// Nothing is written unless every step succeeded.
pub fn run(config: &PipelineConfig) -> PipelineResult<PipelineOutput> {
    tracing::info!(input = %config.files.input.display(), "opening workbook");
    let mut source = open_workbook(&config.files.input)?;

    let mut output = run_pipeline(
        source.as_mut(),
        &config.sheets.periods,
        &config.sheets.reference,
        &config.columns,
    )?;

    output.log.info(format!("Writing {}...", config.files.output.display()));
    let written = write_outputs(
        &config.files.output,
        config.files.summary_json.as_deref(),
        &output.report(),
        &config.columns,
    );
    if let Err(e) = written {
        output.log.error(format!("Export failed: {}", e));
        return Err(e.into());
    }

    if let Some(path) = &config.files.summary_json {
        output.log.success(format!("Summary written to {}", path.display()));
    }
    output.log.success(format!("Report written to {}", config.files.output.display()));
    Ok(output)
}

impl PipelineOutput {
    /// Borrowed view for the exporters.
    pub fn report(&self) -> Report<'_> {
        Report {
            columns: &self.columns,
            records: &self.records,
            summary: &self.summary,
            log: self.log.entries(),
        }
    }
}
