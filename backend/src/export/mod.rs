//! Report export.
//!
//! The output workbook has two sheets:
//!
//! - `Processed Data`: every enriched record, one row each. Columns are the
//!   unified input columns followed by the derived ones.
//! - `Executive Summary`: the 13 `Metric` / `Value` rows.
//!
//! Every artifact is built fully in memory and staged in a temporary file
//! next to its destination. Staged files only become visible on
//! [`StagedFile::commit`], and [`write_outputs`] commits nothing until all
//! of them are staged, so a failed run never leaves an output behind.

use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::config::ColumnMap;
use crate::error::{ExportError, ExportResult};
use crate::logs::LogEntry;
use crate::models::{CellValue, EnrichedRecord};
use crate::summary::{Summary, SummaryRow};

pub const DATA_SHEET: &str = "Processed Data";
pub const SUMMARY_SHEET: &str = "Executive Summary";

pub const BONUS_COLUMN: &str = "Bono_Calculado";
pub const TOTAL_COLUMN: &str = "Compensación_Total";
pub const TENURE_COLUMN: &str = "Antigüedad_meses";

pub const DATE_FORMAT: &str = "dd-mm-yyyy";
const METRIC_WIDTH: f64 = 35.0;
const VALUE_WIDTH: f64 = 20.0;

/// Everything the exporters need from a finished run.
#[derive(Debug, Clone, Copy)]
pub struct Report<'a> {
    pub columns: &'a [String],
    pub records: &'a [EnrichedRecord],
    pub summary: &'a Summary,
    pub log: &'a [LogEntry],
}

/// Header of the data sheet: the unified columns, then bonus, total,
/// hire date and tenure.
///
/// A derived column whose name is already taken by an input column gets a
/// numeric suffix (`Fecha_de_Ingreso_2`), so headers stay unique.
pub fn output_columns(columns: &[String], map: &ColumnMap) -> Vec<String> {
    let mut out = columns.to_vec();
    for name in [BONUS_COLUMN, TOTAL_COLUMN, map.hire_date.as_str(), TENURE_COLUMN] {
        let name = unique_column(&out, name);
        out.push(name);
    }
    out
}

fn unique_column(taken: &[String], name: &str) -> String {
    if !taken.iter().any(|c| c == name) {
        return name.to_string();
    }
    let mut i = 2;
    loop {
        let candidate = format!("{}_{}", name, i);
        if !taken.contains(&candidate) {
            return candidate;
        }
        i += 1;
    }
}

/// Build both sheets in memory.
pub fn build_workbook(report: &Report<'_>, map: &ColumnMap) -> ExportResult<Workbook> {
    let mut workbook = Workbook::new();
    workbook.push_worksheet(data_sheet(report.columns, report.records, map)?);
    workbook.push_worksheet(summary_sheet(&report.summary.rows())?);
    Ok(workbook)
}

/// Serialized `.xlsx` report.
pub fn report_bytes(report: &Report<'_>, map: &ColumnMap) -> ExportResult<Vec<u8>> {
    Ok(build_workbook(report, map)?.save_to_buffer()?)
}

#[derive(Serialize)]
struct SummaryDocument<'a> {
    metrics: Vec<SummaryRow>,
    statistics: &'a Summary,
    log: &'a [LogEntry],
}

/// Summary as JSON: the formatted rows, the raw statistics and the run log.
pub fn summary_json_bytes(report: &Report<'_>) -> ExportResult<Vec<u8>> {
    let document = SummaryDocument {
        metrics: report.summary.rows(),
        statistics: report.summary,
        log: report.log,
    };
    Ok(serde_json::to_vec_pretty(&document)?)
}

/// Write the two-sheet report to `path`, replacing any existing file.
pub fn write_report(path: &Path, report: &Report<'_>, map: &ColumnMap) -> ExportResult<()> {
    StagedFile::stage(path, &report_bytes(report, map)?)?.commit()
}

/// Write the summary JSON to `path`, replacing any existing file.
pub fn write_summary_json(path: &Path, report: &Report<'_>) -> ExportResult<()> {
    StagedFile::stage(path, &summary_json_bytes(report)?)?.commit()
}

/// Write the report and, when `summary_json` is set, the summary JSON.
///
/// Both files are staged before either is committed. If the second commit
/// fails the first file is removed again.
pub fn write_outputs(
    output: &Path,
    summary_json: Option<&Path>,
    report: &Report<'_>,
    map: &ColumnMap,
) -> ExportResult<()> {
    let workbook = StagedFile::stage(output, &report_bytes(report, map)?)?;
    let summary = match summary_json {
        Some(path) => Some(StagedFile::stage(path, &summary_json_bytes(report)?)?),
        None => None,
    };

    workbook.commit()?;
    if let Some(summary) = summary {
        if let Err(e) = summary.commit() {
            if let Err(cleanup) = fs::remove_file(output) {
                tracing::warn!(path = %output.display(), error = %cleanup, "could not remove report");
            }
            return Err(e);
        }
    }

    tracing::debug!(path = %output.display(), "outputs written");
    Ok(())
}

/// A payload written to a temporary file beside its destination.
///
/// Dropping it without [`StagedFile::commit`] deletes the temporary file.
pub struct StagedFile {
    tmp: NamedTempFile,
    dest: PathBuf,
}

impl StagedFile {
    pub fn stage(dest: &Path, bytes: &[u8]) -> ExportResult<Self> {
        let dir = match dest.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| write_error(dest, e))?;
        tmp.write_all(bytes).map_err(|e| write_error(dest, e))?;
        tmp.flush().map_err(|e| write_error(dest, e))?;

        Ok(Self {
            tmp,
            dest: dest.to_path_buf(),
        })
    }

    /// Rename the staged file over its destination.
    pub fn commit(self) -> ExportResult<()> {
        let dest = self.dest;
        self.tmp.persist(&dest).map_err(|e| write_error(&dest, e.error))?;
        Ok(())
    }
}

fn write_error(path: &Path, source: std::io::Error) -> ExportError {
    ExportError::Write {
        path: path.to_path_buf(),
        source,
    }
}

// =============================================================================
// Sheets
// =============================================================================

fn column_index(i: usize) -> Result<u16, XlsxError> {
    u16::try_from(i).map_err(|_| XlsxError::RowColumnLimitError)
}

fn row_index(i: usize) -> Result<u32, XlsxError> {
    u32::try_from(i).map_err(|_| XlsxError::RowColumnLimitError)
}

fn data_sheet(columns: &[String], records: &[EnrichedRecord], map: &ColumnMap) -> ExportResult<Worksheet> {
    let mut sheet = Worksheet::new();
    sheet.set_name(DATA_SHEET)?;

    let header = Format::new().set_bold();
    let date = Format::new().set_num_format(DATE_FORMAT);

    let headers = output_columns(columns, map);
    for (c, name) in headers.iter().enumerate() {
        sheet.write_string_with_format(0, column_index(c)?, name, &header)?;
    }

    for (r, record) in records.iter().enumerate() {
        let row = row_index(r + 1)?;

        for (c, name) in columns.iter().enumerate() {
            let col = column_index(c)?;
            let payroll = &record.record;

            if *name == map.employee_id {
                if let Some(id) = &payroll.employee_id {
                    sheet.write_string(row, col, id)?;
                }
            } else if *name == map.base_salary {
                write_number(&mut sheet, row, col, payroll.base_salary())?;
            } else if *name == map.bonus_pct {
                write_number(&mut sheet, row, col, payroll.bonus_pct())?;
            } else if *name == map.period {
                if let Some(period) = &payroll.period {
                    sheet.write_datetime_with_format(row, col, period, &date)?;
                }
            } else if let Some(value) = payroll.other.get(name) {
                write_cell(&mut sheet, row, col, value, &date)?;
            }
        }

        let base = columns.len();
        write_number(&mut sheet, row, column_index(base)?, record.bonus_amount)?;
        write_number(&mut sheet, row, column_index(base + 1)?, record.total_compensation)?;
        if let Some(hire) = &record.hire_date {
            sheet.write_datetime_with_format(row, column_index(base + 2)?, hire, &date)?;
        }
        sheet.write_number(row, column_index(base + 3)?, record.tenure_months as f64)?;
    }

    Ok(sheet)
}

fn summary_sheet(rows: &[SummaryRow]) -> ExportResult<Worksheet> {
    let mut sheet = Worksheet::new();
    sheet.set_name(SUMMARY_SHEET)?;

    let header = Format::new().set_bold();
    sheet.write_string_with_format(0, 0, "Metric", &header)?;
    sheet.write_string_with_format(0, 1, "Value", &header)?;

    for (r, line) in rows.iter().enumerate() {
        let row = row_index(r + 1)?;
        sheet.write_string(row, 0, &line.metric)?;
        sheet.write_string(row, 1, &line.value)?;
    }

    sheet.set_column_width(0, METRIC_WIDTH)?;
    sheet.set_column_width(1, VALUE_WIDTH)?;
    Ok(sheet)
}

fn write_number(sheet: &mut Worksheet, row: u32, col: u16, value: Option<f64>) -> Result<(), XlsxError> {
    if let Some(v) = value {
        sheet.write_number(row, col, v)?;
    }
    Ok(())
}

fn write_cell(sheet: &mut Worksheet, row: u32, col: u16, value: &CellValue, date: &Format) -> Result<(), XlsxError> {
    match value {
        CellValue::Empty => {}
        CellValue::Bool(b) => {
            sheet.write_boolean(row, col, *b)?;
        }
        CellValue::Number(n) => {
            sheet.write_number(row, col, *n)?;
        }
        CellValue::DateTime(dt) => {
            sheet.write_datetime_with_format(row, col, dt, date)?;
        }
        CellValue::Text(s) => {
            sheet.write_string(row, col, s)?;
        }
    }
    Ok(())
}
