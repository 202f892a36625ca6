//! Record normalization.
//!
//! Turns a [`RawTable`] into typed records:
//!
//! 1. Headers are trimmed and internal spaces become `_`
//!    (`" Sueldo Base "` -> `Sueldo_Base`).
//! 2. The money, percentage and period columns are coerced leniently:
//!    a value that cannot be parsed becomes `None`, it never fails the
//!    table and never drops the row.
//! 3. Every other column is carried through unchanged.
//!
//! Only a missing required column is an error.

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashSet};

use crate::config::ColumnMap;
use crate::error::{SchemaError, SchemaResult};
use crate::models::{CellValue, Decimal, EmployeeReference, PayrollRecord, RawTable};

/// Plain decimal or scientific literal, optional sign.
static NUMBER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$").expect("valid number pattern")
});

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y", "%d/%m/%Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%d-%m-%Y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
];

/// A period table after normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTable {
    /// Sheet the table was read from.
    pub label: String,
    /// Normalized column identifiers in sheet order.
    pub columns: Vec<String>,
    pub records: Vec<PayrollRecord>,
}

/// Standardize a column header.
///
/// Leading and trailing whitespace is removed and every remaining space
/// becomes an underscore.
pub fn normalize_column_name(name: &str) -> String {
    name.trim().replace(' ', "_")
}

/// Normalize every header of `table`, naming blank headers `Unnamed_<i>`.
fn normalize_headers(table: &RawTable) -> SchemaResult<Vec<String>> {
    let mut seen = HashSet::new();
    let mut columns = Vec::with_capacity(table.headers.len());

    for (i, header) in table.headers.iter().enumerate() {
        let mut column = normalize_column_name(header);
        if column.is_empty() {
            column = format!("Unnamed_{}", i);
        }
        if !seen.insert(column.clone()) {
            return Err(SchemaError::DuplicateColumn {
                table: table.name.clone(),
                column,
            });
        }
        columns.push(column);
    }

    Ok(columns)
}

fn require_column(table: &RawTable, columns: &[String], column: &str) -> SchemaResult<usize> {
    columns
        .iter()
        .position(|c| c == column)
        .ok_or_else(|| SchemaError::MissingColumn {
            table: table.name.clone(),
            column: column.to_string(),
        })
}

/// Normalize one monthly payroll table.
///
/// Requires the identifier, base salary, bonus percentage and period
/// columns named in `columns`.
pub fn normalize_table(table: &RawTable, columns: &ColumnMap) -> SchemaResult<NormalizedTable> {
    let names = normalize_headers(table)?;

    let id_idx = require_column(table, &names, &columns.employee_id)?;
    let salary_idx = require_column(table, &names, &columns.base_salary)?;
    let bonus_idx = require_column(table, &names, &columns.bonus_pct)?;
    let period_idx = require_column(table, &names, &columns.period)?;

    let records = table
        .rows
        .iter()
        .map(|row| {
            let cell = |idx: usize| row.get(idx).unwrap_or(&CellValue::Empty);

            let other: BTreeMap<String, CellValue> = names
                .iter()
                .enumerate()
                .filter(|(i, _)| ![id_idx, salary_idx, bonus_idx, period_idx].contains(i))
                .filter_map(|(i, name)| {
                    let value = cell(i);
                    (!value.is_empty()).then(|| (name.clone(), value.clone()))
                })
                .collect();

            PayrollRecord {
                employee_id: coerce_identifier(cell(id_idx)),
                base_salary: coerce_decimal(cell(salary_idx)).map(Decimal),
                bonus_pct: coerce_fraction(cell(bonus_idx)).map(Decimal),
                period: coerce_date(cell(period_idx)),
                other,
            }
        })
        .collect();

    Ok(NormalizedTable {
        label: table.name.clone(),
        columns: names,
        records,
    })
}

/// Normalize the employee reference table.
///
/// Only the identifier and hire date columns are kept.
pub fn normalize_reference(table: &RawTable, columns: &ColumnMap) -> SchemaResult<Vec<EmployeeReference>> {
    let names = normalize_headers(table)?;

    let id_idx = require_column(table, &names, &columns.employee_id)?;
    let hire_idx = require_column(table, &names, &columns.hire_date)?;

    Ok(table
        .rows
        .iter()
        .map(|row| EmployeeReference {
            employee_id: row.get(id_idx).and_then(coerce_identifier),
            hire_date: row.get(hire_idx).and_then(coerce_date),
        })
        .collect())
}

// =============================================================================
// Lenient coercion
// =============================================================================

/// Employee identifier as a join key.
pub fn coerce_identifier(cell: &CellValue) -> Option<String> {
    if cell.is_empty() {
        return None;
    }
    let text = cell.to_text().trim().to_string();
    (!text.is_empty()).then_some(text)
}

/// Money-like value. Non-finite or non-numeric values become `None`.
pub fn coerce_decimal(cell: &CellValue) -> Option<f64> {
    match cell {
        CellValue::Number(n) if n.is_finite() => Some(*n),
        CellValue::Text(s) => parse_number(s),
        _ => None,
    }
}

/// Percentage-like value as a fraction.
///
/// Numbers are taken as fractions already (`0.1`); text may carry a
/// trailing `%` (`"10%"` -> `0.1`).
pub fn coerce_fraction(cell: &CellValue) -> Option<f64> {
    match cell {
        CellValue::Text(s) => {
            let s = s.trim();
            match s.strip_suffix('%') {
                Some(pct) => parse_number(pct).map(|v| v / 100.0),
                None => parse_number(s),
            }
        }
        other => coerce_decimal(other),
    }
}

/// Period or hire date.
///
/// Date cells are truncated to the day. Text is tried as ISO date or
/// date-time, `YYYY/MM/DD`, day-first `DD-MM-YYYY` / `DD/MM/YYYY`, and
/// `YYYY-MM` (first day of that month).
pub fn coerce_date(cell: &CellValue) -> Option<NaiveDate> {
    match cell {
        CellValue::DateTime(dt) => Some(dt.date()),
        CellValue::Text(s) => parse_date(s.trim()),
        _ => None,
    }
}

fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    if !NUMBER_PATTERN.is_match(s) {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    if s.is_empty() {
        return None;
    }

    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d").ok()
}
