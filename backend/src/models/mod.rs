//! Domain models for the payroll pipeline.
//!
//! This module contains the data structures passed between stages:
//!
//! - [`CellValue`] - Loosely typed cell as read from a sheet
//! - [`RawTable`] - One sheet: header labels plus rows of cells
//! - [`PayrollRecord`] - One normalized employee-month observation
//! - [`CompensatedRecord`] - Record with bonus and total compensation
//! - [`EmployeeReference`] - One row of the employee roster
//! - [`EnrichedRecord`] - Final record with hire date and tenure

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

// =============================================================================
// Cells
// =============================================================================

/// A raw cell value.
///
/// Numbers compare and hash by bit pattern so identical cells are equal
/// for deduplication purposes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Bool(bool),
    Number(f64),
    DateTime(NaiveDateTime),
    Text(String),
}

impl CellValue {
    /// Blank cells and whitespace-only text both count as empty.
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Text rendering used for headers and identifiers.
    ///
    /// Integral numbers lose their fractional part (`1001.0` -> `"1001"`).
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            CellValue::DateTime(dt) => {
                if dt.time() == chrono::NaiveTime::MIN {
                    dt.date().format("%Y-%m-%d").to_string()
                } else {
                    dt.format("%Y-%m-%d %H:%M:%S").to_string()
                }
            }
            CellValue::Text(s) => s.clone(),
        }
    }
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CellValue::Empty, CellValue::Empty) => true,
            (CellValue::Bool(a), CellValue::Bool(b)) => a == b,
            (CellValue::Number(a), CellValue::Number(b)) => a.to_bits() == b.to_bits(),
            (CellValue::DateTime(a), CellValue::DateTime(b)) => a == b,
            (CellValue::Text(a), CellValue::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for CellValue {}

impl Hash for CellValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::Empty => {}
            CellValue::Bool(b) => b.hash(state),
            CellValue::Number(n) => n.to_bits().hash(state),
            CellValue::DateTime(dt) => dt.hash(state),
            CellValue::Text(s) => s.hash(state),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(d: NaiveDate) -> Self {
        CellValue::DateTime(d.and_time(chrono::NaiveTime::MIN))
    }
}

// =============================================================================
// Raw Table
// =============================================================================

/// One sheet as read from a workbook, before any normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    /// Sheet name (period label or reference sheet name).
    pub name: String,
    /// Header labels exactly as found in the first row.
    pub headers: Vec<String>,
    /// Data rows; `rows[i][j]` belongs to `headers[j]`.
    pub rows: Vec<Vec<CellValue>>,
}

impl RawTable {
    pub fn new(name: impl Into<String>, headers: Vec<String>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows: Vec::new(),
        }
    }

    /// Append a row, padding or truncating it to the header width.
    pub fn push_row(&mut self, mut row: Vec<CellValue>) {
        row.resize(self.headers.len(), CellValue::Empty);
        self.rows.push(row);
    }

    /// Builder-style variant of [`RawTable::push_row`].
    pub fn with_row(mut self, row: Vec<CellValue>) -> Self {
        self.push_row(row);
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// =============================================================================
// Payroll Record
// =============================================================================

/// One employee-month observation after normalization.
///
/// The four typed fields come from the configured columns; every other
/// column is carried verbatim in `other`. Blank cells are never stored in
/// `other`, so a blank cell and an absent column compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct PayrollRecord {
    pub employee_id: Option<String>,
    #[serde(serialize_with = "serialize_decimal")]
    pub base_salary: Option<Decimal>,
    #[serde(serialize_with = "serialize_decimal")]
    pub bonus_pct: Option<Decimal>,
    pub period: Option<NaiveDate>,
    pub other: BTreeMap<String, CellValue>,
}

/// An `f64` with bitwise equality so records can be hashed.
#[derive(Debug, Clone, Copy)]
pub struct Decimal(pub f64);

impl Decimal {
    pub fn value(self) -> f64 {
        self.0
    }
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for Decimal {}

impl Hash for Decimal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl From<f64> for Decimal {
    fn from(v: f64) -> Self {
        Decimal(v)
    }
}

fn serialize_decimal<S>(value: &Option<Decimal>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    value.map(Decimal::value).serialize(serializer)
}

impl PayrollRecord {
    pub fn base_salary(&self) -> Option<f64> {
        self.base_salary.map(Decimal::value)
    }

    pub fn bonus_pct(&self) -> Option<f64> {
        self.bonus_pct.map(Decimal::value)
    }
}

// =============================================================================
// Derived Records
// =============================================================================

/// A record with its compensation fields computed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompensatedRecord {
    #[serde(flatten)]
    pub record: PayrollRecord,
    pub bonus_amount: Option<f64>,
    pub total_compensation: Option<f64>,
}

/// One employee from the reference roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmployeeReference {
    pub employee_id: Option<String>,
    pub hire_date: Option<NaiveDate>,
}

/// Final record: compensation plus hire date and tenure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedRecord {
    #[serde(flatten)]
    pub record: PayrollRecord,
    pub bonus_amount: Option<f64>,
    pub total_compensation: Option<f64>,
    pub hire_date: Option<NaiveDate>,
    /// Whole months of tenure; 0 when either date is unknown.
    pub tenure_months: i64,
    /// False when `tenure_months` was filled in rather than computed.
    pub tenure_known: bool,
}

// =============================================================================
// Tests
// =============================================================================
