//! Spreadsheet workbooks (`.xlsx`, `.xlsm`, `.xls`, `.ods`) via calamine.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{SourceError, SourceResult};
use crate::models::{CellValue, RawTable};

use super::WorkbookSource;

/// A spreadsheet file opened for reading.
pub struct XlsxWorkbook {
    path: PathBuf,
    inner: Sheets<BufReader<File>>,
}

impl XlsxWorkbook {
    pub fn open(path: impl AsRef<Path>) -> SourceResult<Self> {
        let path = path.as_ref();
        let inner = open_workbook_auto(path).map_err(|e| SourceError::Open {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            inner,
        })
    }
}

impl WorkbookSource for XlsxWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.inner.sheet_names()
    }

    fn read_sheet(&mut self, name: &str) -> SourceResult<Option<RawTable>> {
        if !self.inner.sheet_names().iter().any(|n| n == name) {
            return Ok(None);
        }

        let range = self
            .inner
            .worksheet_range(name)
            .map_err(|e| SourceError::Sheet {
                sheet: name.to_string(),
                message: e.to_string(),
            })?;

        let mut rows = range.rows();
        let headers: Vec<String> = match rows.next() {
            Some(header_row) => header_row.iter().map(|c| convert_cell(c).to_text()).collect(),
            None => return Ok(Some(RawTable::new(name, Vec::new()))),
        };

        let mut table = RawTable::new(name, headers);
        for row in rows {
            let cells: Vec<CellValue> = row.iter().map(convert_cell).collect();
            if cells.iter().all(CellValue::is_empty) {
                continue;
            }
            table.push_row(cells);
        }

        tracing::debug!(
            workbook = %self.path.display(),
            sheet = name,
            rows = table.len(),
            "read spreadsheet sheet"
        );
        Ok(Some(table))
    }
}

/// Map a calamine cell onto [`CellValue`].
///
/// Error cells (`#N/A`, `#DIV/0!`, ...) carry no value and become empty.
fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) if s.trim().is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => dt.as_datetime().map(CellValue::DateTime).unwrap_or(CellValue::Empty),
        Data::DateTimeIso(s) => parse_iso(s)
            .map(CellValue::DateTime)
            .unwrap_or_else(|| CellValue::Text(s.clone())),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

fn parse_iso(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(chrono::NaiveTime::MIN))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;

    #[test]
    fn test_convert_cell() {
        assert_eq!(convert_cell(&Data::Empty), CellValue::Empty);
        assert_eq!(convert_cell(&Data::String("  ".into())), CellValue::Empty);
        assert_eq!(convert_cell(&Data::Int(7)), CellValue::Number(7.0));
        assert_eq!(
            convert_cell(&Data::DateTimeIso("2024-01-31".into())),
            CellValue::from(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap())
        );
    }

    #[test]
    fn test_read_generated_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("Enero").unwrap();
        sheet.write_string(0, 0, "ID empeado").unwrap();
        sheet.write_string(0, 1, "Sueldo Base").unwrap();
        sheet.write_string(1, 0, "E01").unwrap();
        sheet.write_number(1, 1, 1500.0).unwrap();
        sheet.write_string(3, 0, "E02").unwrap();
        workbook.save(&path).unwrap();

        let mut wb = XlsxWorkbook::open(&path).unwrap();
        assert_eq!(wb.sheet_names(), vec!["Enero"]);
        assert!(wb.read_sheet("Base").unwrap().is_none());

        let table = wb.read_sheet("Enero").unwrap().unwrap();
        assert_eq!(table.headers, vec!["ID empeado", "Sueldo Base"]);
        // The blank row between the two employees is dropped.
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0][1], CellValue::Number(1500.0));
        assert_eq!(table.rows[1][1], CellValue::Empty);
    }
}
