//! Workbook sources.
//!
//! A workbook is a named collection of sheets. The pipeline only needs
//! to look sheets up by name and to tell an absent sheet apart from an
//! empty one, which is what [`WorkbookSource`] exposes.
//!
//! Implementations:
//!
//! - [`XlsxWorkbook`] - `.xlsx` / `.xlsm` / `.xls` / `.ods` files
//! - [`CsvWorkbook`] - a directory holding one `<sheet>.csv` per sheet
//! - [`MemoryWorkbook`] - sheets built in memory

pub mod csv_dir;
pub mod xlsx;

use std::path::Path;

use crate::error::{SourceError, SourceResult};
use crate::models::RawTable;

pub use csv_dir::{decode_content, detect_delimiter, detect_encoding, parse_sheet_bytes, CsvWorkbook};
pub use xlsx::XlsxWorkbook;

/// Sheet lookup over a workbook.
pub trait WorkbookSource {
    /// Names of every sheet in document order.
    fn sheet_names(&self) -> Vec<String>;

    /// Read one sheet.
    ///
    /// Returns `Ok(None)` when the sheet does not exist, `Ok(Some(_))`
    /// (possibly with zero rows) when it does.
    fn read_sheet(&mut self, name: &str) -> SourceResult<Option<RawTable>>;
}

/// Open the workbook at `path`.
///
/// Directories are read as CSV workbooks, files as spreadsheets.
pub fn open_workbook(path: impl AsRef<Path>) -> SourceResult<Box<dyn WorkbookSource>> {
    let path = path.as_ref();

    if path.is_dir() {
        return Ok(Box::new(CsvWorkbook::open(path)?));
    }

    if !path.exists() {
        return Err(SourceError::Open {
            path: path.to_path_buf(),
            message: "file not found".to_string(),
        });
    }

    Ok(Box::new(XlsxWorkbook::open(path)?))
}

// =============================================================================
// In-memory workbook
// =============================================================================

/// Workbook whose sheets are already in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryWorkbook {
    sheets: Vec<RawTable>,
}

impl MemoryWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sheet, replacing any existing sheet with the same name.
    pub fn with_sheet(mut self, table: RawTable) -> Self {
        self.insert(table);
        self
    }

    pub fn insert(&mut self, table: RawTable) {
        match self.sheets.iter_mut().find(|s| s.name == table.name) {
            Some(existing) => *existing = table,
            None => self.sheets.push(table),
        }
    }
}

impl WorkbookSource for MemoryWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    fn read_sheet(&mut self, name: &str) -> SourceResult<Option<RawTable>> {
        Ok(self.sheets.iter().find(|s| s.name == name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CellValue;

    #[test]
    fn test_memory_workbook_absent_vs_empty() {
        let mut wb = MemoryWorkbook::new().with_sheet(RawTable::new("Enero", vec!["a".into()]));

        let empty = wb.read_sheet("Enero").unwrap();
        assert!(empty.is_some());
        assert!(empty.unwrap().is_empty());

        assert!(wb.read_sheet("Febrero").unwrap().is_none());
    }

    #[test]
    fn test_memory_workbook_replaces_sheet() {
        let wb = MemoryWorkbook::new()
            .with_sheet(RawTable::new("Base", vec!["a".into()]))
            .with_sheet(RawTable::new("Base", vec!["a".into()]).with_row(vec![CellValue::from("x")]));

        assert_eq!(wb.sheet_names(), vec!["Base"]);
        let mut wb = wb;
        assert_eq!(wb.read_sheet("Base").unwrap().unwrap().len(), 1);
    }

    #[test]
    fn test_open_missing_file() {
        let result = open_workbook("/definitely/not/here.xlsx");
        assert!(matches!(result, Err(SourceError::Open { .. })));
    }

    #[test]
    fn test_open_directory_as_csv_workbook() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Enero.csv"), "a;b\n1;2\n").unwrap();

        let mut wb = open_workbook(dir.path()).unwrap();
        assert_eq!(wb.sheet_names(), vec!["Enero"]);
        assert_eq!(wb.read_sheet("Enero").unwrap().unwrap().len(), 1);
    }
}
