//! CSV-directory workbooks with encoding and delimiter auto-detection.
//!
//! Each `<sheet>.csv` file in the directory is one sheet. Payroll exports
//! frequently come out of spreadsheet tools as ISO-8859-1 or Windows-1252
//! with `;` separators, so both are detected per file.

use std::fs;
use std::path::{Path, PathBuf};

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};

use crate::error::{SourceError, SourceResult};
use crate::models::{CellValue, RawTable};

use super::WorkbookSource;

/// A directory of `<sheet>.csv` files.
#[derive(Debug, Clone)]
pub struct CsvWorkbook {
    dir: PathBuf,
}

impl CsvWorkbook {
    pub fn open(dir: impl AsRef<Path>) -> SourceResult<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(SourceError::Open {
                path: dir.to_path_buf(),
                message: "not a directory".to_string(),
            });
        }
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn sheet_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", name))
    }
}

impl WorkbookSource for CsvWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(e) => e,
            Err(_) => return Vec::new(),
        };

        let mut names: Vec<String> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|e| e.eq_ignore_ascii_case("csv")))
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(String::from))
            .collect();
        names.sort();
        names
    }

    fn read_sheet(&mut self, name: &str) -> SourceResult<Option<RawTable>> {
        let path = self.sheet_path(name);
        if !path.is_file() {
            return Ok(None);
        }
        let bytes = fs::read(&path)?;
        parse_sheet_bytes(name, &bytes).map(Some)
    }
}

/// Separators in order of preference. Spanish-locale spreadsheet tools
/// export with `;`.
const DELIMITERS: [char; 4] = [';', ',', '\t', '|'];

/// Lines inspected when guessing the delimiter.
const SNIFF_LINES: usize = 5;

/// Pick the text encoding of a sheet.
///
/// A byte-order mark wins, then valid UTF-8. Anything else goes through
/// chardet; a label `encoding_rs` does not know, or one claiming UTF-8 for
/// bytes that are not, falls back to Windows-1252 (a superset of Latin-1).
pub fn detect_encoding(bytes: &[u8]) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return encoding;
    }
    if std::str::from_utf8(bytes).is_ok() {
        return UTF_8;
    }

    let (charset, confidence, _) = chardet::detect(bytes);
    match Encoding::for_label(charset.as_bytes()) {
        Some(encoding) if encoding != UTF_8 => encoding,
        _ => {
            tracing::debug!(%charset, confidence, "falling back to windows-1252");
            WINDOWS_1252
        }
    }
}

/// Decode a sheet, dropping any byte-order mark.
pub fn decode_content(bytes: &[u8], encoding: &'static Encoding) -> String {
    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::warn!(encoding = used.name(), "replaced undecodable bytes");
    }
    text.into_owned()
}

/// Guess the field separator from the first non-blank lines.
///
/// A separator that splits every sampled line into the same number of
/// fields beats one that does not; then the higher count on the header line
/// wins, and ties go to the earlier entry of [`DELIMITERS`].
pub fn detect_delimiter(content: &str) -> char {
    let lines: Vec<&str> = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .take(SNIFF_LINES)
        .collect();

    let header_count = |sep: char| lines.first().map_or(0, |line| line.matches(sep).count());
    let consistent = |sep: char| {
        let expected = header_count(sep);
        expected > 0 && lines.iter().all(|line| line.matches(sep).count() == expected)
    };

    let mut best = (DELIMITERS[0], (false, 0));
    for sep in DELIMITERS {
        let rank = (consistent(sep), header_count(sep));
        if rank > best.1 {
            best = (sep, rank);
        }
    }
    best.0
}

/// Parse one CSV sheet from raw bytes.
///
/// The first line is the header row. Blank lines are skipped; short rows
/// are padded with empty cells.
pub fn parse_sheet_bytes(name: &str, bytes: &[u8]) -> SourceResult<RawTable> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, encoding);
    let delimiter = detect_delimiter(&content);

    tracing::debug!(sheet = name, encoding = encoding.name(), delimiter = %delimiter, "decoded csv sheet");

    let csv_err = |e: csv::Error| SourceError::Csv {
        sheet: name.to_string(),
        message: e.to_string(),
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.trim_matches('"').to_string())
        .collect();

    let mut table = RawTable::new(name, headers);

    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        if record.iter().all(|v| v.trim().is_empty()) {
            continue;
        }
        let cells = record
            .iter()
            .map(|v| {
                if v.trim().is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::Text(v.to_string())
                }
            })
            .collect();
        table.push_row(cells);
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_semicolon_sheet() {
        let csv = "ID empeado;Sueldo Base;Bono %\nE01;1000;0.1\nE02;2000;0.2";
        let table = parse_sheet_bytes("Enero", csv.as_bytes()).unwrap();

        assert_eq!(table.name, "Enero");
        assert_eq!(table.headers, vec!["ID empeado", "Sueldo Base", "Bono %"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0][1], CellValue::Text("1000".into()));
    }

    #[test]
    fn test_quoted_values_keep_delimiter() {
        let csv = "name,value\n\"Perez, Ana\",10";
        let table = parse_sheet_bytes("s", csv.as_bytes()).unwrap();
        assert_eq!(table.rows[0][0], CellValue::Text("Perez, Ana".into()));
    }

    #[test]
    fn test_blank_lines_and_cells() {
        let csv = "a;b;c\n1;;3\n\n;;\n4;5;6\n";
        let table = parse_sheet_bytes("s", csv.as_bytes()).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0][1], CellValue::Empty);
    }

    #[test]
    fn test_short_rows_padded() {
        let csv = "a;b;c\n1";
        let table = parse_sheet_bytes("s", csv.as_bytes()).unwrap();
        assert_eq!(table.rows[0], vec![CellValue::Text("1".into()), CellValue::Empty, CellValue::Empty]);
    }

    #[test]
    fn test_header_only_sheet_is_empty_not_absent() {
        let table = parse_sheet_bytes("s", b"a;b\n").unwrap();
        assert_eq!(table.headers.len(), 2);
        assert!(table.is_empty());
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
        assert_eq!(detect_delimiter("a|b|c\n1|2|3"), '|');
    }

    #[test]
    fn test_delimiter_prefers_consistent_split() {
        // Commas only appear in the header, semicolons split every line.
        let content = "Nombre, Apellido, Segundo;Sueldo\nAna;100\nLuis;200\n";
        assert_eq!(detect_delimiter(content), ';');
    }

    #[test]
    fn test_delimiter_without_separator_defaults_to_semicolon() {
        assert_eq!(detect_delimiter("solo\n1\n"), ';');
        assert_eq!(detect_delimiter(""), ';');
    }

    #[test]
    fn test_detect_encoding() {
        assert_eq!(detect_encoding("Año;Compensación\n".as_bytes()), UTF_8);
        assert_eq!(detect_encoding(b"plain;ascii\n"), UTF_8);
        assert_ne!(detect_encoding(b"A\xf1o;Compensaci\xf3n;Pe\xf1a\n"), UTF_8);
    }

    #[test]
    fn test_latin1_decoding() {
        let bytes: &[u8] = b"Compensaci\xf3n;Pe\xf1a";
        assert_eq!(decode_content(bytes, WINDOWS_1252), "Compensación;Peña");
    }

    #[test]
    fn test_bom_stripped() {
        let bytes = "\u{feff}a;b".as_bytes();
        assert_eq!(detect_encoding(bytes), UTF_8);
        assert_eq!(decode_content(bytes, UTF_8), "a;b");
    }

    #[test]
    fn test_csv_workbook_sheets() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Febrero.csv"), "a\n1\n").unwrap();
        std::fs::write(dir.path().join("Enero.csv"), "a\n1\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let mut wb = CsvWorkbook::open(dir.path()).unwrap();
        assert_eq!(wb.sheet_names(), vec!["Enero", "Febrero"]);
        assert!(wb.read_sheet("Marzo").unwrap().is_none());
        assert!(wb.read_sheet("Enero").unwrap().is_some());
    }
}
