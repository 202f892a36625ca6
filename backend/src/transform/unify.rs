//! Table unification and deduplication.

use std::collections::HashSet;

use crate::error::{PipelineError, PipelineResult};
use crate::models::PayrollRecord;

use super::normalize::NormalizedTable;

/// All period tables concatenated into one record set.
#[derive(Debug, Clone, PartialEq)]
pub struct UnifiedTable {
    /// Union of the input columns, in first-seen order.
    pub columns: Vec<String>,
    pub records: Vec<PayrollRecord>,
    /// Labels of the tables that went in, in order.
    pub sources: Vec<String>,
    /// Exact duplicate rows removed.
    pub duplicates_removed: usize,
}

/// Concatenate normalized tables in the order given and drop exact
/// duplicates, keeping the first occurrence.
///
/// Fails with [`PipelineError::NoData`] when `tables` is empty.
pub fn unify(tables: Vec<NormalizedTable>) -> PipelineResult<UnifiedTable> {
    if tables.is_empty() {
        return Err(PipelineError::NoData);
    }

    let mut columns: Vec<String> = Vec::new();
    let mut sources = Vec::with_capacity(tables.len());
    let mut records = Vec::new();

    for table in tables {
        for column in table.columns {
            if !columns.contains(&column) {
                columns.push(column);
            }
        }
        sources.push(table.label);
        records.extend(table.records);
    }

    let (records, duplicates_removed) = deduplicate(records);

    Ok(UnifiedTable {
        columns,
        records,
        sources,
        duplicates_removed,
    })
}

/// Remove records identical across every column.
///
/// Returns the surviving records in their original order and the number
/// removed. Applying it to its own output removes nothing.
pub fn deduplicate(records: Vec<PayrollRecord>) -> (Vec<PayrollRecord>, usize) {
    let before = records.len();
    let mut seen: HashSet<PayrollRecord> = HashSet::with_capacity(before);
    let mut kept = Vec::with_capacity(before);

    for record in records {
        if !seen.contains(&record) {
            seen.insert(record.clone());
            kept.push(record);
        }
    }

    let removed = before - kept.len();
    (kept, removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CellValue, Decimal};
    use chrono::NaiveDate;

    fn record(id: &str, salary: Option<f64>) -> PayrollRecord {
        PayrollRecord {
            employee_id: Some(id.to_string()),
            base_salary: salary.map(Decimal),
            bonus_pct: Some(Decimal(0.1)),
            period: NaiveDate::from_ymd_opt(2024, 1, 31),
            other: Default::default(),
        }
    }

    fn table(label: &str, columns: &[&str], records: Vec<PayrollRecord>) -> NormalizedTable {
        NormalizedTable {
            label: label.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            records,
        }
    }

    #[test]
    fn test_empty_input_is_no_data() {
        assert!(matches!(unify(Vec::new()), Err(PipelineError::NoData)));
    }

    #[test]
    fn test_concatenates_in_order() {
        let unified = unify(vec![
            table("Enero", &["a", "b"], vec![record("E01", Some(1.0)), record("E02", Some(2.0))]),
            table("Febrero", &["b", "c"], vec![record("E03", Some(3.0))]),
        ])
        .unwrap();

        let ids: Vec<_> = unified.records.iter().map(|r| r.employee_id.clone().unwrap()).collect();
        assert_eq!(ids, vec!["E01", "E02", "E03"]);
        assert_eq!(unified.columns, vec!["a", "b", "c"]);
        assert_eq!(unified.sources, vec!["Enero", "Febrero"]);
        assert_eq!(unified.duplicates_removed, 0);
    }

    #[test]
    fn test_removes_duplicates_across_tables() {
        let unified = unify(vec![
            table("Enero", &["a"], vec![record("E01", Some(1.0)), record("E02", None)]),
            table("Febrero", &["a"], vec![record("E02", None), record("E03", Some(3.0))]),
        ])
        .unwrap();

        assert_eq!(unified.records.len(), 3);
        assert_eq!(unified.duplicates_removed, 1);
    }

    #[test]
    fn test_other_columns_participate() {
        let mut a = record("E01", Some(1.0));
        let mut b = record("E01", Some(1.0));
        a.other.insert("Cargo".into(), CellValue::from("Analista"));
        b.other.insert("Cargo".into(), CellValue::from("Gerente"));

        let (kept, removed) = deduplicate(vec![a, b]);
        assert_eq!(kept.len(), 2);
        assert_eq!(removed, 0);
    }

    #[test]
    fn test_deduplicate_idempotent() {
        let records = vec![
            record("E01", Some(1.0)),
            record("E01", Some(1.0)),
            record("E02", None),
            record("E02", None),
        ];
        let (once, removed) = deduplicate(records);
        assert_eq!(removed, 2);

        let (twice, removed_again) = deduplicate(once.clone());
        assert_eq!(twice.len(), once.len());
        assert_eq!(removed_again, 0);
    }

    #[test]
    fn test_empty_tables_still_unify() {
        let unified = unify(vec![table("Enero", &["a"], Vec::new())]).unwrap();
        assert!(unified.records.is_empty());
    }
}
