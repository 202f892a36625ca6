//! Hire-date enrichment and tenure.
//!
//! Records are left-joined against the employee roster on the employee
//! identifier. The roster must list each employee once: a duplicate would
//! silently multiply payroll rows, so it is rejected up front.

use chrono::{Datelike, NaiveDate};
use std::collections::HashMap;

use crate::error::{PipelineError, PipelineResult};
use crate::models::{CompensatedRecord, EmployeeReference, EnrichedRecord};

/// Employee identifier -> hire date, built from a roster with unique ids.
#[derive(Debug, Clone, Default)]
pub struct ReferenceIndex {
    hire_dates: HashMap<String, Option<NaiveDate>>,
    /// Roster rows without an identifier; they cannot match anything.
    pub skipped_blank: usize,
}

impl ReferenceIndex {
    /// Index the roster, failing on the first identifier (in roster order)
    /// that appears more than once.
    pub fn build(rows: &[EmployeeReference]) -> PipelineResult<Self> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for id in rows.iter().filter_map(|r| r.employee_id.as_deref()) {
            *counts.entry(id).or_default() += 1;
        }

        if let Some(id) = rows
            .iter()
            .filter_map(|r| r.employee_id.as_deref())
            .find(|id| counts[id] > 1)
        {
            return Err(PipelineError::ReferenceIntegrity {
                employee_id: id.to_string(),
                occurrences: counts[id],
            });
        }

        let mut index = ReferenceIndex::default();
        for row in rows {
            match &row.employee_id {
                Some(id) => {
                    index.hire_dates.insert(id.clone(), row.hire_date);
                }
                None => index.skipped_blank += 1,
            }
        }
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.hire_dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hire_dates.is_empty()
    }

    pub fn contains(&self, employee_id: &str) -> bool {
        self.hire_dates.contains_key(employee_id)
    }

    /// Hire date of a known employee (`None` if unknown or undated).
    pub fn hire_date(&self, employee_id: &str) -> Option<NaiveDate> {
        self.hire_dates.get(employee_id).copied().flatten()
    }
}

/// Output of [`enrich`].
#[derive(Debug, Clone, PartialEq)]
pub struct Enrichment {
    pub records: Vec<EnrichedRecord>,
    /// Records whose identifier had no roster entry.
    pub unmatched: usize,
}

/// Complete months from `hire` to `period`.
///
/// A month only counts once the day of month is reached again, so hired on
/// the 20th and measured on the 15th of a later month leaves that month
/// uncounted. Negative when the period precedes the hire date.
pub fn tenure_months(period: Option<NaiveDate>, hire: Option<NaiveDate>) -> Option<i64> {
    let (end, start) = (period?, hire?);
    let years = i64::from(end.year() - start.year());
    let months = i64::from(end.month()) - i64::from(start.month());
    let partial = i64::from(end.day() < start.day());
    Some(years * 12 + months - partial)
}

/// Left join `records` against the roster and compute tenure.
///
/// Every input record produces exactly one output record. Unknown tenure
/// is reported as 0 months with `tenure_known == false`.
pub fn enrich(records: Vec<CompensatedRecord>, index: &ReferenceIndex) -> Enrichment {
    let mut unmatched = 0;

    let records = records
        .into_iter()
        .map(|r| {
            let matched = r
                .record
                .employee_id
                .as_deref()
                .is_some_and(|id| index.contains(id));
            if !matched {
                unmatched += 1;
            }

            let hire_date = r.record.employee_id.as_deref().and_then(|id| index.hire_date(id));
            let tenure = tenure_months(r.record.period, hire_date);

            EnrichedRecord {
                record: r.record,
                bonus_amount: r.bonus_amount,
                total_compensation: r.total_compensation,
                hire_date,
                tenure_months: tenure.unwrap_or(0),
                tenure_known: tenure.is_some(),
            }
        })
        .collect();

    Enrichment { records, unmatched }
}
