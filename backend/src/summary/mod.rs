//! Executive summary over the enriched record set.
//!
//! The report is a fixed, ordered list of 13 metrics. Order and labels are
//! part of the output format: consumers read the summary sheet by position.
//!
//! Means skip missing values entirely (`[100, null, 300]` averages to
//! 200). Tenure is never missing at this point, so its statistics use the
//! zero-filled values, while the null counts look at the values before any
//! filling.

use serde::Serialize;
use std::collections::HashSet;

use crate::models::EnrichedRecord;

/// Labels in report order.
pub const METRIC_LABELS: [&str; 13] = [
    "Total Records",
    "Unique Employees",
    "Average Base Salary",
    "Average Bonus Percentage",
    "Average Calculated Bonus",
    "Average Total Compensation",
    "Average Tenure (months)",
    "Minimum Tenure (months)",
    "Maximum Tenure (months)",
    "Records with Null Base Salary",
    "Records with Null Bonus %",
    "Records with Null Period",
    "Records with Null Hire Date",
];

/// Rendered when a statistic has no input values.
pub const NOT_AVAILABLE: &str = "N/A";

/// Raw summary statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_records: usize,
    pub unique_employees: usize,
    pub avg_base_salary: Option<f64>,
    pub avg_bonus_pct: Option<f64>,
    pub avg_bonus_amount: Option<f64>,
    pub avg_total_compensation: Option<f64>,
    pub avg_tenure_months: Option<f64>,
    pub min_tenure_months: Option<i64>,
    pub max_tenure_months: Option<i64>,
    pub null_base_salary: usize,
    pub null_bonus_pct: usize,
    pub null_period: usize,
    pub null_hire_date: usize,
}

/// One labeled, formatted line of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    pub metric: String,
    pub value: String,
}

/// Mean of the present values; `None` when there are none.
pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let (sum, count) = values
        .into_iter()
        .flatten()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Compute the summary statistics.
pub fn summarize(records: &[EnrichedRecord]) -> Summary {
    let unique_employees = records
        .iter()
        .filter_map(|r| r.record.employee_id.as_deref())
        .collect::<HashSet<_>>()
        .len();

    let tenures = records.iter().map(|r| r.tenure_months);

    Summary {
        total_records: records.len(),
        unique_employees,
        avg_base_salary: mean(records.iter().map(|r| r.record.base_salary())),
        avg_bonus_pct: mean(records.iter().map(|r| r.record.bonus_pct())),
        avg_bonus_amount: mean(records.iter().map(|r| r.bonus_amount)),
        avg_total_compensation: mean(records.iter().map(|r| r.total_compensation)),
        avg_tenure_months: mean(tenures.clone().map(|t| Some(t as f64))),
        min_tenure_months: tenures.clone().min(),
        max_tenure_months: tenures.max(),
        null_base_salary: records.iter().filter(|r| r.record.base_salary.is_none()).count(),
        null_bonus_pct: records.iter().filter(|r| r.record.bonus_pct.is_none()).count(),
        null_period: records.iter().filter(|r| r.record.period.is_none()).count(),
        null_hire_date: records.iter().filter(|r| r.hire_date.is_none()).count(),
    }
}

impl Summary {
    /// The 13 report rows in their fixed order.
    pub fn rows(&self) -> Vec<SummaryRow> {
        let values = [
            self.total_records.to_string(),
            self.unique_employees.to_string(),
            or_na(self.avg_base_salary, format_currency),
            or_na(self.avg_bonus_pct, format_percent),
            or_na(self.avg_bonus_amount, format_currency),
            or_na(self.avg_total_compensation, format_currency),
            or_na(self.avg_tenure_months, |v| format!("{:.2}", v)),
            or_na(self.min_tenure_months, |v| v.to_string()),
            or_na(self.max_tenure_months, |v| v.to_string()),
            self.null_base_salary.to_string(),
            self.null_bonus_pct.to_string(),
            self.null_period.to_string(),
            self.null_hire_date.to_string(),
        ];

        METRIC_LABELS
            .iter()
            .zip(values)
            .map(|(label, value)| SummaryRow {
                metric: label.to_string(),
                value,
            })
            .collect()
    }
}

fn or_na<T>(value: Option<T>, format: impl Fn(T) -> String) -> String {
    value.map(format).unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Two decimals with comma thousands separators: `1234567.891` -> `1,234,567.89`.
///
/// Non-finite values render as `N/A`.
pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        "-"
    } else {
        ""
    };
    format!("{}{}.{}", sign, grouped, frac_part)
}

/// Fraction as a percentage with two decimals: `0.1234` -> `12.34%`.
pub fn format_percent(value: f64) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    format!("{:.2}%", value * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Decimal, PayrollRecord};
    use chrono::NaiveDate;

    fn enriched(
        id: Option<&str>,
        salary: Option<f64>,
        pct: Option<f64>,
        hire: Option<NaiveDate>,
        tenure: Option<i64>,
    ) -> EnrichedRecord {
        let bonus = crate::transform::derive::bonus_amount(salary, pct);
        EnrichedRecord {
            record: PayrollRecord {
                employee_id: id.map(String::from),
                base_salary: salary.map(Decimal),
                bonus_pct: pct.map(Decimal),
                period: NaiveDate::from_ymd_opt(2024, 1, 31),
                other: Default::default(),
            },
            bonus_amount: bonus,
            total_compensation: crate::transform::derive::total_compensation(salary, bonus),
            hire_date: hire,
            tenure_months: tenure.unwrap_or(0),
            tenure_known: tenure.is_some(),
        }
    }

    #[test]
    fn test_mean_excludes_nulls() {
        assert_eq!(mean([Some(100.0), None, Some(300.0)]), Some(200.0));
        assert_eq!(mean([None, None]), None);
        assert_eq!(mean(Vec::new()), None);
    }

    #[test]
    fn test_summarize() {
        let hire = NaiveDate::from_ymd_opt(2020, 1, 1);
        let records = vec![
            enriched(Some("E01"), Some(100.0), Some(0.1), hire, Some(48)),
            enriched(Some("E01"), None, Some(0.3), hire, Some(47)),
            enriched(Some("E02"), Some(300.0), None, None, None),
            enriched(None, Some(200.0), Some(0.2), None, None),
        ];

        let s = summarize(&records);
        assert_eq!(s.total_records, 4);
        assert_eq!(s.unique_employees, 2);
        assert_eq!(s.avg_base_salary, Some(200.0));
        assert!((s.avg_bonus_pct.unwrap() - 0.2).abs() < 1e-12);
        // Bonuses: 10 and 40.
        assert_eq!(s.avg_bonus_amount, Some(25.0));
        // Totals: 110 and 240.
        assert_eq!(s.avg_total_compensation, Some(175.0));
        assert_eq!(s.avg_tenure_months, Some(23.75));
        assert_eq!(s.min_tenure_months, Some(0));
        assert_eq!(s.max_tenure_months, Some(48));
        assert_eq!(s.null_base_salary, 1);
        assert_eq!(s.null_bonus_pct, 1);
        assert_eq!(s.null_period, 0);
        assert_eq!(s.null_hire_date, 2);
    }

    #[test]
    fn test_rows_fixed_order_and_format() {
        let hire = NaiveDate::from_ymd_opt(2020, 1, 1);
        let records = vec![
            enriched(Some("E01"), Some(1_234_567.891), Some(0.125), hire, Some(12)),
            enriched(Some("E02"), None, None, None, None),
        ];
        let rows = summarize(&records).rows();

        assert_eq!(rows.len(), 13);
        let labels: Vec<&str> = rows.iter().map(|r| r.metric.as_str()).collect();
        assert_eq!(labels, METRIC_LABELS.to_vec());

        assert_eq!(rows[0].value, "2");
        assert_eq!(rows[1].value, "2");
        assert_eq!(rows[2].value, "1,234,567.89");
        assert_eq!(rows[3].value, "12.50%");
        assert_eq!(rows[6].value, "6.00");
        assert_eq!(rows[7].value, "0");
        assert_eq!(rows[8].value, "12");
        assert_eq!(rows[12].value, "1");
    }

    #[test]
    fn test_empty_set_renders_na() {
        let rows = summarize(&[]).rows();
        assert_eq!(rows[0].value, "0");
        assert_eq!(rows[2].value, NOT_AVAILABLE);
        assert_eq!(rows[6].value, NOT_AVAILABLE);
        assert_eq!(rows[7].value, NOT_AVAILABLE);
        assert_eq!(rows[9].value, "0");
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(0.0), "0.00");
        assert_eq!(format_currency(999.999), "1,000.00");
        assert_eq!(format_currency(1234.5), "1,234.50");
        assert_eq!(format_currency(123456.0), "123,456.00");
        assert_eq!(format_currency(-1234567.0), "-1,234,567.00");
        assert_eq!(format_currency(-0.001), "0.00");
    }

    #[test]
    fn test_non_finite_values_not_available() {
        assert_eq!(format_currency(f64::INFINITY), NOT_AVAILABLE);
        assert_eq!(format_currency(f64::NEG_INFINITY), NOT_AVAILABLE);
        assert_eq!(format_currency(f64::NAN), NOT_AVAILABLE);
        assert_eq!(format_percent(f64::NAN), NOT_AVAILABLE);
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(0.1), "10.00%");
        assert_eq!(format_percent(0.1234), "12.34%");
        assert_eq!(format_percent(0.5), "50.00%");
    }
}
