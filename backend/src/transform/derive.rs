//! Derived compensation fields.
//!
//! Missing inputs propagate: an unknown salary or bonus percentage gives an
//! unknown bonus and total, never zero. A result that overflows to infinity
//! is unknown as well.

use crate::models::{CompensatedRecord, PayrollRecord};

/// `base_salary * bonus_pct`, when both are known.
pub fn bonus_amount(base_salary: Option<f64>, bonus_pct: Option<f64>) -> Option<f64> {
    Some(base_salary? * bonus_pct?).filter(|v| v.is_finite())
}

/// `base_salary + bonus_amount`, when both are known.
pub fn total_compensation(base_salary: Option<f64>, bonus_amount: Option<f64>) -> Option<f64> {
    Some(base_salary? + bonus_amount?).filter(|v| v.is_finite())
}

/// Compute bonus and total compensation for every record.
pub fn compute_compensation(records: Vec<PayrollRecord>) -> Vec<CompensatedRecord> {
    records
        .into_iter()
        .map(|record| {
            let bonus = bonus_amount(record.base_salary(), record.bonus_pct());
            let total = total_compensation(record.base_salary(), bonus);
            CompensatedRecord {
                record,
                bonus_amount: bonus,
                total_compensation: total,
            }
        })
        .collect()
}
