//! Transformation module.
//!
//! This module turns raw period sheets into the enriched record set:
//! - Normalize: header cleanup and lenient type coercion
//! - Unify: concatenation and exact-duplicate removal
//! - Derive: bonus amount and total compensation
//! - Enrich: hire-date join and tenure
//! - Pipeline: sequences the steps above

pub mod derive;
pub mod enrich;
pub mod normalize;
pub mod pipeline;
pub mod unify;

pub use derive::{bonus_amount, compute_compensation, total_compensation};
pub use enrich::{enrich, tenure_months, Enrichment, ReferenceIndex};
pub use normalize::{normalize_column_name, normalize_reference, normalize_table, NormalizedTable};
pub use pipeline::{run, run_pipeline, PipelineOutput, SkippedPeriod};
pub use unify::{deduplicate, unify, UnifiedTable};
