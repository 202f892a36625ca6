//! # Payroll - monthly payroll consolidation
//!
//! Consolidates monthly payroll sheets into one enriched record set and an
//! executive summary.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Workbook   │────▶│  Normalize  │────▶│ Unify/Derive│────▶│   Enrich    │
//! │ (xlsx/csv)  │     │ (per sheet) │     │  (dedup)    │     │ (hire date) │
//! └─────────────┘     └─────────────┘     └─────────────┘     └──────┬──────┘
//!                                                                    ▼
//!                                         ┌─────────────┐     ┌─────────────┐
//!                                         │   Report    │◀────│   Summary   │
//!                                         │  (2 sheets) │     │ (13 rows)   │
//!                                         └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use payroll::{run, PipelineConfig};
//!
//! let config = PipelineConfig::load("payroll.toml")?;
//! let output = run(&config)?;
//! for row in output.summary.rows() {
//!     println!("{}: {}", row.metric, row.value);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Cells, raw tables and record types
//! - [`config`] - TOML run configuration
//! - [`logs`] - Run log mirrored to `tracing`
//! - [`source`] - Workbook readers (spreadsheet, CSV directory, memory)
//! - [`transform`] - Normalization, unification, enrichment and pipeline
//! - [`summary`] - Executive summary statistics
//! - [`export`] - Output workbook and summary JSON

// Core modules
pub mod error;
pub mod models;

// Configuration and logging
pub mod config;
pub mod logs;

// Input
pub mod source;

// Transformation
pub mod transform;

// Output
pub mod export;
pub mod summary;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError,
    ExportError,
    PipelineError,
    PipelineResult,
    SchemaError,
    SourceError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    CellValue,
    CompensatedRecord,
    EmployeeReference,
    EnrichedRecord,
    PayrollRecord,
    RawTable,
};

// =============================================================================
// Re-exports - Configuration
// =============================================================================

pub use config::{ColumnMap, PipelineConfig, DEFAULT_CONFIG_FILE};

// =============================================================================
// Re-exports - Sources
// =============================================================================

pub use source::{open_workbook, CsvWorkbook, MemoryWorkbook, WorkbookSource, XlsxWorkbook};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{run, run_pipeline, PipelineOutput, SkippedPeriod};

// =============================================================================
// Re-exports - Summary and export
// =============================================================================

pub use export::{write_outputs, write_report, write_summary_json, Report};
pub use summary::{summarize, Summary, SummaryRow, METRIC_LABELS};
