//! Error types for the payroll consolidation pipeline.
//!
//! One error enum per layer:
//!
//! - [`SourceError`] - workbook and sheet access
//! - [`SchemaError`] - required columns missing from a table
//! - [`ExportError`] - output workbook could not be produced
//! - [`ConfigError`] - configuration file problems
//! - [`PipelineError`] - top-level orchestration errors
//!
//! Lower layers convert into [`PipelineError`] through `From`,
//! so `?` works across the whole pipeline.

use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// Source Errors
// =============================================================================

/// A workbook or one of its sheets could not be read.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The input document could not be opened at all.
    #[error("Cannot open workbook '{path}': {message}")]
    Open { path: PathBuf, message: String },

    /// The requested sheet does not exist in the workbook.
    #[error("Sheet '{0}' not found")]
    SheetNotFound(String),

    /// The sheet exists but its contents could not be read.
    #[error("Cannot read sheet '{sheet}': {message}")]
    Sheet { sheet: String, message: String },

    /// CSV decoding failed.
    #[error("Invalid CSV in '{sheet}': {message}")]
    Csv { sheet: String, message: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Schema Errors
// =============================================================================

/// A table does not have the shape the normalizer needs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Required column absent after header normalization.
    #[error("Table '{table}' is missing required column '{column}'")]
    MissingColumn { table: String, column: String },

    /// Two headers normalize to the same identifier.
    #[error("Table '{table}' has duplicate column '{column}' after normalization")]
    DuplicateColumn { table: String, column: String },
}

// =============================================================================
// Export Errors
// =============================================================================

/// The output artifact could not be written.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Workbook construction failed.
    #[error("Workbook error: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),

    /// Summary serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing or renaming the output file failed.
    #[error("Cannot write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML syntax or type error.
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Semantically invalid value.
    #[error("Invalid config value for '{key}': {message}")]
    Invalid { key: String, message: String },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline errors.
///
/// Every variant aborts the run before any output is written.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input document or a mandatory sheet unavailable.
    #[error("Source unavailable: {0}")]
    SourceUnavailable(#[from] SourceError),

    /// Mandatory table malformed.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Every requested period failed to load.
    #[error("No payroll period could be loaded")]
    NoData,

    /// Reference table lists an employee more than once.
    #[error("Employee '{employee_id}' appears {occurrences} times in the reference table")]
    ReferenceIntegrity {
        employee_id: String,
        occurrences: usize,
    },

    /// Output could not be written.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for source operations.
pub type SourceResult<T> = Result<T, SourceError>;

/// Result type for normalization.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let source_err = SourceError::SheetNotFound("Base".into());
        let pipeline_err: PipelineError = source_err.into();
        assert!(matches!(pipeline_err, PipelineError::SourceUnavailable(_)));
        assert!(pipeline_err.to_string().contains("Base"));

        let schema_err = SchemaError::MissingColumn {
            table: "Enero".into(),
            column: "Sueldo_Base".into(),
        };
        let pipeline_err: PipelineError = schema_err.into();
        assert!(pipeline_err.to_string().contains("Sueldo_Base"));
    }

    #[test]
    fn test_reference_integrity_format() {
        let err = PipelineError::ReferenceIntegrity {
            employee_id: "E01".into(),
            occurrences: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("E01"));
        assert!(msg.contains("2 times"));
    }
}
