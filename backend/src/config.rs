//! Run configuration.
//!
//! Loaded from a TOML file:
//!
//! ```toml
//! [files]
//! input = "nomina.xlsx"
//! output = "resultado_final.xlsx"
//!
//! [sheets]
//! reference = "Base"
//! periods = ["Enero", "Febrero", "Marzo"]
//!
//! [columns]
//! employee_id = "ID_empeado"
//! ```
//!
//! `[columns]` is optional; every entry defaults to the column names of
//! the standard payroll template.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ConfigResult};

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "payroll.toml";

/// Complete run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub files: FileConfig,
    pub sheets: SheetConfig,
    #[serde(default)]
    pub columns: ColumnMap,
}

/// Input and output locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    /// Spreadsheet file, or directory of `<sheet>.csv` files.
    pub input: PathBuf,
    /// Output workbook.
    pub output: PathBuf,
    /// Optional JSON copy of the summary.
    #[serde(default)]
    pub summary_json: Option<PathBuf>,
}

/// Which sheets to read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetConfig {
    /// Employee roster sheet.
    pub reference: String,
    /// Monthly sheets, processed in this order.
    #[serde(deserialize_with = "deserialize_periods")]
    pub periods: Vec<String>,
}

/// Normalized column identifiers the pipeline depends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMap {
    pub employee_id: String,
    pub base_salary: String,
    pub bonus_pct: String,
    pub period: String,
    pub hire_date: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            employee_id: "ID_empeado".to_string(),
            base_salary: "Sueldo_Base".to_string(),
            bonus_pct: "Bono_%".to_string(),
            period: "Mes".to_string(),
            hire_date: "Fecha_de_Ingreso".to_string(),
        }
    }
}

/// Accept either a list or a single comma-separated string.
fn deserialize_periods<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Periods {
        List(Vec<String>),
        Joined(String),
    }

    let periods = match Periods::deserialize(deserializer)? {
        Periods::List(list) => list,
        Periods::Joined(joined) => joined.split(',').map(String::from).collect(),
    };
    Ok(periods.into_iter().map(|p| p.trim().to_string()).collect())
}

impl PipelineConfig {
    /// Load and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(content: &str) -> ConfigResult<Self> {
        let config: PipelineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the values serde cannot check.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.sheets.reference.trim().is_empty() {
            return Err(invalid("sheets.reference", "must not be blank"));
        }
        if self.sheets.periods.is_empty() {
            return Err(invalid("sheets.periods", "at least one period is required"));
        }
        if self.sheets.periods.iter().any(|p| p.is_empty()) {
            return Err(invalid("sheets.periods", "period names must not be blank"));
        }
        for (i, period) in self.sheets.periods.iter().enumerate() {
            if self.sheets.periods[..i].contains(period) {
                return Err(invalid("sheets.periods", &format!("'{}' is listed twice", period)));
            }
        }

        let columns = [
            ("columns.employee_id", &self.columns.employee_id),
            ("columns.base_salary", &self.columns.base_salary),
            ("columns.bonus_pct", &self.columns.bonus_pct),
            ("columns.period", &self.columns.period),
            ("columns.hire_date", &self.columns.hire_date),
        ];
        for (key, value) in columns {
            if value.trim().is_empty() {
                return Err(invalid(key, "must not be blank"));
            }
        }
        Ok(())
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[files]
input = "nomina.xlsx"
output = "resultado_final.xlsx"

[sheets]
reference = "Base"
periods = ["Enero", "Febrero", "Marzo"]
"#;

    #[test]
    fn test_load_sample() {
        let config = PipelineConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.files.input, PathBuf::from("nomina.xlsx"));
        assert_eq!(config.sheets.reference, "Base");
        assert_eq!(config.sheets.periods, vec!["Enero", "Febrero", "Marzo"]);
        assert_eq!(config.columns, ColumnMap::default());
        assert!(config.files.summary_json.is_none());
    }

    #[test]
    fn test_comma_separated_periods() {
        let toml = SAMPLE.replace(
            r#"periods = ["Enero", "Febrero", "Marzo"]"#,
            r#"periods = "Enero, Febrero ,Marzo""#,
        );
        let config = PipelineConfig::from_toml(&toml).unwrap();
        assert_eq!(config.sheets.periods, vec!["Enero", "Febrero", "Marzo"]);
    }

    #[test]
    fn test_partial_column_override() {
        let toml = format!("{}\n[columns]\nemployee_id = \"ID_empleado\"\n", SAMPLE);
        let config = PipelineConfig::from_toml(&toml).unwrap();
        assert_eq!(config.columns.employee_id, "ID_empleado");
        assert_eq!(config.columns.base_salary, "Sueldo_Base");
    }

    #[test]
    fn test_rejects_duplicate_periods() {
        let toml = SAMPLE.replace("\"Marzo\"", "\"Enero\"");
        let err = PipelineConfig::from_toml(&toml).unwrap_err();
        assert!(err.to_string().contains("listed twice"));
    }

    #[test]
    fn test_rejects_empty_periods() {
        let toml = SAMPLE.replace(r#"["Enero", "Febrero", "Marzo"]"#, "[]");
        assert!(matches!(
            PipelineConfig::from_toml(&toml),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_missing_section_is_parse_error() {
        let err = PipelineConfig::from_toml("[files]\ninput = \"a\"\noutput = \"b\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = PipelineConfig::load("/no/such/payroll.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
