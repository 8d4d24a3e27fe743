//! Configuration system for the converter

use crate::error::ConfigError;
use crate::resolver::dates::parse_utc_offset;
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Main converter configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Resolve sheets on the rayon thread pool
    #[serde(default)]
    pub parallel_sheets: bool,
    #[serde(default)]
    pub dates: DateConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub sheets: HashMap<String, SheetConfig>,
}

impl ConverterConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Check that every configured offset parses
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_offset(&self.dates.utc_offset, "[dates]")?;

        for (sheet_name, sheet_config) in &self.sheets {
            if let Some(offset) = &sheet_config.utc_offset {
                check_offset(offset, &format!("sheet '{}'", sheet_name))?;
            }
        }

        Ok(())
    }

    /// UTC offset stamped on the dates of a sheet, with fallback chain: sheet -> global
    pub fn offset_for(&self, sheet_name: &str) -> Result<FixedOffset, ConfigError> {
        // Try sheet-specific first
        if let Some(offset) = self
            .sheets
            .get(sheet_name)
            .and_then(|sheet| sheet.utc_offset.as_deref())
        {
            return check_offset(offset, &format!("sheet '{}'", sheet_name));
        }

        // Try global
        check_offset(&self.dates.utc_offset, "[dates]")
    }
}

fn check_offset(value: &str, scope: &str) -> Result<FixedOffset, ConfigError> {
    parse_utc_offset(value).ok_or_else(|| ConfigError::InvalidOffset {
        value: value.to_string(),
        scope: scope.to_string(),
    })
}

/// Date rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateConfig {
    /// Offset appended to every date value ("Z", "+HH:MM" or "+HHMM")
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,
}

impl Default for DateConfig {
    fn default() -> Self {
        Self {
            utc_offset: default_utc_offset(),
        }
    }
}

fn default_utc_offset() -> String {
    "+00:00".to_string()
}

/// JSON output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub pretty: bool,
}

/// Sheet-specific configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SheetConfig {
    /// Overrides `[dates] utc_offset` for this sheet
    #[serde(default)]
    pub utc_offset: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ConverterConfig::default();
        assert!(!config.parallel_sheets);
        assert!(!config.output.pretty);
        assert_eq!(config.dates.utc_offset, "+00:00");
        assert!(config.validate().is_ok());
        assert_eq!(config.offset_for("Sheet1").unwrap(), FixedOffset::east_opt(0).unwrap());
    }

    #[test]
    fn test_parse_and_sheet_fallback() {
        let config = ConverterConfig::from_toml(
            r#"
            parallel_sheets = true

            [dates]
            utc_offset = "+02:00"

            [output]
            pretty = true

            [sheets."Q1 Sales"]
            utc_offset = "-0500"
            "#,
        )
        .unwrap();

        assert!(config.parallel_sheets);
        assert!(config.output.pretty);
        assert!(config.validate().is_ok());
        assert_eq!(
            config.offset_for("Q1 Sales").unwrap(),
            FixedOffset::west_opt(5 * 3600).unwrap()
        );
        assert_eq!(
            config.offset_for("Other").unwrap(),
            FixedOffset::east_opt(2 * 3600).unwrap()
        );
    }

    #[test]
    fn test_sheet_without_offset_uses_global() {
        let config = ConverterConfig::from_toml(
            r#"
            [sheets.Raw]
            "#,
        )
        .unwrap();
        assert_eq!(config.offset_for("Raw").unwrap(), FixedOffset::east_opt(0).unwrap());
    }

    #[test]
    fn test_validation() {
        let mut bad_config = ConverterConfig::default();
        bad_config.dates.utc_offset = "CET".to_string();
        assert!(matches!(
            bad_config.validate(),
            Err(ConfigError::InvalidOffset { .. })
        ));

        let mut bad_config = ConverterConfig::default();
        bad_config.sheets.insert(
            "Sheet1".to_string(),
            SheetConfig {
                utc_offset: Some("+99:00".to_string()),
            },
        );
        let err = bad_config.validate().unwrap_err();
        assert!(err.to_string().contains("sheet 'Sheet1'"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[output]\npretty = true").unwrap();
        let config = ConverterConfig::from_file(file.path()).unwrap();
        assert!(config.output.pretty);

        assert!(matches!(
            ConverterConfig::from_toml("parallel_sheets = \"yes\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            ConverterConfig::from_file("/nonexistent/sheetjson.toml"),
            Err(ConfigError::Io(_))
        ));
    }
}
