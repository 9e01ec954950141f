use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::converter::{UnitConverter, UnitDefinition};

pub const TABLE_ENV: &str = "UNITSCALE_TABLE";

/// A unit table as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitTable {
    /// Unit to re-base on after construction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    pub units: Vec<UnitDefinition>,
}

impl UnitTable {
    pub fn into_converter(self) -> Result<UnitConverter> {
        let mut converter = UnitConverter::new(&self.units)?;
        if let Some(base) = self.base.as_deref() {
            converter
                .set_base_unit(base)
                .with_context(|| format!("table base \"{base}\" is not one of its units"))?;
        }
        Ok(converter)
    }
}

pub fn default_table_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("unitscale").join("units.json"))
}

fn expand_home(raw: &str) -> PathBuf {
    if let Some(stripped) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(raw)
}

/// Explicit path first, then `UNITSCALE_TABLE`, then the default table file if
/// it exists. `None` means the caller should fall back to a preset.
pub fn resolve_table_path(table_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = table_path {
        return Some(path.to_path_buf());
    }
    if let Ok(env_path) = std::env::var(TABLE_ENV) {
        if !env_path.trim().is_empty() {
            return Some(expand_home(env_path.trim()));
        }
        warn!("{TABLE_ENV} is set but empty; ignoring it");
    }
    default_table_path().filter(|path| path.is_file())
}

pub fn parse_table(raw: &str) -> Result<UnitTable> {
    let table: UnitTable = serde_json::from_str(raw)?;
    Ok(table)
}

pub fn load_table(path: &Path) -> Result<UnitTable> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read unit table {}", path.display()))?;
    let table = parse_table(&raw)
        .with_context(|| format!("failed to parse unit table {}", path.display()))?;
    debug!(
        "Loaded {} units from {}",
        table.units.len(),
        path.display()
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DISTANCE: &str = r#"{
        "base": "metre",
        "units": [
            { "id": "millimetre", "display_key": "mm", "factor": 0.001 },
            { "id": "metre", "display_key": "m", "factor": 1 },
            { "id": "kilometre", "display_key": "km", "factor": 1000 }
        ]
    }"#;

    #[test]
    fn load_table_reads_json_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("distance.json");
        fs::write(&path, DISTANCE).unwrap();

        let table = load_table(&path).unwrap();
        assert_eq!(table.base.as_deref(), Some("metre"));
        assert_eq!(table.units.len(), 3);

        let converter = table.into_converter().unwrap();
        let result = converter.convert_to_shortened(2500.0, 1, None).unwrap();
        assert_eq!(result.id, "kilometre");
        assert_eq!(result.display_key, "km");
        assert_eq!(result.rounded_value, 2.5);
    }

    #[test]
    fn table_accepts_legacy_field_names() {
        let table = parse_table(
            r#"{ "units": [
                { "id": "second", "translateKey": "SEC", "value": 1 },
                { "id": "minute", "value": 60 }
            ] }"#,
        )
        .unwrap();
        assert_eq!(table.units[0].display_key, "SEC");
        assert_eq!(table.units[1].display_key, "");
        assert_eq!(table.units[1].factor, 60.0);
        assert!(table.base.is_none());
    }

    #[test]
    fn table_base_is_applied() {
        let table = parse_table(
            r#"{ "base": "kilo", "units": [
                { "id": "unit", "factor": 1 },
                { "id": "kilo", "factor": 1000 }
            ] }"#,
        )
        .unwrap();
        let converter = table.into_converter().unwrap();
        assert_eq!(converter.base_unit(), "kilo");
        assert_eq!(converter.unit("unit").unwrap().factor, 0.001);
    }

    #[test]
    fn table_with_unknown_base_is_rejected() {
        let table = parse_table(r#"{ "base": "mile", "units": [ { "id": "metre", "factor": 1 } ] }"#)
            .unwrap();
        let err = table.into_converter().unwrap_err();
        assert!(err.to_string().contains("mile"));
    }

    #[test]
    fn table_without_base_unit_fails_to_build() {
        let table = parse_table(r#"{ "units": [ { "id": "kilo", "factor": 1000 } ] }"#).unwrap();
        let err = table.into_converter().unwrap_err();
        assert!(err.to_string().contains("missing base unit"));
    }

    #[test]
    fn load_table_reports_path_on_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        let err = load_table(&path).unwrap_err();
        assert!(err.to_string().contains("broken.json"));

        let missing = tmp.path().join("missing.json");
        assert!(load_table(&missing).is_err());
    }

    #[test]
    fn explicit_path_wins() {
        let path = Path::new("/tmp/explicit.json");
        assert_eq!(resolve_table_path(Some(path)), Some(path.to_path_buf()));
    }

    #[test]
    fn expand_home_only_touches_tilde_prefix() {
        assert_eq!(expand_home("/etc/units.json"), PathBuf::from("/etc/units.json"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/units.json"), home.join("units.json"));
        }
    }
}
