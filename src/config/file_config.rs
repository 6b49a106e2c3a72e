use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Optional TOML configuration file. Every field mirrors a CLI argument;
/// file values win over CLI values where present.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub db_path: Option<String>,
    pub resolve_mode: Option<String>,
    pub audit_retention_days: Option<u32>,
    pub sales_leaders_limit: Option<usize>,
}

impl FileConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file {:?}", path.as_ref()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {:?}", path.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_partial_config() {
        let config: FileConfig = toml::from_str(
            r#"
            db_path = "/data/store.db"
            resolve_mode = "exact"
            "#,
        )
        .unwrap();
        assert_eq!(config.db_path.as_deref(), Some("/data/store.db"));
        assert_eq!(config.resolve_mode.as_deref(), Some("exact"));
        assert!(config.audit_retention_days.is_none());
    }

    #[test]
    fn rejects_unknown_fields() {
        let result: Result<FileConfig, _> = toml::from_str("not_a_setting = 1");
        assert!(result.is_err());
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "audit_retention_days = 30").unwrap();
        let config = FileConfig::load(file.path()).unwrap();
        assert_eq!(config.audit_retention_days, Some(30));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(FileConfig::load("/no/such/config.toml").is_err());
    }
}
