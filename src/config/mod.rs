mod file_config;

pub use file_config::FileConfig;

use crate::catalog_store::ResolveMode;
use anyhow::Result;
use clap::ValueEnum;
use std::path::PathBuf;

/// CLI arguments subject to config resolution. Mirrors the fields a TOML
/// file can override.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub resolve_mode: ResolveMode,
    pub audit_retention_days: u32,
    pub sales_leaders_limit: usize,
}

impl Default for CliConfig {
    fn default() -> Self {
        CliConfig {
            db_path: None,
            resolve_mode: ResolveMode::Lenient,
            audit_retention_days: 90,
            sales_leaders_limit: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub resolve_mode: ResolveMode,
    pub audit_retention_days: u32,
    pub sales_leaders_limit: usize,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and an optional TOML file.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "db_path must be specified via the command line or in the config file"
                )
            })?;

        let resolve_mode = file
            .resolve_mode
            .and_then(|s| parse_resolve_mode(&s))
            .unwrap_or(cli.resolve_mode);

        let audit_retention_days = file
            .audit_retention_days
            .unwrap_or(cli.audit_retention_days);
        let sales_leaders_limit = file
            .sales_leaders_limit
            .unwrap_or(cli.sales_leaders_limit);

        Ok(AppConfig {
            db_path,
            resolve_mode,
            audit_retention_days,
            sales_leaders_limit,
        })
    }
}

/// Parses a resolve-mode string via clap's ValueEnum trait.
fn parse_resolve_mode(s: &str) -> Option<ResolveMode> {
    ResolveMode::from_str(s, true).ok()
}
