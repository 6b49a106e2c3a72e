use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vinyl_catalog::analytics::Report;
use vinyl_catalog::audit::{ActionKind, AuditLogFilter};
use vinyl_catalog::catalog_store::{ResolveMode, SqliteCatalogStore};
use vinyl_catalog::config::{AppConfig, CliConfig, FileConfig};
use vinyl_catalog::display::field_label;

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the SQLite music-store database file.
    #[clap(long, value_parser = parse_path)]
    pub db: Option<PathBuf>,

    /// Path to a TOML config file; file values override CLI values.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// How display strings resolve to entities.
    #[clap(long, default_value = "lenient")]
    pub resolve_mode: ResolveMode,

    /// Days of action-trail history kept by prune-audit.
    #[clap(long, default_value_t = 90)]
    pub audit_retention_days: u32,

    /// Number of rows shown by sales-leaders.
    #[clap(long, default_value_t = 10)]
    pub sales_leaders_limit: usize,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Shows entity counts.
    Counts,

    /// Runs one of the fixed analytics reports.
    Report {
        #[clap(value_enum)]
        kind: Report,

        /// Emit rows as JSON instead of text.
        #[clap(long)]
        json: bool,
    },

    /// Shows the top records by current-year sales.
    SalesLeaders {
        /// Emit rows as JSON instead of text.
        #[clap(long)]
        json: bool,
    },

    /// Shows an ensemble's repertoire size and the records it appears on.
    SearchEnsemble { name: String },

    /// Shows a user's action trail, newest first.
    Actions {
        email: String,

        /// Narrow to one action kind.
        #[clap(long, value_enum)]
        kind: Option<ActionKind>,

        /// Inclusive start date (YYYY-MM-DD).
        #[clap(long, value_parser = parse_date)]
        from: Option<NaiveDate>,

        /// Inclusive end date (YYYY-MM-DD).
        #[clap(long, value_parser = parse_date)]
        to: Option<NaiveDate>,
    },

    /// Deletes action-trail rows older than the retention window.
    PruneAudit,
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };
    let cli_config = CliConfig {
        db_path: cli_args.db.clone(),
        resolve_mode: cli_args.resolve_mode,
        audit_retention_days: cli_args.audit_retention_days,
        sales_leaders_limit: cli_args.sales_leaders_limit,
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    info!("Opening music-store database at {:?}...", config.db_path);
    let store = SqliteCatalogStore::open(&config.db_path, config.resolve_mode)?;

    match cli_args.command {
        Command::Counts => {
            let counts = store.counts()?;
            println!("ensembles:    {}", counts.ensembles);
            println!("musicians:    {}", counts.musicians);
            println!("compositions: {}", counts.compositions);
            println!("records:      {}", counts.records);
        }

        Command::Report { kind, json } => {
            let rows = kind.run(&store.gateway());
            if json {
                let values: Vec<serde_json::Value> = rows.iter().map(|r| r.to_json()).collect();
                println!("{}", serde_json::to_string_pretty(&values)?);
            } else {
                println!("{}", kind.title());
                println!();
                for row in &rows {
                    for column in kind.columns() {
                        println!("  {}: {}", field_label(column), row.get(column));
                    }
                    println!();
                }
                println!("{} row(s)", rows.len());
            }
        }

        Command::SalesLeaders { json } => {
            let leaders = store.sales_leaders(config.sales_leaders_limit)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&leaders)?);
            } else {
                println!("Sales leaders, current year");
                for record in &leaders {
                    println!(
                        "  {} (sales: {}, retail: {}, stock: {})",
                        record.title,
                        record.current_year_sales,
                        record.retail_price,
                        record.remaining_stock
                    );
                }
            }
        }

        Command::SearchEnsemble { name } => {
            let count = store.ensemble_repertoire_size(&name)?;
            let records = store.ensemble_records(&name)?;
            println!("Ensemble '{}'", name);
            println!("Performs {} composition(s)", count);
            println!("Appears on {} record(s)", records.len());
            for record in &records {
                println!("  - {} (sales: {})", record.title, record.current_year_sales);
            }
        }

        Command::Actions { email, kind, from, to } => {
            let mut filter = AuditLogFilter::new();
            filter.kind = kind;
            filter.from_date = from;
            filter.to_date = to;
            let entries = store.audit_logger().entries_for_user(&email, &filter)?;
            for entry in &entries {
                println!(
                    "{}  {:<6}  {:<12}  {}  [{}]",
                    entry.action_date,
                    entry.kind.to_db_str(),
                    entry.entity_type,
                    entry.details,
                    entry.ip_address
                );
            }
            println!("Total actions: {}", entries.len());
        }

        Command::PruneAudit => {
            let deleted = store
                .audit_logger()
                .prune_older_than(config.audit_retention_days)?;
            info!(
                "Pruned {} audit entries older than {} days",
                deleted, config.audit_retention_days
            );
        }
    }

    Ok(())
}
