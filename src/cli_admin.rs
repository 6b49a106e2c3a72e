//! Account administration CLI for the music-store database.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vinyl_catalog::audit::ActionKind;
use vinyl_catalog::catalog_store::{ResolveMode, SqliteCatalogStore};
use vinyl_catalog::user::UserStore;

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the SQLite music-store database file.
    #[clap(value_parser = parse_path)]
    pub db: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Creates a regular account.
    RegisterUser {
        email: String,
        password: String,
        full_name: String,
        #[clap(default_value = "")]
        phone: String,
    },

    /// Creates an admin account.
    RegisterAdmin {
        email: String,
        password: String,
        full_name: String,
        #[clap(default_value = "")]
        phone: String,
    },

    /// Verifies a password against the stored hash. Makes no persistent
    /// change beyond a login entry in the action trail on success.
    CheckPassword { email: String, password: String },

    /// Shows all account emails.
    ListUsers,
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let store = SqliteCatalogStore::open(&cli_args.db, ResolveMode::Lenient)?;
    let users = store.user_store();

    match cli_args.command {
        Command::RegisterUser {
            email,
            password,
            full_name,
            phone,
        } => {
            if users.register_user(&email, &password, &full_name, &phone)? {
                println!("Registered user {}", email);
            } else {
                println!("An account with email {} already exists", email);
            }
        }

        Command::RegisterAdmin {
            email,
            password,
            full_name,
            phone,
        } => {
            if users.register_admin(&email, &password, &full_name, &phone)? {
                println!("Registered admin {}", email);
            } else {
                println!("An account with email {} already exists", email);
            }
        }

        Command::CheckPassword { email, password } => {
            if users.authenticate(&email, &password)? {
                store
                    .audit_logger()
                    .log(&email, ActionKind::Login, "session", "login successful");
                println!("Password OK");
            } else {
                println!("Authentication failed");
            }
        }

        Command::ListUsers => {
            for email in users.list_emails()? {
                println!("{}", email);
            }
        }
    }

    Ok(())
}
