//! Practica CLI - run the practice-tracking HTTP service

use clap::{Parser, Subcommand};
use practica::config::{self, PracticaConfig, Settings};
use practica::storage::Store;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "practica")]
#[command(version = "0.1.0")]
#[command(about = "Practice-tracking service - instruments, exercises, sessions and logs")]
#[command(long_about = r#"
Practica stores instruments, tunings, exercises and practice sessions in a
relational schema and serves them over a CRUD HTTP API.

Example usage:
  practica init --database sqlite://practica.db
  practica serve --port 3000
  practica stats
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on (default 3000)
        #[arg(short, long)]
        port: Option<u16>,

        /// Database connection string (overrides config and environment)
        #[arg(short, long)]
        database: Option<String>,

        /// Path to a practica.toml config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Write a practica.toml and initialize the database schema
    Init {
        /// Database connection string
        #[arg(short, long, default_value = "sqlite://practica.db")]
        database: String,

        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },

    /// Print row counts per entity
    Stats {
        /// Database connection string (overrides config and environment)
        #[arg(short, long)]
        database: Option<String>,
    },
}

/// CLI arg > config file > environment-derived settings.
fn resolve_database_url(
    cli_database: Option<String>,
    config: Option<&PracticaConfig>,
    settings: &Settings,
) -> String {
    cli_database
        .or_else(|| config.and_then(|c| c.database.clone()))
        .unwrap_or_else(|| settings.database_url.clone())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = config::load_settings_from_env()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_directives(cli.verbose)));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Serve {
            port,
            database,
            config: config_path,
        } => {
            let file_config = config::load_config(config_path.as_deref())?;
            let database_url = resolve_database_url(database, file_config.as_ref(), &settings);
            let port = port
                .or_else(|| file_config.and_then(|c| c.port))
                .unwrap_or(3000);

            tracing::info!("Opening store at {}", database_url);
            let store = Store::connect(&database_url)?;
            practica::server::start_server(port, store).await?;
        }

        Commands::Init { database, force } => {
            let config = PracticaConfig {
                database: Some(database.clone()),
                port: None,
            };
            config::write_config(&config::default_config_path(), &config, force)?;

            // Opening the store creates the schema.
            Store::connect(&database)?;
            println!("Initialized database at {}", database);
        }

        Commands::Stats { database } => {
            let file_config = config::load_config(None)?;
            let database_url = resolve_database_url(database, file_config.as_ref(), &settings);
            let mut store = Store::connect(&database_url)?;
            let stats = store.with_txn(|txn| txn.stats())?;
            println!("{}", stats);
        }
    }

    Ok(())
}
