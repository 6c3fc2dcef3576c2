//! Binary entry point for sqlkv.
//!
//! This binary provides an admin CLI over the dialect strategies.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlkv::cli::{self, CreateOutcome};
use sqlkv::models::BackendType;
use sqlkv::observability::{self, LoggingConfig};
use sqlkv::services::BackendFactory;
use sqlkv::storage::StorageConfiguration;
use std::path::PathBuf;
use std::process::ExitCode;

/// sqlkv - relational backends for a versioned key-value engine.
#[derive(Parser)]
#[command(name = "sqlkv")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true, env = "SQLKV_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Check whether a store's table exists.
    Exists {
        /// Store (table) name.
        store: String,
    },

    /// Create a store's table.
    Create {
        /// Store (table) name.
        store: String,

        /// Do nothing if the table already exists.
        #[arg(long)]
        if_missing: bool,
    },

    /// Drop a store's table.
    Drop {
        /// Store (table) name.
        store: String,
    },

    /// Print the DDL for a store without connecting.
    Ddl {
        /// Store (table) name.
        store: String,

        /// Dialect: mysql, postgres, or sqlite.
        #[arg(short, long, value_parser = parse_driver)]
        driver: BackendType,
    },

    /// Classify a driver error as duplicate-key or other.
    Classify {
        /// Dialect: mysql, postgres, or sqlite.
        #[arg(short, long, value_parser = parse_driver)]
        driver: BackendType,

        /// Vendor error code.
        #[arg(long, allow_negative_numbers = true)]
        vendor_code: Option<i32>,

        /// Five-character SQLSTATE.
        #[arg(long)]
        sql_state: Option<String>,
    },
}

/// Main entry point.
fn main() -> ExitCode {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if let Err(e) = observability::init_logging(LoggingConfig::from_env(cli.verbose)) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Ddl { store, driver } => {
            println!("{}", cli::ddl(driver, &store));
            Ok(())
        },
        Commands::Classify {
            driver,
            vendor_code,
            sql_state,
        } => {
            println!(
                "{}",
                cli::classify(driver, vendor_code, sql_state.as_deref())
            );
            Ok(())
        },
        Commands::Exists { store } => with_backend(cli.config, |backend| {
            println!("{}", cli::exists(backend, &store)?);
            Ok(())
        }),
        Commands::Create { store, if_missing } => with_backend(cli.config, |backend| {
            match cli::create(backend, &store, if_missing)? {
                CreateOutcome::Created => println!("Created table '{store}'"),
                CreateOutcome::AlreadyExists => println!("Table '{store}' already exists"),
            }
            Ok(())
        }),
        Commands::Drop { store } => with_backend(cli.config, |backend| {
            cli::drop_store(backend, &store)?;
            println!("Dropped table '{store}'");
            Ok(())
        }),
    }
}

/// Constructs the configured backend, runs `f`, then closes the backend.
///
/// The command's error wins over a close error.
fn with_backend(
    config_path: Option<PathBuf>,
    f: impl FnOnce(&dyn StorageConfiguration) -> sqlkv::Result<()>,
) -> anyhow::Result<()> {
    let config = cli::load_config(config_path.as_deref()).context("loading configuration")?;
    let backend = BackendFactory::construct(&config)
        .with_context(|| format!("constructing {} backend", config.driver))?;

    let result = f(backend.as_ref());
    let closed = backend.close();
    result?;
    closed.context("closing backend")?;
    Ok(())
}

fn parse_driver(value: &str) -> Result<BackendType, String> {
    BackendType::parse(value).ok_or_else(|| format!("unknown driver '{value}'"))
}
