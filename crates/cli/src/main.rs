//! Carrito CLI - session migrations and backend checks.
//!
//! # Usage
//!
//! ```bash
//! # Create the sessions table used by persistent sessions
//! carrito-cli migrate sessions
//!
//! # Fetch and print the backend catalog
//! carrito-cli catalog list
//!
//! # Print the sales report summary
//! carrito-cli sales summary
//! ```
//!
//! # Commands
//!
//! - `migrate` - Create database tables
//! - `catalog list` - Check the backend is reachable and its products map
//! - `sales summary` - Totals of the seeded sales series

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "carrito-cli")]
#[command(author, version, about = "Carrito storefront CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        target: MigrateTarget,
    },
    /// Inspect the backend catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Sales report tools
    Sales {
        #[command(subcommand)]
        action: SalesAction,
    },
}

#[derive(Subcommand)]
enum MigrateTarget {
    /// Create the tower-sessions table
    Sessions,
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List products as the storefront sees them
    List,
}

#[derive(Subcommand)]
enum SalesAction {
    /// Print total, average, best month and per-year totals
    Summary,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate { target } => match target {
            MigrateTarget::Sessions => commands::migrate::sessions().await?,
        },
        Commands::Catalog { action } => match action {
            CatalogAction::List => commands::catalog::list().await?,
        },
        Commands::Sales { action } => match action {
            SalesAction::Summary => commands::sales::summary(),
        },
    }
    Ok(())
}
