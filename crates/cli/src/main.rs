//! Interactive Studio CLI - database migrations and maintenance tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! studio-cli migrate
//!
//! # Copy the built-in templates into a shop's image table
//! studio-cli catalog sync --shop your-store.myshopify.com
//!
//! # Show whether a shop has a verified email connection
//! studio-cli connection status --shop-id 548380009
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `catalog sync` - Sync built-in SVG templates for a shop
//! - `connection status` - Inspect a shop's connection

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "studio-cli")]
#[command(author, version, about = "Interactive Studio CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage the image catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Inspect email connections
    Connection {
        #[command(subcommand)]
        action: ConnectionAction,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// Insert or refresh the built-in templates for a shop
    Sync {
        /// Shop domain (e.g., your-store.myshopify.com)
        #[arg(short, long)]
        shop: String,
    },
}

#[derive(Subcommand)]
enum ConnectionAction {
    /// Show the activated connection for a shop
    Status {
        /// Numeric shop id (tail of gid://shopify/Shop/<id>)
        #[arg(short = 'i', long)]
        shop_id: String,
    },
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
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Catalog { action } => match action {
            CatalogAction::Sync { shop } => {
                commands::catalog::sync(&shop).await?;
            }
        },
        Commands::Connection { action } => match action {
            ConnectionAction::Status { shop_id } => {
                commands::connection::status(&shop_id).await?;
            }
        },
    }
    Ok(())
}
