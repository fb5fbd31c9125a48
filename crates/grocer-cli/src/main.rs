mod discover;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "grocer-cli")]
#[command(about = "Grocery store and product discovery from the command line")]
struct Cli {
    /// Print compact JSON instead of pretty-printed output
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Discover grocery stores near a location
    Stores {
        /// City and state ("Chicago, IL") or a ZIP code
        location: String,
        /// Only keep these store ids (comma-separated, e.g. "target,aldi")
        #[arg(long, value_delimiter = ',')]
        chains: Vec<String>,
    },
    /// Search a store's products
    Products {
        /// What to look for, e.g. "oat milk"
        query: String,
        /// Store name, e.g. "Target"
        #[arg(long = "store")]
        store_name: String,
        /// City and state or ZIP code of the store
        #[arg(long)]
        location: String,
    },
    /// Show a store's address, phone, hours, services, and departments
    Details {
        /// Store name, e.g. "Whole Foods Market"
        store_name: String,
        /// City and state or ZIP code of the store
        #[arg(long)]
        location: String,
    },
    /// Compare a product across several stores
    Aggregate {
        /// What to look for, e.g. "oat milk"
        query: String,
        /// City and state or ZIP code to search in
        #[arg(long)]
        location: String,
        /// Store names to search (comma-separated); defaults to stores near
        /// the location
        #[arg(long, value_delimiter = ',')]
        stores: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = grocer_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    // stdout carries the JSON result only.
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let discovery = discover::build_discovery(&config)?;
    let output = match cli.command {
        Commands::Stores { location, chains } => {
            discover::run_stores(&discovery, &location, &chains, cli.compact).await?
        }
        Commands::Products {
            query,
            store_name,
            location,
        } => {
            discover::run_products(&discovery, &query, &store_name, &location, cli.compact).await?
        }
        Commands::Details {
            store_name,
            location,
        } => discover::run_details(&discovery, &store_name, &location, cli.compact).await?,
        Commands::Aggregate {
            query,
            location,
            stores,
        } => discover::run_aggregate(&discovery, &query, &location, &stores, cli.compact).await?,
    };
    println!("{output}");

    Ok(())
}

#[cfg(test)]
mod tests;
