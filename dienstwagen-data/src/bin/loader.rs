use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use dienstwagen_data::VehicleLoader;
use dienstwagen_db_sqlite::SqliteRepository;
use tracing_subscriber::EnvFilter;

/// Load company car offers from a CSV file into the database.
///
/// The CSV file should have the following columns:
/// - name: display name of the offer
/// - list_price: gross list price in euros
/// - taxation: full, hybrid or electric
/// - co_payment_type: none, fixed, percentage, or empty for the default
/// - percentage, threshold: for percentage co-payments
/// - fixed_amount: for fixed co-payments
/// - configurator_code, configurator_link: optional
#[derive(Parser, Debug)]
#[command(name = "dienstwagen-loader")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the CSV file containing vehicle data
    #[arg(short, long)]
    file: PathBuf,

    /// SQLite database file or URL; created if missing
    #[arg(short, long, default_value = "dienstwagen.db")]
    database: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .without_time()
        .with_target(false)
        .init();

    let args = Args::parse();

    let repo = SqliteRepository::new(&args.database)
        .await
        .with_context(|| format!("Failed to connect to database: {}", args.database))?;
    repo.run_migrations()
        .await
        .context("Failed to run migrations")?;

    println!("Loading vehicles from: {}", args.file.display());

    let file = File::open(&args.file)
        .with_context(|| format!("Failed to open: {}", args.file.display()))?;

    let records = VehicleLoader::parse(file)
        .with_context(|| format!("Failed to parse CSV: {}", args.file.display()))?;

    println!("Parsed {} records from CSV", records.len());

    let loaded = VehicleLoader::load(&repo, &records)
        .await
        .context("Failed to load vehicles into database")?;

    println!("Successfully loaded {loaded} vehicles into the database.");

    Ok(())
}
