use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use macroscope::commands::{ConfigCommand, MealCommand, StatsCommand, WaterCommand};
use macroscope::config::Config;
use macroscope::db::Database;
use macroscope::health::{HealthSync, UnsupportedProvider};

#[derive(Parser)]
#[command(name = "macroscope")]
#[command(version)]
#[command(about = "Meal and hydration logging with health-ledger sync", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log and manage meals
    Meal(MealCommand),

    /// Log and manage water intake
    Water(WaterCommand),

    /// Daily nutrition totals
    Stats(StatsCommand),

    /// Manage settings and configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::load(cli.config)?;

    // Desktop builds have no platform health ledger; the synchronizer
    // sees Unavailable and skips every mirror write.
    let health = HealthSync::new(Arc::new(UnsupportedProvider));

    match cli.command {
        Some(Commands::Meal(cmd)) => {
            let db = Database::open(&config).await?;
            cmd.run(&db, &health, &config).await?;
        }
        Some(Commands::Water(cmd)) => {
            let db = Database::open(&config).await?;
            cmd.run(&db, &health, &config).await?;
        }
        Some(Commands::Stats(cmd)) => {
            let db = Database::open(&config).await?;
            cmd.run(&db).await?;
        }
        Some(Commands::Config(cmd)) => {
            let db = Database::open(&config).await?;
            cmd.run(&db, &config).await?;
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}
