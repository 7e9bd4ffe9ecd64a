use clap::{Args, Subcommand};

use super::parse_date;
use crate::config::Config;
use crate::db::Database;
use crate::health::HealthSync;

#[derive(Args)]
pub struct WaterCommand {
    #[command(subcommand)]
    pub command: WaterSubcommand,
}

#[derive(Subcommand)]
pub enum WaterSubcommand {
    /// Log a water intake
    Add {
        /// Amount in milliliters
        amount: i64,

        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<String>,
    },

    /// List water logs for a date
    List {
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<String>,
    },

    /// Delete a water log
    Delete {
        /// Water log id
        id: i64,
    },
}

impl WaterCommand {
    pub async fn run(
        &self,
        db: &Database,
        health: &HealthSync,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            WaterSubcommand::Add { amount, date } => {
                if *amount <= 0 {
                    return Err("Amount must be a positive number of milliliters".into());
                }
                let date = parse_date(date.as_deref())?;

                let id = db.water.add(date, *amount).await?;
                println!("Logged {} ml (#{})", amount, id);

                if config.health_sync {
                    if let Some(log) = db
                        .water
                        .list_by_date(date)
                        .await?
                        .into_iter()
                        .find(|w| w.id == id)
                    {
                        health.sync_water(log.id, log.amount, log.timestamp).await;
                    }
                }
                Ok(())
            }
            WaterSubcommand::List { date } => {
                let date = parse_date(date.as_deref())?;
                let logs = db.water.list_by_date(date).await?;
                if logs.is_empty() {
                    println!("No water logged for {}", date);
                }
                let total: i64 = logs.iter().map(|w| w.amount).sum();
                for log in &logs {
                    println!("{}", log);
                }
                if total > 0 {
                    println!("Total: {} ml", total);
                }
                Ok(())
            }
            WaterSubcommand::Delete { id } => {
                db.water.delete(*id).await?;
                println!("Deleted water log #{}", id);

                if config.health_sync {
                    health.delete_water(*id).await;
                }
                Ok(())
            }
        }
    }
}
