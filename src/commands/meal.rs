use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::{Args, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use std::str::FromStr;

use super::parse_date;
use crate::analysis::parse_model_response;
use crate::config::Config;
use crate::db::Database;
use crate::health::HealthSync;
use crate::models::{MealType, NutritionPayload};

#[derive(Args)]
pub struct MealCommand {
    #[command(subcommand)]
    pub command: MealSubcommand,
}

#[derive(Subcommand)]
pub enum MealSubcommand {
    /// Log a meal from an analysis payload
    Add {
        /// Meal type (breakfast, lunch, dinner, snack)
        #[arg(long = "type", short = 't', value_name = "TYPE")]
        meal_type: String,

        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<String>,

        /// Analysis payload JSON file, or '-' for stdin
        #[arg(long, short)]
        analysis: PathBuf,

        /// Attach a photo of the meal
        #[arg(long)]
        image: Option<PathBuf>,
    },

    /// List meals for a date
    List {
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<String>,
    },

    /// Replace the analysis of a logged meal
    Refine {
        /// Meal id
        id: i64,

        /// Corrected analysis payload JSON file, or '-' for stdin
        #[arg(long, short)]
        analysis: PathBuf,
    },

    /// Delete a meal
    Delete {
        /// Meal id
        id: i64,
    },
}

impl MealCommand {
    pub async fn run(
        &self,
        db: &Database,
        health: &HealthSync,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            MealSubcommand::Add {
                meal_type,
                date,
                analysis,
                image,
            } => {
                let date = parse_date(date.as_deref())?;
                let meal_type = MealType::from_str(meal_type)?;
                let payload = read_payload(analysis)?;
                let image_base64 = match image {
                    Some(path) => Some(STANDARD.encode(std::fs::read(path)?)),
                    None => None,
                };

                // Local write first; the external mirror is best-effort.
                let id = db.meals.add(date, meal_type, &payload, image_base64).await?;
                println!("Logged meal #{} ({} {})", id, date, meal_type);

                if config.health_sync {
                    sync_by_id(db, health, id).await?;
                }
                Ok(())
            }
            MealSubcommand::List { date } => {
                let date = parse_date(date.as_deref())?;
                let meals = db.meals.list_by_date(date).await?;
                if meals.is_empty() {
                    println!("No meals logged for {}", date);
                }
                for meal in meals {
                    println!("{}", meal);
                }
                Ok(())
            }
            MealSubcommand::Refine { id, analysis } => {
                let payload = read_payload(analysis)?;
                db.meals.update_analysis(*id, &payload).await?;
                println!("Updated analysis for meal #{}", id);

                if config.health_sync {
                    // Re-sync through the same client id: upsert, not duplicate.
                    sync_by_id(db, health, *id).await?;
                }
                Ok(())
            }
            MealSubcommand::Delete { id } => {
                db.meals.delete(*id).await?;
                println!("Deleted meal #{}", id);

                if config.health_sync {
                    health.delete_meal(*id).await;
                }
                Ok(())
            }
        }
    }
}

async fn sync_by_id(
    db: &Database,
    health: &HealthSync,
    id: i64,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(meal) = db.meals.get_by_id(id).await? {
        health.sync_meal(&meal).await;
    }
    Ok(())
}

fn read_payload(path: &PathBuf) -> Result<NutritionPayload, Box<dyn std::error::Error>> {
    let contents = if path.to_string_lossy() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path)?
    };
    Ok(parse_model_response(&contents)?)
}
