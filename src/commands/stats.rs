use chrono::{Duration, Local};
use clap::Args;

use super::parse_date;
use crate::db::{daily_totals, Database};

/// Daily nutrition totals over a date range.
#[derive(Args)]
pub struct StatsCommand {
    /// Start date (YYYY-MM-DD), defaults to 7 days ago
    #[arg(long)]
    pub from: Option<String>,

    /// End date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    pub to: Option<String>,
}

impl StatsCommand {
    pub async fn run(&self, db: &Database) -> Result<(), Box<dyn std::error::Error>> {
        let to = parse_date(self.to.as_deref())?;
        let from = match &self.from {
            Some(s) => parse_date(Some(s))?,
            None => Local::now().date_naive() - Duration::days(7),
        };
        if from > to {
            return Err(format!("Start date {} is after end date {}", from, to).into());
        }

        let totals = daily_totals(&db.meals, from, to).await?;

        println!(
            "{:<12} {:>9} {:>9} {:>9} {:>9} {:>9}",
            "date", "kcal", "protein", "carbs", "fats", "water"
        );

        // The engine only reports days that have meals; gaps are zero.
        let mut cursor = from;
        while cursor <= to {
            let day = totals.get(&cursor).copied().unwrap_or_default();
            let water: i64 = db
                .water
                .list_by_date(cursor)
                .await?
                .iter()
                .map(|w| w.amount)
                .sum();
            println!(
                "{:<12} {:>9.0} {:>8.0}g {:>8.0}g {:>8.0}g {:>7}ml",
                cursor, day.calories, day.protein, day.carbs, day.fats, water
            );
            cursor = cursor.succ_opt().ok_or("date range overflow")?;
        }
        Ok(())
    }
}
