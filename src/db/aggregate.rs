//! Per-day nutrition totals over a date range, for analytics views.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use super::error::StorageError;
use super::MealRepository;

/// Summed macro totals for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DailyTotals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
}

/// Sums `analysis.total` per date over the inclusive range in one pass.
///
/// Only dates that have at least one meal appear in the result; the caller
/// materializes the full date sequence and substitutes
/// [`DailyTotals::default`] for the gaps. Missing numeric fields contribute
/// zero, never an error.
pub async fn daily_totals(
    meals: &MealRepository,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<BTreeMap<NaiveDate, DailyTotals>, StorageError> {
    let records = meals.list_range(from, to).await?;

    let mut totals: BTreeMap<NaiveDate, DailyTotals> = BTreeMap::new();
    for record in records {
        let entry = totals.entry(record.date).or_default();
        let total = &record.analysis.total;
        entry.calories += total.calories;
        entry.protein += total.protein;
        entry.carbs += total.carbs;
        entry.fats += total.fats;
    }
    Ok(totals)
}
