use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::meal_type::MealType;
use super::nutrition::NutritionPayload;

/// A logged meal: the authoritative local record of something eaten.
///
/// `id` is assigned by the backend, is unique for the lifetime of the local
/// store, and is never reused after deletion. It is the sole handle for
/// update, delete, and external-ledger addressing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealRecord {
    pub id: i64,
    pub date: NaiveDate,
    pub meal_type: MealType,
    pub analysis: NutritionPayload,
    pub image_base64: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl fmt::Display for MealRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = &self.analysis.total;
        write!(
            f,
            "#{} {} {} - {:.0} kcal (P {:.0}g / C {:.0}g / F {:.0}g)",
            self.id, self.date, self.meal_type, total.calories, total.protein, total.carbs,
            total.fats
        )?;
        if !self.analysis.description.is_empty() {
            write!(f, " - {}", self.analysis.description)?;
        }
        Ok(())
    }
}
