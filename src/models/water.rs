use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single water-intake entry. `amount` is a volume in milliliters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterLog {
    pub id: i64,
    pub date: NaiveDate,
    pub amount: i64,
    pub timestamp: DateTime<Utc>,
}

impl fmt::Display for WaterLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {} - {} ml", self.id, self.date, self.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let log = WaterLog {
            id: 3,
            date: NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
            amount: 250,
            timestamp: Utc::now(),
        };
        assert_eq!(format!("{}", log), "#3 2025-02-01 - 250 ml");
    }
}
