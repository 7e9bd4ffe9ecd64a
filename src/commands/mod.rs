mod config_cmd;
mod meal;
mod stats;
mod water;

pub use config_cmd::ConfigCommand;
pub use meal::MealCommand;
pub use stats::StatsCommand;
pub use water::WaterCommand;

use chrono::{Local, NaiveDate};

/// Parses a `YYYY-MM-DD` argument, defaulting to today.
fn parse_date(arg: Option<&str>) -> Result<NaiveDate, String> {
    match arg {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| format!("Invalid date '{}'. Expected YYYY-MM-DD", s)),
        None => Ok(Local::now().date_naive()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date(Some("2025-03-10")).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
        );
        assert!(parse_date(Some("03/10/2025")).is_err());
        assert_eq!(parse_date(None).unwrap(), Local::now().date_naive());
    }
}
