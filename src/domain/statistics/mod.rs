//! Derived statistics over the code store

use chrono::NaiveDate;
use serde::Serialize;

/// Headline counters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeStatistics {
    pub total: u64,
    pub used: u64,
    /// Active and not yet used up
    #[serde(rename = "active")]
    pub active_unused: u64,
    pub inactive: u64,
    pub generated_today: u64,
    pub used_today: u64,
    /// Percentage of used codes, one decimal
    pub usage_rate: f64,
}

/// Generated and redeemed counts for one calendar day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyActivity {
    /// Short label such as "Oct 19"
    pub label: String,
    pub date: NaiveDate,
    pub generated_count: u64,
    pub used_count: u64,
}

/// `used / total * 100` rounded to one decimal, 0 for an empty store
pub fn usage_rate(used: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }

    let rate = used as f64 / total as f64 * 100.0;
    (rate * 10.0).round() / 10.0
}

pub fn day_label(date: NaiveDate) -> String {
    date.format("%b %d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_rate_empty_store() {
        assert_eq!(usage_rate(0, 0), 0.0);
    }

    #[test]
    fn test_usage_rate_rounding() {
        assert_eq!(usage_rate(1, 3), 33.3);
        assert_eq!(usage_rate(2, 3), 66.7);
        assert_eq!(usage_rate(5, 5), 100.0);
        assert_eq!(usage_rate(0, 7), 0.0);
    }

    #[test]
    fn test_day_label() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(day_label(date), "Mar 07");
    }
}
