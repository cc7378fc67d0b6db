//! Lenient parameter parsing for form, query and JSON inputs
//!
//! Numeric inputs never fail a request: blank or malformed values fall back
//! to the default, and the result is clamped to the bounds.

use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value};

/// Default and inclusive bounds for an integer parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntParam {
    pub default: i64,
    pub min: i64,
    pub max: i64,
}

impl IntParam {
    pub const fn new(default: i64, min: i64, max: i64) -> Self {
        Self { default, min, max }
    }

    fn clamp(&self, value: i64) -> i64 {
        value.max(self.min).min(self.max)
    }

    /// Parse a form or query string; "0" is a value and gets clamped
    pub fn parse_text(&self, raw: Option<&str>) -> i64 {
        let parsed = raw
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(self.default);

        self.clamp(parsed)
    }

    /// Parse a JSON field; numbers truncate, numeric strings parse
    pub fn parse_json(&self, raw: Option<&Value>) -> i64 {
        let parsed = match raw {
            Some(Value::Bool(true)) => Some(1),
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
            Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
            _ => None,
        };

        self.clamp(parsed.filter(|n| *n != 0).unwrap_or(self.default))
    }
}

pub const COUNT: IntParam = IntParam::new(1, 1, 100);
pub const USES_ALLOWED: IntParam = IntParam::new(1, 1, 1000);
pub const EXPIRES_DAYS: IntParam = IntParam::new(0, 0, 365);
pub const SEARCH_LIMIT: IntParam = IntParam::new(20, 1, 100);
pub const PAGE: IntParam = IntParam::new(1, 1, i32::MAX as i64);

/// Text value of a JSON field; absent and null read as empty
pub fn json_text(object: &Map<String, Value>, field: &str) -> String {
    match object.get(field) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string(),
    }
}

/// Non-blank trimmed text, or None
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Expiry from a day count; zero days or an overflow means no expiry
pub fn expiry_after_days(now: DateTime<Utc>, days: i64) -> Option<DateTime<Utc>> {
    if days <= 0 {
        return None;
    }

    Duration::try_days(days).and_then(|d| now.checked_add_signed(d))
}

/// Expiry from the form field: any all-digit string, including "0", is a
/// day offset from `now`; anything else means no expiry
pub fn form_expiry(now: DateTime<Utc>, raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?;

    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let days = raw.parse::<i64>().ok()?;
    Duration::try_days(days).and_then(|d| now.checked_add_signed(d))
}
