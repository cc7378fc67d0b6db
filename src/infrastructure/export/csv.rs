//! CSV export of activation codes

use chrono::{DateTime, Utc};

use crate::domain::activation_code::ActivationCode;
use crate::domain::DomainError;

pub const CSV_HEADER: [&str; 9] = [
    "Code", "Name", "Status", "Uses", "Max Uses", "Created", "Expires", "Used By", "Used At",
];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Attachment name for an export taken at `now`
pub fn export_file_name(now: DateTime<Utc>) -> String {
    format!("activation_codes_{}.csv", now.format("%Y%m%d_%H%M%S"))
}

/// Render codes as CSV, classifying each against `now`
pub fn render_codes_csv(codes: &[ActivationCode], now: DateTime<Utc>) -> Result<Vec<u8>, DomainError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(CSV_HEADER)
        .map_err(|e| DomainError::internal(format!("Failed to write CSV header: {}", e)))?;

    for code in codes {
        let uses = code.uses_count.to_string();
        let max_uses = code.uses_allowed.to_string();
        let created = code.created_at.format(TIMESTAMP_FORMAT).to_string();
        let expires = code
            .expires_at
            .map(|at| at.format(DATE_FORMAT).to_string())
            .unwrap_or_else(|| "Never".to_string());
        let used_at = code
            .used_at
            .map(|at| at.format(TIMESTAMP_FORMAT).to_string())
            .unwrap_or_default();

        writer
            .write_record([
                code.code.as_str(),
                code.name.as_deref().unwrap_or(""),
                code.export_status(now).label(),
                &uses,
                &max_uses,
                &created,
                &expires,
                code.used_by.as_deref().unwrap_or(""),
                &used_at,
            ])
            .map_err(|e| DomainError::internal(format!("Failed to write CSV row: {}", e)))?;
    }

    writer
        .into_inner()
        .map_err(|e| DomainError::internal(format!("Failed to finish CSV export: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    use crate::domain::activation_code::{CodeId, NewActivationCode};

    fn created() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 1, 9, 30, 15).unwrap()
    }

    fn rows(bytes: Vec<u8>) -> Vec<Vec<String>> {
        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        reader
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn test_file_name() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 8, 5, 9).unwrap();
        assert_eq!(export_file_name(now), "activation_codes_20261019_080509.csv");
    }

    #[test]
    fn test_header_only_for_empty_export() {
        let bytes = render_codes_csv(&[], created()).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert_eq!(text, "Code,Name,Status,Uses,Max Uses,Created,Expires,Used By,Used At\n");
    }

    #[test]
    fn test_status_column() {
        let now = created() + Duration::days(5);

        let valid = NewActivationCode::new("VALID", created())
            .with_name(Some("Promo, Fall".into()))
            .into_code(CodeId::new(1));

        let mut used = NewActivationCode::new("USED", created()).into_code(CodeId::new(2));
        used.redeem(created() + Duration::hours(1), Some("bob")).unwrap();

        let mut inactive = NewActivationCode::new("OFF", created()).into_code(CodeId::new(3));
        inactive.toggle_active();

        let expired = NewActivationCode::new("OLD", created())
            .with_expiration(Some(created() + Duration::days(1)))
            .into_code(CodeId::new(4));

        let bytes = render_codes_csv(&[valid, used, inactive, expired], now).unwrap();
        let rows = rows(bytes);

        assert_eq!(rows[0][0], "VALID");
        assert_eq!(rows[0][1], "Promo, Fall");
        assert_eq!(rows[0][2], "Valid");
        assert_eq!(rows[0][5], "2026-10-01 09:30");
        assert_eq!(rows[0][6], "Never");
        assert_eq!(rows[0][8], "");

        assert_eq!(rows[1][2], "Used");
        assert_eq!(rows[1][3], "1");
        assert_eq!(rows[1][4], "1");
        assert_eq!(rows[1][7], "bob");
        assert_eq!(rows[1][8], "2026-10-01 10:30");

        assert_eq!(rows[2][2], "Inactive");

        assert_eq!(rows[3][2], "Inactive");
        assert_eq!(rows[3][6], "2026-10-02");
    }
}
