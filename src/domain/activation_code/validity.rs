//! Validity classification and redemption outcomes

use serde::Serialize;

use super::entity::ActivationCode;

/// Eligibility of a code for redemption
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Validity {
    Valid,
    Deactivated,
    Exhausted,
    Expired,
}

impl Validity {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Short machine-facing reason
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Deactivated => "deactivated",
            Self::Exhausted => "maximum uses reached",
            Self::Expired => "expired",
        }
    }

    /// Human-readable message shown to callers
    pub fn message(&self) -> &'static str {
        match self {
            Self::Valid => "Code is valid",
            Self::Deactivated => "Code is deactivated",
            Self::Exhausted => "Code has reached maximum uses",
            Self::Expired => "Code has expired",
        }
    }
}

impl std::fmt::Display for Validity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reason())
    }
}

/// Status column of the CSV export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStatus {
    Valid,
    Used,
    Inactive,
}

impl ExportStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Valid => "Valid",
            Self::Used => "Used",
            Self::Inactive => "Inactive",
        }
    }
}

/// Outcome of a redemption attempt
#[derive(Debug, Clone, PartialEq)]
pub enum Redemption {
    /// No code matched the normalized input
    NotFound,
    /// The code exists but is not currently redeemable
    Rejected {
        code: ActivationCode,
        reason: Validity,
    },
    /// One use was consumed; carries the updated snapshot
    Redeemed(ActivationCode),
}

impl Redemption {
    pub fn is_redeemed(&self) -> bool {
        matches!(self, Self::Redeemed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reasons() {
        assert_eq!(Validity::Valid.reason(), "valid");
        assert_eq!(Validity::Deactivated.reason(), "deactivated");
        assert_eq!(Validity::Exhausted.reason(), "maximum uses reached");
        assert_eq!(Validity::Expired.reason(), "expired");
    }

    #[test]
    fn test_messages() {
        assert_eq!(Validity::Exhausted.message(), "Code has reached maximum uses");
        assert_eq!(Validity::Expired.to_string(), "expired");
    }

    #[test]
    fn test_export_labels() {
        assert_eq!(ExportStatus::Valid.label(), "Valid");
        assert_eq!(ExportStatus::Used.label(), "Used");
        assert_eq!(ExportStatus::Inactive.label(), "Inactive");
    }
}
