//! Finding status for checklist rules

use super::error::CommentLogError;

/// Review status of a single checklist rule
///
/// Parsed from the raw status code stored in either container format.
/// Unrecognised codes are rejected rather than defaulted to `Open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FindingStatus {
    /// The rule is not satisfied
    Open,
    /// The rule is satisfied
    NotAFinding,
    /// The rule does not apply to the target
    NotApplicable,
    /// The rule has not been evaluated yet
    NotReviewed,
}

impl FindingStatus {
    /// All statuses in checklist display order
    pub const ALL: [FindingStatus; 4] = [
        Self::Open,
        Self::NotAFinding,
        Self::NotApplicable,
        Self::NotReviewed,
    ];

    /// Parse a raw status code from a `.ckl` or `.cklb` record
    ///
    /// Accepts `Open`, `NotAFinding`, `Not_Applicable`, `Not_Reviewed` (XML)
    /// and `open`, `not_a_finding`, `not_applicable`, `not_reviewed` (JSON).
    pub fn from_raw(raw: &str) -> Result<Self, CommentLogError> {
        match raw {
            "Open" | "open" => Ok(Self::Open),
            "NotAFinding" | "not_a_finding" => Ok(Self::NotAFinding),
            "Not_Applicable" | "not_applicable" => Ok(Self::NotApplicable),
            "Not_Reviewed" | "not_reviewed" => Ok(Self::NotReviewed),
            other => Err(CommentLogError::invalid_status(other)),
        }
    }

    /// Label used in finding statements (e.g. "NOT A FINDING")
    pub fn label(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::NotAFinding => "NOT A FINDING",
            Self::NotApplicable => "NOT APPLICABLE",
            Self::NotReviewed => "NOT REVIEWED",
        }
    }

    /// Raw code as written in `.ckl` files
    pub fn ckl_code(&self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::NotAFinding => "NotAFinding",
            Self::NotApplicable => "Not_Applicable",
            Self::NotReviewed => "Not_Reviewed",
        }
    }

    /// Raw code as written in `.cklb` files
    pub fn cklb_code(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::NotAFinding => "not_a_finding",
            Self::NotApplicable => "not_applicable",
            Self::NotReviewed => "not_reviewed",
        }
    }
}

impl std::fmt::Display for FindingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for FindingStatus {
    type Err = CommentLogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_raw(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ckl_codes() {
        assert_eq!(FindingStatus::from_raw("Open").unwrap(), FindingStatus::Open);
        assert_eq!(
            FindingStatus::from_raw("NotAFinding").unwrap(),
            FindingStatus::NotAFinding
        );
        assert_eq!(
            FindingStatus::from_raw("Not_Applicable").unwrap(),
            FindingStatus::NotApplicable
        );
        assert_eq!(
            FindingStatus::from_raw("Not_Reviewed").unwrap(),
            FindingStatus::NotReviewed
        );
    }

    #[test]
    fn test_parse_cklb_codes() {
        assert_eq!(FindingStatus::from_raw("open").unwrap(), FindingStatus::Open);
        assert_eq!(
            FindingStatus::from_raw("not_a_finding").unwrap(),
            FindingStatus::NotAFinding
        );
        assert_eq!(
            FindingStatus::from_raw("not_applicable").unwrap(),
            FindingStatus::NotApplicable
        );
        assert_eq!(
            FindingStatus::from_raw("not_reviewed").unwrap(),
            FindingStatus::NotReviewed
        );
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        for raw in ["", "OPEN", "closed", "Not Applicable", "not_a_finding "] {
            let err = FindingStatus::from_raw(raw).unwrap_err();
            assert!(
                matches!(err, CommentLogError::InvalidStatus { ref raw_status } if raw_status == raw),
                "expected InvalidStatus for {:?}, got {:?}",
                raw,
                err
            );
        }
    }

    #[test]
    fn test_codes_round_trip() {
        for status in FindingStatus::ALL {
            assert_eq!(FindingStatus::from_raw(status.ckl_code()).unwrap(), status);
            assert_eq!(FindingStatus::from_raw(status.cklb_code()).unwrap(), status);
        }
    }

    #[test]
    fn test_labels() {
        assert_eq!(FindingStatus::Open.label(), "OPEN");
        assert_eq!(FindingStatus::NotAFinding.to_string(), "NOT A FINDING");
        assert_eq!(FindingStatus::NotApplicable.label(), "NOT APPLICABLE");
        assert_eq!(FindingStatus::NotReviewed.label(), "NOT REVIEWED");
    }
}
