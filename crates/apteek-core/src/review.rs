use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where the reviewed prescription was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrescriptionType {
    Imago,
    GenderGP,
    National,
}

impl PrescriptionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrescriptionType::Imago => "Imago",
            PrescriptionType::GenderGP => "GenderGP",
            PrescriptionType::National => "National",
        }
    }
}

impl fmt::Display for PrescriptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrescriptionType {
    type Err = InvalidReviewField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Imago" => Ok(PrescriptionType::Imago),
            "GenderGP" => Ok(PrescriptionType::GenderGP),
            "National" => Ok(PrescriptionType::National),
            other => Err(InvalidReviewField {
                field: "prescriptionType",
                value: other.to_string(),
            }),
        }
    }
}

/// Which kind of hormone therapy the review concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HrtKind {
    #[serde(rename = "e")]
    Estrogen,
    #[serde(rename = "t")]
    Testosterone,
}

impl HrtKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HrtKind::Estrogen => "e",
            HrtKind::Testosterone => "t",
        }
    }
}

impl fmt::Display for HrtKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HrtKind {
    type Err = InvalidReviewField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "e" => Ok(HrtKind::Estrogen),
            "t" => Ok(HrtKind::Testosterone),
            other => Err(InvalidReviewField {
                field: "hrtKind",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid value {value:?} for review field {field}")]
pub struct InvalidReviewField {
    pub field: &'static str,
    pub value: String,
}

/// A user-submitted pharmacy review.
///
/// `modification_code` holds the hex SHA-256 of the secret token issued to
/// the submitter; the plaintext is returned exactly once on creation and is
/// required for later edits and deletion. The hash is never serialized.
/// Timestamps serialize as UNIX milliseconds on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PharmacyReview {
    pub id: i64,
    pub pharmacy_id: i64,
    pub prescription_type: PrescriptionType,
    pub stars: i32,
    pub hrt_kind: HrtKind,
    pub nationality: Option<String>,
    pub review: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub modification_code: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn review_json_uses_millis_and_hides_token_hash() {
        let review = PharmacyReview {
            id: 3,
            pharmacy_id: 12,
            prescription_type: PrescriptionType::National,
            stars: 4,
            hrt_kind: HrtKind::Estrogen,
            nationality: Some("EE".to_string()),
            review: None,
            created_at: Utc.with_ymd_and_hms(2025, 7, 2, 8, 36, 31).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2025, 7, 2, 8, 36, 31).unwrap(),
            modification_code: "deadbeef".to_string(),
        };

        let json = serde_json::to_value(&review).unwrap();
        assert_eq!(json["prescriptionType"], "National");
        assert_eq!(json["hrtKind"], "e");
        assert_eq!(json["createdAt"], 1751445391000i64);
        assert!(json.get("modificationCode").is_none());
    }
}
