//! Request/response bodies for the review endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use apteek_core::{HrtKind, PharmacyReview, PrescriptionType};

use crate::error::ApiError;

pub const MAX_REVIEW_LENGTH: usize = 1024;

/// Content fields shared by review creation and modification.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewBody {
    pub prescription_type: String,
    pub stars: i32,
    pub hrt_kind: String,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default)]
    pub review: Option<String>,
    #[serde(rename = "__gRecaptchaResponse", default)]
    pub recaptcha_response: String,
}

/// Validated review content.
pub struct ReviewContent {
    pub prescription_type: PrescriptionType,
    pub stars: i32,
    pub hrt_kind: HrtKind,
    pub nationality: Option<String>,
    pub review: Option<String>,
}

impl ReviewBody {
    pub fn validate(&self) -> Result<ReviewContent, ApiError> {
        let prescription_type = self
            .prescription_type
            .parse()
            .map_err(|_| ApiError::bad_request("Unknown prescription type"))?;
        let hrt_kind = self
            .hrt_kind
            .parse()
            .map_err(|_| ApiError::bad_request("Unknown HRT kind"))?;

        if !(1..=5).contains(&self.stars) {
            return Err(ApiError::bad_request("Stars must be between 1 and 5"));
        }
        if let Some(nationality) = &self.nationality {
            if nationality.len() != 2 || !nationality.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(ApiError::bad_request(
                    "Nationality must be a two-letter country code",
                ));
            }
        }
        if let Some(review) = &self.review {
            if review.len() > MAX_REVIEW_LENGTH {
                return Err(ApiError::bad_request("Review text is too long"));
            }
        }

        Ok(ReviewContent {
            prescription_type,
            stars: self.stars,
            hrt_kind,
            nationality: self.nationality.clone(),
            review: self.review.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ReviewPatchBody {
    #[serde(flatten)]
    pub content: ReviewBody,
    #[serde(rename = "modCode")]
    pub mod_code: String,
}

/// Review as served to clients; never carries the token hash.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDto {
    pub id: i64,
    pub prescription_type: PrescriptionType,
    pub stars: i32,
    pub hrt_kind: HrtKind,
    pub nationality: Option<String>,
    pub review: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl From<PharmacyReview> for ReviewDto {
    fn from(review: PharmacyReview) -> Self {
        Self {
            id: review.id,
            prescription_type: review.prescription_type,
            stars: review.stars,
            hrt_kind: review.hrt_kind,
            nationality: review.nationality,
            review: review.review,
            created_at: review.created_at,
            updated_at: review.updated_at,
        }
    }
}

/// Creation response: the review plus the one-time plaintext token.
#[derive(Debug, Serialize)]
pub struct CreatedReviewDto {
    #[serde(flatten)]
    pub review: ReviewDto,
    #[serde(rename = "modCode")]
    pub mod_code: String,
}
