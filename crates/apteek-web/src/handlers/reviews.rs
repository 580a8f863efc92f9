use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::warn;

use apteek_core::{PageKey, PharmacyReview, ReviewPage};

use crate::dto::{CreatedReviewDto, ReviewBody, ReviewDto, ReviewPatchBody};
use crate::error::ApiError;
use crate::handlers::parse_id;
use crate::{token, AppState};

/// Keyset pager parameters; anything unparsable falls back to defaults.
#[derive(Debug, Deserialize, Default)]
pub struct PagerQuery {
    #[serde(default)]
    pub uk: String,
    #[serde(default)]
    pub k: String,
    #[serde(default)]
    pub l: String,
    #[serde(default)]
    pub desc: String,
}

impl PagerQuery {
    fn to_page(&self) -> ReviewPage {
        let mut page = ReviewPage::default();
        if let Ok(l) = self.l.parse() {
            page.limit = l;
        }
        if let Ok(desc) = self.desc.parse() {
            page.desc = desc;
        }

        let uk: i64 = self.uk.parse().unwrap_or(0);
        let k: i64 = self.k.parse().unwrap_or(0);
        if uk != 0 && k != 0 {
            if let Some(updated_at) = DateTime::<Utc>::from_timestamp_millis(k) {
                page.after = Some(PageKey { updated_at, id: uk });
            }
        }
        page
    }
}

/// GET /api/v1/pharmacies/{id}/reviews?uk=&k=&l=&desc=
pub async fn list_reviews(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(pager): Query<PagerQuery>,
) -> Result<Json<Vec<ReviewDto>>, ApiError> {
    let id = parse_id(&id, "ID")?;
    let reviews = state.reviews.list_for_pharmacy(id, pager.to_page()).await?;
    Ok(Json(reviews.into_iter().map(ReviewDto::from).collect()))
}

/// POST /api/v1/pharmacies/{id}/reviews
pub async fn create_review(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<ReviewBody>,
) -> Result<(StatusCode, Json<CreatedReviewDto>), ApiError> {
    let pharmacy_id = parse_id(&id, "ID")?;
    let content = body.validate()?;
    if !state.captcha.verify(&body.recaptcha_response).await {
        return Err(ApiError::CaptchaRejected);
    }

    let plaintext = token::generate();
    let now = Utc::now();
    let mut review = PharmacyReview {
        id: 0,
        pharmacy_id,
        prescription_type: content.prescription_type,
        stars: content.stars,
        hrt_kind: content.hrt_kind,
        nationality: content.nationality,
        review: content.review,
        created_at: now,
        updated_at: now,
        modification_code: token::hash(&plaintext),
    };
    state.reviews.create(&mut review).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedReviewDto {
            review: ReviewDto::from(review),
            mod_code: plaintext,
        }),
    ))
}

/// PATCH /api/v1/pharmacies/{id}/reviews/{review_id}
pub async fn patch_review(
    State(state): State<Arc<AppState>>,
    Path((id, review_id)): Path<(String, String)>,
    Json(body): Json<ReviewPatchBody>,
) -> Result<Json<ReviewDto>, ApiError> {
    let pharmacy_id = parse_id(&id, "pharmacy ID")?;
    let review_id = parse_id(&review_id, "review ID")?;
    let content = body.content.validate()?;

    let Some(mut review) = state.reviews.find(pharmacy_id, review_id).await? else {
        return Err(ApiError::NotFound);
    };
    if token::hash(&body.mod_code) != review.modification_code {
        warn!(review_id, "review modification attempted with a wrong token");
        return Err(ApiError::Forbidden("Invalid modification code".to_string()));
    }
    if !state.captcha.verify(&body.content.recaptcha_response).await {
        return Err(ApiError::CaptchaRejected);
    }

    review.prescription_type = content.prescription_type;
    review.stars = content.stars;
    review.hrt_kind = content.hrt_kind;
    review.nationality = content.nationality;
    review.review = content.review;
    review.updated_at = Utc::now();
    state.reviews.update(&review).await?;

    Ok(Json(ReviewDto::from(review)))
}

fn bearer_token(headers: &HeaderMap) -> String {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split_once(' '))
        .map(|(_, token)| token.trim().to_string())
        .unwrap_or_default()
}

/// DELETE /api/v1/pharmacies/{id}/reviews/{review_id}
///
/// The token travels as `Authorization: Bearer <token>` since DELETE
/// requests carry no body.
pub async fn delete_review(
    State(state): State<Arc<AppState>>,
    Path((id, review_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<ReviewDto>, ApiError> {
    let pharmacy_id = parse_id(&id, "pharmacy ID")?;
    let review_id = parse_id(&review_id, "review ID")?;

    let Some(review) = state.reviews.find(pharmacy_id, review_id).await? else {
        return Err(ApiError::NotFound);
    };
    if token::hash(&bearer_token(&headers)) != review.modification_code {
        warn!(review_id, "review deletion attempted with a wrong token");
        return Err(ApiError::Forbidden("Invalid modification code".to_string()));
    }

    let deleted = state.reviews.delete(review_id).await?.unwrap_or(review);
    Ok(Json(ReviewDto::from(deleted)))
}
