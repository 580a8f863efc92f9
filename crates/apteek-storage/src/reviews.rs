use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use apteek_core::{PharmacyReview, ReviewPage, ReviewStore, StoreError};

#[derive(Clone)]
pub struct PgReviewStore {
    pool: PgPool,
}

impl PgReviewStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const REVIEW_COLUMNS: &str = "id, pharmacy_id, prescription_type, stars, hrt_kind, \
     nationality, review, created_at, updated_at, modification_code";

fn review_from_row(row: &PgRow) -> Result<PharmacyReview, StoreError> {
    let prescription_type: String = row
        .try_get("prescription_type")
        .map_err(StoreError::decode)?;
    let hrt_kind: String = row.try_get("hrt_kind").map_err(StoreError::decode)?;
    Ok(PharmacyReview {
        id: row.try_get("id").map_err(StoreError::decode)?,
        pharmacy_id: row.try_get("pharmacy_id").map_err(StoreError::decode)?,
        prescription_type: prescription_type.parse().map_err(StoreError::decode)?,
        stars: row.try_get("stars").map_err(StoreError::decode)?,
        hrt_kind: hrt_kind.parse().map_err(StoreError::decode)?,
        nationality: row.try_get("nationality").map_err(StoreError::decode)?,
        review: row.try_get("review").map_err(StoreError::decode)?,
        created_at: row.try_get("created_at").map_err(StoreError::decode)?,
        updated_at: row.try_get("updated_at").map_err(StoreError::decode)?,
        modification_code: row
            .try_get("modification_code")
            .map_err(StoreError::decode)?,
    })
}

#[async_trait]
impl ReviewStore for PgReviewStore {
    async fn list_for_pharmacy(
        &self,
        pharmacy_id: i64,
        page: ReviewPage,
    ) -> Result<Vec<PharmacyReview>, StoreError> {
        // keyset paging over (updated_at, id); the tuple comparison flips
        // with the requested direction
        let rows = match page.after {
            None => {
                let sql = if page.desc {
                    format!(
                        r#"
                        SELECT {REVIEW_COLUMNS}
                          FROM pharmacy_reviews
                         WHERE pharmacy_id = $1
                         ORDER BY updated_at DESC, id DESC
                         LIMIT $2
                        "#
                    )
                } else {
                    format!(
                        r#"
                        SELECT {REVIEW_COLUMNS}
                          FROM pharmacy_reviews
                         WHERE pharmacy_id = $1
                         ORDER BY updated_at, id
                         LIMIT $2
                        "#
                    )
                };
                sqlx::query(&sql)
                    .bind(pharmacy_id)
                    .bind(page.limit)
                    .fetch_all(&self.pool)
                    .await
            }
            Some(key) => {
                let sql = if page.desc {
                    format!(
                        r#"
                        SELECT {REVIEW_COLUMNS}
                          FROM pharmacy_reviews
                         WHERE pharmacy_id = $1
                           AND (updated_at, id) < ($2, $3)
                         ORDER BY updated_at DESC, id DESC
                         LIMIT $4
                        "#
                    )
                } else {
                    format!(
                        r#"
                        SELECT {REVIEW_COLUMNS}
                          FROM pharmacy_reviews
                         WHERE pharmacy_id = $1
                           AND (updated_at, id) > ($2, $3)
                         ORDER BY updated_at, id
                         LIMIT $4
                        "#
                    )
                };
                sqlx::query(&sql)
                    .bind(pharmacy_id)
                    .bind(key.updated_at)
                    .bind(key.id)
                    .bind(page.limit)
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(StoreError::database)?;

        rows.iter().map(review_from_row).collect()
    }

    async fn find(
        &self,
        pharmacy_id: i64,
        review_id: i64,
    ) -> Result<Option<PharmacyReview>, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {REVIEW_COLUMNS}
              FROM pharmacy_reviews
             WHERE pharmacy_id = $1 AND id = $2
            "#
        ))
        .bind(pharmacy_id)
        .bind(review_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::database)?;

        row.as_ref().map(review_from_row).transpose()
    }

    async fn create(&self, review: &mut PharmacyReview) -> Result<(), StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO pharmacy_reviews
                (pharmacy_id, prescription_type, stars, hrt_kind, nationality,
                 review, created_at, updated_at, modification_code)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(review.pharmacy_id)
        .bind(review.prescription_type.as_str())
        .bind(review.stars)
        .bind(review.hrt_kind.as_str())
        .bind(&review.nationality)
        .bind(&review.review)
        .bind(review.created_at)
        .bind(review.updated_at)
        .bind(&review.modification_code)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::database)?;

        review.id = row.try_get("id").map_err(StoreError::decode)?;
        Ok(())
    }

    async fn update(&self, review: &PharmacyReview) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE pharmacy_reviews
               SET prescription_type = $1, stars = $2, hrt_kind = $3,
                   nationality = $4, review = $5, updated_at = $6
             WHERE id = $7
            "#,
        )
        .bind(review.prescription_type.as_str())
        .bind(review.stars)
        .bind(review.hrt_kind.as_str())
        .bind(&review.nationality)
        .bind(&review.review)
        .bind(review.updated_at)
        .bind(review.id)
        .execute(&self.pool)
        .await
        .map_err(StoreError::database)?;
        Ok(())
    }

    async fn delete(&self, review_id: i64) -> Result<Option<PharmacyReview>, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            DELETE FROM pharmacy_reviews
             WHERE id = $1
            RETURNING {REVIEW_COLUMNS}
            "#
        ))
        .bind(review_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::database)?;

        row.as_ref().map(review_from_row).transpose()
    }
}
