//! Store contracts implemented by the Postgres layer and by the in-memory
//! doubles used in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::pharmacy::{Chain, Pharmacy};
use crate::point::Point;
use crate::rating::{KindRating, RatedPharmacy};
use crate::review::PharmacyReview;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),
    #[error("failed to decode stored row: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn database(err: impl std::fmt::Display) -> Self {
        StoreError::Database(err.to_string())
    }

    pub fn decode(err: impl std::fmt::Display) -> Self {
        StoreError::Decode(err.to_string())
    }
}

/// Keyset-pagination cursor: the `(updated_at, id)` pair of the last row of
/// the previous page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageKey {
    pub updated_at: DateTime<Utc>,
    pub id: i64,
}

/// Paging parameters for review queries.
#[derive(Debug, Clone, Copy)]
pub struct ReviewPage {
    pub after: Option<PageKey>,
    pub limit: i64,
    pub desc: bool,
}

impl Default for ReviewPage {
    fn default() -> Self {
        Self {
            after: None,
            limit: 50,
            desc: false,
        }
    }
}

#[async_trait]
pub trait PharmacyStore: Send + Sync {
    async fn find_in_bounds(&self, sw: Point, ne: Point) -> Result<Vec<Pharmacy>, StoreError>;

    async fn find_by_chain(&self, chain: Chain) -> Result<Vec<Pharmacy>, StoreError>;

    async fn ratings_for_pharmacy(&self, pharmacy_id: i64) -> Result<Vec<KindRating>, StoreError>;

    async fn ratings_in_bounds(
        &self,
        sw: Point,
        ne: Point,
    ) -> Result<Vec<RatedPharmacy>, StoreError>;

    /// Persist a reconciled batch: records with a surrogate id are updated
    /// in place, the rest are inserted. The scraping pipeline never deletes.
    async fn store_all(&self, pharmacies: &[Pharmacy]) -> Result<(), StoreError>;
}

#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn list_for_pharmacy(
        &self,
        pharmacy_id: i64,
        page: ReviewPage,
    ) -> Result<Vec<PharmacyReview>, StoreError>;

    async fn find(
        &self,
        pharmacy_id: i64,
        review_id: i64,
    ) -> Result<Option<PharmacyReview>, StoreError>;

    /// Insert a new review and fill in its assigned surrogate id.
    async fn create(&self, review: &mut PharmacyReview) -> Result<(), StoreError>;

    async fn update(&self, review: &PharmacyReview) -> Result<(), StoreError>;

    /// Hard-delete a review, returning the prior content when it existed.
    async fn delete(&self, review_id: i64) -> Result<Option<PharmacyReview>, StoreError>;
}
