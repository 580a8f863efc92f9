//! Core domain model and store contracts for the pharmacy locator.

pub mod pharmacy;
pub mod point;
pub mod rating;
pub mod review;
pub mod store;

pub use pharmacy::{Chain, Pharmacy};
pub use point::Point;
pub use rating::{KindRating, RatedPharmacy};
pub use review::{HrtKind, PharmacyReview, PrescriptionType};
pub use store::{PageKey, PharmacyStore, ReviewPage, ReviewStore, StoreError};

use chrono::{DateTime, Utc};

/// Placeholder timestamp for sources that report no modification time.
///
/// An epoch-stamped candidate never compares "newer" than a stored row,
/// so such records are effectively insert-only.
pub fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}
