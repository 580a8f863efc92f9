use serde::Serialize;

use crate::review::HrtKind;

/// Average star rating for one pharmacy, per therapy kind.
///
/// A row with `hrt_kind: None` carries the overall average across all
/// reviews of the pharmacy.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KindRating {
    pub hrt_kind: Option<HrtKind>,
    pub stars: f32,
}

/// Aggregated ratings for one pharmacy within a coordinate-bound query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatedPharmacy {
    pub id: i64,
    pub name: String,
    pub avg_rating: f32,
    pub avg_e_rating: f32,
    pub avg_t_rating: f32,
}
