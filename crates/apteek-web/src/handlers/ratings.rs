use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;

use apteek_core::{KindRating, Point, RatedPharmacy};

use crate::error::ApiError;
use crate::handlers::{parse_id, split_pair};
use crate::handlers::pharmacies::BoundsQuery;
use crate::AppState;

/// Lenient bounds: any missing or malformed component falls back to the
/// world rectangle so the endpoint degrades to "all pharmacies".
fn parse_lenient_bounds(query: &BoundsQuery) -> (Point, Point) {
    let mut sw = Point::world_sw();
    let mut ne = Point::world_ne();

    if let Some((lat, lng)) = split_pair(&query.sw) {
        if let Ok(v) = lat.trim().parse() {
            sw.lat = v;
        }
        if let Ok(v) = lng.trim().parse() {
            sw.lng = v;
        }
    }
    if let Some((lat, lng)) = split_pair(&query.ne) {
        if let Ok(v) = lat.trim().parse() {
            ne.lat = v;
        }
        if let Ok(v) = lng.trim().parse() {
            ne.lng = v;
        }
    }

    (sw, ne)
}

/// GET /api/v1/pharmacies/ratings?sw=lat,lng&ne=lat,lng
pub async fn ratings_in_bounds(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BoundsQuery>,
) -> Result<Json<Vec<RatedPharmacy>>, ApiError> {
    let (sw, ne) = parse_lenient_bounds(&query);
    let ratings = state.pharmacies.ratings_in_bounds(sw, ne).await?;
    Ok(Json(ratings))
}

/// GET /api/v1/pharmacies/{id}/ratings
pub async fn ratings_for_pharmacy(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<KindRating>>, ApiError> {
    let id = parse_id(&id, "ID")?;
    let ratings = state.pharmacies.ratings_for_pharmacy(id).await?;
    Ok(Json(ratings))
}
