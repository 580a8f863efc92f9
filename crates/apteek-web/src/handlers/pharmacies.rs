use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use tracing::warn;

use apteek_core::{Pharmacy, Point};

use crate::error::ApiError;
use crate::handlers::split_pair;
use crate::AppState;

#[derive(Debug, Deserialize, Default)]
pub struct BoundsQuery {
    #[serde(default)]
    pub sw: String,
    #[serde(default)]
    pub ne: String,
}

fn parse_bounds(query: &BoundsQuery) -> Result<(Point, Point), ApiError> {
    let (Some((sw_lat, sw_lng)), Some((ne_lat, ne_lng))) =
        (split_pair(&query.sw), split_pair(&query.ne))
    else {
        warn!("could not extract latitude and longitude from bounds");
        return Err(ApiError::bad_request("Missing coordinate bounds"));
    };

    let lat = sw_lat
        .parse()
        .map_err(|_| ApiError::bad_request("South-west bound latitude is malformed"))?;
    let lng = sw_lng
        .parse()
        .map_err(|_| ApiError::bad_request("South-west bound longitude is malformed"))?;
    let sw = Point::new(lat, lng);

    let lat = ne_lat
        .parse()
        .map_err(|_| ApiError::bad_request("North-east bound latitude is malformed"))?;
    let lng = ne_lng
        .parse()
        .map_err(|_| ApiError::bad_request("North-east bound longitude is malformed"))?;
    let ne = Point::new(lat, lng);

    Ok((sw, ne))
}

/// GET /api/v1/pharmacies?sw=lat,lng&ne=lat,lng
pub async fn pharmacies_in_bounds(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BoundsQuery>,
) -> Result<Json<Vec<Pharmacy>>, ApiError> {
    let (sw, ne) = parse_bounds(&query)?;
    let pharmacies = state.pharmacies.find_in_bounds(sw, ne).await?;
    Ok(Json(pharmacies))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_bounds_parse() {
        let query = BoundsQuery {
            sw: "59.2,24.5".to_string(),
            ne: "59.6,25.0".to_string(),
        };
        let (sw, ne) = parse_bounds(&query).unwrap();
        assert_eq!(sw, Point::new(59.2, 24.5));
        assert_eq!(ne, Point::new(59.6, 25.0));
    }

    #[test]
    fn missing_or_malformed_bounds_are_rejected() {
        assert!(parse_bounds(&BoundsQuery::default()).is_err());
        assert!(parse_bounds(&BoundsQuery {
            sw: "59.2".to_string(),
            ne: "59.6,25.0".to_string(),
        })
        .is_err());
        assert!(parse_bounds(&BoundsQuery {
            sw: "north,east".to_string(),
            ne: "59.6,25.0".to_string(),
        })
        .is_err());
    }
}
