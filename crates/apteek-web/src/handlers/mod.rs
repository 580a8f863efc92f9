pub mod pharmacies;
pub mod ratings;
pub mod reviews;

use crate::error::ApiError;

/// Parse an id path segment, rejecting anything non-numeric with a 400.
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<i64, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::bad_request(format!("Malformed {what} path variable")))
}

/// Split a "lat,lng" pair into its components.
pub(crate) fn split_pair(raw: &str) -> Option<(&str, &str)> {
    let mut parts = raw.split(',');
    let lat = parts.next()?;
    let lng = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some((lat, lng))
}
