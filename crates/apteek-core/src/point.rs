use serde::{Deserialize, Serialize};

/// A geographical point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub lat: f32,
    pub lng: f32,
}

impl Point {
    pub fn new(lat: f32, lng: f32) -> Self {
        Self { lat, lng }
    }

    /// South-west corner of the whole-world rectangle.
    pub fn world_sw() -> Self {
        Self::new(-90.0, -180.0)
    }

    /// North-east corner of the whole-world rectangle.
    pub fn world_ne() -> Self {
        Self::new(90.0, 180.0)
    }
}
