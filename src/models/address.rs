use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Destination supplied by the checkout. Coordinates are optional; without
/// them distance falls back to the zone's flat estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub street_address: String,
    pub city: String,
    pub province: String,
    pub zip_code: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
}

impl Address {
    /// Both coordinates present and in range, otherwise `None`.
    pub fn coordinates(&self) -> Option<GeoPoint> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => {
                let point = GeoPoint { lat, lng };
                point.is_valid().then_some(point)
            }
            _ => None,
        }
    }
}
