//! Geographic coordinates

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// WGS84 latitude/longitude pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Initial map center (Beijing, Tiananmen)
    pub const MAP_CENTER: LatLng = LatLng {
        lat: 39.909_23,
        lng: 116.397_428,
    };

    /// Substitute position when geolocation fails
    pub const FALLBACK: LatLng = LatLng {
        lat: 39.9042,
        lng: 116.4074,
    };

    /// Create a coordinate pair without range checks
    #[inline]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Create a coordinate pair, rejecting non-finite or out-of-range values
    pub fn checked(lat: f64, lng: f64) -> Result<Self, DomainError> {
        let point = Self { lat, lng };
        if point.is_valid() {
            Ok(point)
        } else {
            Err(DomainError::InvalidCoordinates { lat, lng })
        }
    }

    /// Both components are real numbers
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    /// Both components finite and within WGS84 bounds
    pub fn is_valid(&self) -> bool {
        self.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Human-readable form used when no address is available
    pub fn describe(&self) -> String {
        format!("纬度 {:.6}, 经度 {:.6}", self.lat, self.lng)
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lng)
    }
}
