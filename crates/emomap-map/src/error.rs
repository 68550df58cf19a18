//! Map errors

use emomap_core::{DomainError, EmotionId, ErrorCategory};
use thiserror::Error;

use crate::geo::GeoError;

/// Map controller errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MapError {
    /// The mapping library could not be mounted
    #[error("Map unavailable: {0}")]
    MapUnavailable(String),

    #[error("Map is not initialized")]
    NotInitialized,

    #[error("Map has been destroyed")]
    Destroyed,

    #[error("Emotion {0} has no coordinates")]
    MissingCoordinates(EmotionId),

    #[error("No marker for emotion {0}")]
    UnknownMarker(EmotionId),

    #[error(transparent)]
    Geo(#[from] GeoError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl MapError {
    /// Get an error code string for logs
    pub fn code(&self) -> &'static str {
        match self {
            Self::MapUnavailable(_) => "MAP_UNAVAILABLE",
            Self::NotInitialized => "MAP_NOT_INITIALIZED",
            Self::Destroyed => "MAP_DESTROYED",
            Self::MissingCoordinates(_) => "MISSING_COORDINATES",
            Self::UnknownMarker(_) => "UNKNOWN_MARKER",
            Self::Geo(e) => e.code(),
            Self::Domain(e) => e.code(),
        }
    }

    /// Classify the error for presentation
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MapUnavailable(_) | Self::NotInitialized | Self::Destroyed => {
                ErrorCategory::CapabilityAbsent
            }
            Self::MissingCoordinates(_) | Self::UnknownMarker(_) => ErrorCategory::Validation,
            Self::Geo(e) => e.category(),
            Self::Domain(e) => e.category(),
        }
    }
}

/// Result type for map operations
pub type MapResult<T> = Result<T, MapError>;

#[cfg(test)]
mod tests {
    use super::*;
    use emomap_core::ErrorSurface;

    #[test]
    fn test_categories_pick_surface() {
        let err = MapError::MapUnavailable("no library".to_string());
        assert_eq!(err.category().surface(), ErrorSurface::Inline);

        let err = MapError::from(GeoError::PermissionDenied);
        assert_eq!(err.category(), ErrorCategory::PermissionDenied);
        assert_eq!(err.category().surface(), ErrorSurface::Toast);

        let err = MapError::from(DomainError::Network("offline".to_string()));
        assert_eq!(err.code(), "NETWORK_ERROR");
    }
}
