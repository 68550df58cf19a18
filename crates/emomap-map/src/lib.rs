//! # emomap-map
//!
//! Presentation core of the emotion map. [`MapController`] owns the rendered
//! map and every marker on it; the remaining modules are the pure pieces it
//! is assembled from:
//!
//! - [`marker`] turns emotion records into styled markers
//! - [`filter`] decides which markers are visible
//! - [`popup`] decides what a marker's popup reveals to the viewer
//! - [`geo`] wraps the platform geolocation capability
//! - [`notify`] shows transient toasts
//! - [`surface`] is the port to the mapping library

pub mod controller;
pub mod error;
pub mod filter;
pub mod geo;
pub mod marker;
pub mod notify;
pub mod popup;
pub mod surface;

pub use controller::{
    LoadOutcome, MapController, MapSettings, MapStatus, MAP_UNAVAILABLE_MESSAGE, POPUP_SETTLE_DELAY,
    REFRESH_FAILED_MESSAGE, REFRESH_OK_MESSAGE, USER_MARKER_LABEL,
};
pub use error::{MapError, MapResult};
pub use filter::{matches, visible_markers};
pub use geo::{
    FixedLocator, GeoError, GeoLocationProvider, GeoLocator, Position, PositionOptions,
    UnsupportedLocator,
};
pub use marker::{build_marker, ingest, visual_for, EmotionVisual, MarkerEntry, MarkerHandle, MarkerIcon};
pub use notify::{NotificationKind, NotificationPresenter, Notifier, Toast, ToastMode, TOAST_LIFETIME};
pub use popup::{detail_url, select_content, PopupContent, PopupHeader};
pub use surface::{ErrorPanel, HeadlessSurface, MapSurface, SurfaceState};
