//! Backend records and test contexts

use std::sync::Arc;

use chrono::{Duration, Utc};
use emomap_client::DisabledGeocoder;
use emomap_core::{EmotionApi, LatLng, SessionContext, SessionUser};
use emomap_map::{
    FixedLocator, GeoLocationProvider, HeadlessSurface, MapController, MapSettings,
    NotificationPresenter, ToastMode,
};
use emomap_pages::{PageContext, PageContextBuilder};
use serde_json::{json, Value};

/// Where the fixed locator puts the viewer
pub const VIEWER_POSITION: LatLng = LatLng {
    lat: 31.2304,
    lng: 121.4737,
};

/// Emotion row as the backend sends it, `hours_ago` old
pub fn emotion_json(id: i64, kind: &str, hours_ago: i64) -> Value {
    let created = Utc::now() - Duration::hours(hours_ago);
    json!({
        "id": id,
        "emotion_type": kind,
        "emotion_text": format!("emotion {id}"),
        "latitude": 39.9042 + id as f64 * 0.001,
        "longitude": 116.4074,
        "created_at": created.naive_utc().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
        "is_public": true,
        "allow_collection": true,
        "likes_count": 0,
        "comments_count": 0,
        "username": "alice",
    })
}

pub fn viewer() -> SessionUser {
    SessionUser {
        id: 7,
        username: "stub-user".to_string(),
    }
}

pub fn signed_in() -> SessionContext {
    SessionContext::authenticated(viewer())
}

/// Map controller over a headless surface with a short popup delay
pub fn map_controller(
    api: Arc<dyn EmotionApi>,
    toasts: Arc<NotificationPresenter>,
) -> (MapController, HeadlessSurface) {
    let surface = HeadlessSurface::new();
    let settings = MapSettings {
        popup_delay: std::time::Duration::from_millis(5),
        ..MapSettings::default()
    };
    let controller = MapController::new(
        settings,
        Box::new(surface.clone()),
        api,
        Arc::new(GeoLocationProvider::new(Arc::new(FixedLocator::new(VIEWER_POSITION)))),
        toasts,
    );
    (controller, surface)
}

/// Page context for a signed-in viewer
pub fn page_context(api: Arc<dyn EmotionApi>, toasts: Arc<NotificationPresenter>) -> PageContext {
    PageContextBuilder::new()
        .api(api)
        .geocoder(Arc::new(DisabledGeocoder))
        .geo(Arc::new(GeoLocationProvider::new(Arc::new(FixedLocator::new(VIEWER_POSITION)))))
        .notifier(toasts)
        .session(signed_in())
        .build()
        .expect("complete page context")
}

pub fn toasts() -> Arc<NotificationPresenter> {
    Arc::new(NotificationPresenter::new(ToastMode::Replace))
}
