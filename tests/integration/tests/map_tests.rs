//! Map controller over the HTTP adapter
//!
//! Run with: cargo test -p integration-tests --test map_tests

use std::sync::Arc;

use emomap_core::{EmotionId, FilterState, SessionContext};
use emomap_map::{LoadOutcome, PopupContent, REFRESH_FAILED_MESSAGE, REFRESH_OK_MESSAGE};
use integration_tests::{emotion_json, map_controller, signed_in, toasts, TestServer};

fn ids(raw: &[i64]) -> Vec<EmotionId> {
    raw.iter().copied().map(EmotionId::new).collect()
}

#[tokio::test]
async fn test_load_and_filter() {
    let server = TestServer::start().await.unwrap();
    server.seed(emotion_json(1, "happy", 0), false);
    server.seed(emotion_json(2, "sad", 3), false);
    server.seed(emotion_json(3, "happy", 48), false);

    let (map, surface) = map_controller(Arc::new(server.api().unwrap()), toasts());
    map.initialize_default().unwrap();
    assert_eq!(map.load_emotions().await.unwrap(), LoadOutcome::Applied(3));
    assert_eq!(surface.snapshot().clustered.len(), 3);

    let visible = map.apply_filters(FilterState::parse("happy", "24h").unwrap()).unwrap();
    assert_eq!(visible, 1);
    assert_eq!(map.visible_ids(), ids(&[1]));

    map.apply_filters(FilterState::parse("all", "6h").unwrap()).unwrap();
    assert_eq!(map.visible_ids(), ids(&[1, 2]));
}

#[tokio::test]
async fn test_refresh_failure_keeps_markers() {
    let server = TestServer::start().await.unwrap();
    server.seed(emotion_json(1, "calm", 1), false);
    let notes = toasts();

    let (map, _surface) = map_controller(Arc::new(server.api().unwrap()), notes.clone());
    map.initialize_default().unwrap();
    map.refresh().await.unwrap();
    assert_eq!(notes.last().unwrap().message, REFRESH_OK_MESSAGE);

    server.set_failing(true);
    assert!(map.refresh().await.is_err());
    assert_eq!(map.marker_count(), 1);
    assert_eq!(notes.last().unwrap().message, REFRESH_FAILED_MESSAGE);
}

#[tokio::test]
async fn test_popup_depends_on_viewer() {
    let server = TestServer::start().await.unwrap();
    server.seed(emotion_json(1, "love", 1), false);

    let (map, _surface) = map_controller(Arc::new(server.api().unwrap()), toasts());
    map.initialize_default().unwrap();
    map.load_emotions().await.unwrap();

    let anonymous = map.click_marker(EmotionId::new(1), &SessionContext::anonymous()).unwrap();
    assert!(matches!(anonymous, PopupContent::LoginRequired { .. }));

    let PopupContent::Full { text, detail_url, .. } =
        map.click_marker(EmotionId::new(1), &signed_in()).unwrap()
    else {
        panic!("signed-in viewer sees the full popup");
    };
    assert_eq!(text.as_deref(), Some("emotion 1"));
    assert_eq!(detail_url, "/emotion/1");
}
