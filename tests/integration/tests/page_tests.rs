//! Page controllers end to end: stub backend, HTTP adapter, map
//!
//! Run with: cargo test -p integration-tests --test page_tests

use std::sync::Arc;

use emomap_core::{EmotionId, EmotionType};
use emomap_map::NotificationKind;
use emomap_pages::{
    EmotionDetail, EmotionManager, ProfileManager, ProfileTab, SubmitOutcome, TabContent,
};
use integration_tests::{emotion_json, map_controller, page_context, toasts, TestServer};
use reqwest::Method;

#[tokio::test]
async fn test_share_lands_on_the_map() {
    let server = TestServer::start().await.unwrap();
    let api = Arc::new(server.api().unwrap());
    let notes = toasts();

    let (map, surface) = map_controller(api.clone(), notes.clone());
    map.initialize_default().unwrap();
    map.load_emotions().await.unwrap();
    let map = Arc::new(map);

    let manager = EmotionManager::new(page_context(api, notes.clone()), map.clone());
    manager.open_create();
    manager.refresh_location().await;
    manager.select_emotion(EmotionType::Grateful);
    manager.set_text("谢谢你");

    let SubmitOutcome::Created(record) = manager.submit().await.unwrap() else {
        panic!("create mode submits a new emotion");
    };
    assert_eq!(map.visible_ids(), vec![record.id]);
    let snapshot = surface.snapshot();
    assert_eq!(snapshot.open_popup.map(|(id, _)| id), Some(record.id));
    assert_eq!(notes.last().unwrap().kind, NotificationKind::Success);

    manager.delete(record.id).await.unwrap();
    assert_eq!(map.marker_count(), 0);
    assert!(server.emotion_ids().is_empty());
}

#[tokio::test]
async fn test_share_without_session_is_toasted() {
    let server = TestServer::start().await.unwrap();
    let notes = toasts();
    let manager = EmotionManager::new(
        page_context(Arc::new(server.anonymous_api().unwrap()), notes.clone()),
        Arc::new(emomap_pages::RecordingSink::new()),
    );
    manager.refresh_location().await;
    manager.select_emotion(EmotionType::Happy);

    assert!(manager.submit().await.is_err());
    let toast = notes.last().unwrap();
    assert_eq!(toast.kind, NotificationKind::Error);
    assert_eq!(toast.message, "需要登录");
}

#[tokio::test]
async fn test_detail_comment_flow() {
    let server = TestServer::start().await.unwrap();
    server.seed(emotion_json(3, "tired", 2), false);
    let notes = toasts();

    let detail = EmotionDetail::new(
        page_context(Arc::new(server.api().unwrap()), notes.clone()),
        EmotionId::new(3),
    );
    detail.load().await.unwrap();
    assert!(detail.comments().is_empty());

    assert!(detail.toggle_like().await.unwrap());
    assert!(detail.record().unwrap().is_liked);

    detail.set_comment_input("早点休息");
    detail.submit_comment().await.unwrap();
    assert_eq!(detail.comments().len(), 1);
    assert_eq!(detail.comment_input(), "");
    assert_eq!(detail.record().unwrap().comments_count, 1);
    assert!(server.last_request(&Method::POST, "/api/emotions/3/comments").is_some());
}

#[tokio::test]
async fn test_profile_over_http() {
    let server = TestServer::start().await.unwrap();
    for id in 1..=3 {
        server.seed(emotion_json(id, "sad", id), true);
    }
    let profile = ProfileManager::new(page_context(Arc::new(server.api().unwrap()), toasts()));

    profile.open().await.unwrap();
    assert_eq!(profile.stats().emotions_count, 3);
    assert!(matches!(profile.content(), Some(TabContent::Emotions(ref items)) if items.len() == 3));

    profile.delete(EmotionId::new(2)).await.unwrap();
    assert_eq!(profile.stats().emotions_count, 2);

    profile.switch_tab(ProfileTab::Analysis).await.unwrap();
    let Some(TabContent::Analysis(view)) = profile.content() else {
        panic!("analysis tab shows the analysis");
    };
    assert_eq!(view.insights[0], "你最常分享的是难过情绪，这反映了你的主要情感状态。");
    assert_eq!(view.active_hours(), "9:00 - 10:00");
    assert!(view.insights.iter().any(|line| line.contains("内敛")));
}
