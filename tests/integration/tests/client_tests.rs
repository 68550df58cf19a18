//! HTTP adapter against the stub backend
//!
//! Run with: cargo test -p integration-tests --test client_tests

use integration_tests::{emotion_json, TestServer};
use emomap_core::{
    DomainError, EmotionApi, EmotionId, EmotionType, EmotionUpdate, LatLng, NewComment, NewEmotion,
    Privacy,
};
use reqwest::Method;

// ============================================================================
// Reads
// ============================================================================

#[tokio::test]
async fn test_list_emotions() {
    let server = TestServer::start().await.unwrap();
    server.seed(emotion_json(1, "happy", 1), false);
    server.seed(emotion_json(2, "mystery", 2), false);

    let records = server.anonymous_api().unwrap().list_emotions().await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].emotion_type.known(), Some(EmotionType::Happy));
    // Unknown labels survive decoding
    assert_eq!(records[1].emotion_type.known(), None);
    assert!(records[0].coordinates().is_some());
}

#[tokio::test]
async fn test_missing_emotion_is_not_found() {
    let server = TestServer::start().await.unwrap();
    let err = server
        .anonymous_api()
        .unwrap()
        .get_emotion(EmotionId::new(404))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_server_error_keeps_message() {
    let server = TestServer::start().await.unwrap();
    server.set_failing(true);

    let err = server.api().unwrap().list_emotions().await.unwrap_err();
    assert_eq!(
        err,
        DomainError::Backend {
            status: 500,
            message: "数据库错误".to_string()
        }
    );
}

// ============================================================================
// Writes
// ============================================================================

#[tokio::test]
async fn test_create_sends_form_fields() {
    let server = TestServer::start().await.unwrap();
    let request = NewEmotion::new(EmotionType::Calm, LatLng::new(39.9, 116.4))
        .with_text("湖边")
        .with_privacy(Privacy::Private, true);

    let record = server.api().unwrap().create_emotion(&request).await.unwrap();
    assert_eq!(record.text(), Some("湖边"));
    assert!(!record.is_public);

    let sent = server
        .last_request(&Method::POST, "/api/emotions")
        .and_then(|r| r.body)
        .unwrap();
    assert_eq!(sent["description"], "湖边");
    assert_eq!(sent["privacy_setting"], "private");
    assert_eq!(sent["allow_collection"], false);
    assert_eq!(sent["emotion_type"], "calm");
}

#[tokio::test]
async fn test_create_without_session() {
    let server = TestServer::start().await.unwrap();
    let request = NewEmotion::new(EmotionType::Happy, LatLng::new(0.0, 0.0));

    let err = server
        .anonymous_api()
        .unwrap()
        .create_emotion(&request)
        .await
        .unwrap_err();
    assert_eq!(err, DomainError::Unauthorized("需要登录".to_string()));
}

#[tokio::test]
async fn test_update_sends_content() {
    let server = TestServer::start().await.unwrap();
    server.seed(emotion_json(5, "sad", 1), true);
    let update = EmotionUpdate::from_form(EmotionType::Sad, " 雨停了 ", true, false);

    server.api().unwrap().update_emotion(EmotionId::new(5), &update).await.unwrap();

    let sent = server
        .last_request(&Method::PUT, "/api/emotions/5")
        .and_then(|r| r.body)
        .unwrap();
    assert_eq!(sent["content"], "雨停了");
    assert_eq!(sent["allow_collection"], false);
}

#[tokio::test]
async fn test_delete_foreign_emotion_is_forbidden() {
    let server = TestServer::start().await.unwrap();
    server.seed(emotion_json(6, "sad", 1), false);

    let err = server
        .api()
        .unwrap()
        .delete_emotion(EmotionId::new(6))
        .await
        .unwrap_err();
    assert_eq!(err, DomainError::Forbidden("无权删除此情绪".to_string()));
    assert_eq!(server.emotion_ids(), vec![6]);
}

#[tokio::test]
async fn test_like_reports_count() {
    let server = TestServer::start().await.unwrap();
    let outcome = server.api().unwrap().like_emotion(EmotionId::new(1)).await.unwrap();
    assert_eq!(outcome.is_active(), Some(true));
    assert_eq!(outcome.count, Some(1));
}

#[tokio::test]
async fn test_uncollect_missing_entry_succeeds() {
    let server = TestServer::start().await.unwrap();
    let outcome = server
        .api()
        .unwrap()
        .uncollect_emotion(EmotionId::new(1))
        .await
        .unwrap();
    assert_eq!(outcome.is_active(), Some(false));
}

#[tokio::test]
async fn test_comment_sends_content() {
    let server = TestServer::start().await.unwrap();
    let comment = server
        .api()
        .unwrap()
        .create_comment(EmotionId::new(1), &NewComment::new("抱抱"))
        .await
        .unwrap();
    assert_eq!(comment.comment_text, "抱抱");

    let sent = server
        .last_request(&Method::POST, "/api/emotions/1/comments")
        .and_then(|r| r.body)
        .unwrap();
    assert_eq!(sent["content"], "抱抱");
}

// ============================================================================
// Profile
// ============================================================================

#[tokio::test]
async fn test_user_emotions_are_paged() {
    let server = TestServer::start().await.unwrap();
    for id in 1..=3 {
        server.seed(emotion_json(id, "happy", id), true);
    }
    server.seed(emotion_json(9, "sad", 1), false);

    let api = server.api().unwrap();
    let page = api.user_emotions(2, 2).await.unwrap();
    assert_eq!(page.page, 2);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.items.len(), 1);

    let request = server.last_request(&Method::GET, "/api/user/emotions").unwrap();
    assert_eq!(request.path, "/api/user/emotions");

    let stats = api.user_stats().await.unwrap();
    assert_eq!(stats.emotions_count, 3);
}
