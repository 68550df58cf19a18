//! Stub backend for end-to-end tests
//!
//! Serves the REST routes the emotion map talks to from an in-process axum
//! router, keeps every received request for assertions and can be switched
//! into failure modes.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use emomap_client::HttpEmotionApi;
use emomap_common::ApiConfig;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Session cookie the stub accepts
pub const SESSION_COOKIE: &str = "session=stub-user";

/// Request seen by the stub
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Debug, Default)]
struct StubState {
    emotions: Vec<Value>,
    comments: Vec<Value>,
    owned: Vec<i64>,
    next_id: i64,
    requests: Vec<Recorded>,
    failing: bool,
}

type Shared = Arc<Mutex<StubState>>;

/// Running stub backend
pub struct TestServer {
    pub addr: SocketAddr,
    state: Shared,
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Start on an ephemeral port
    pub async fn start() -> Result<Self> {
        let state: Shared = Arc::new(Mutex::new(StubState {
            next_id: 100,
            ..StubState::default()
        }));

        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = listener.local_addr()?;
        let app = router(state.clone());
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Ok(Self {
            addr,
            state,
            _handle: handle,
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Client carrying the stub's session cookie
    pub fn api(&self) -> Result<HttpEmotionApi> {
        self.api_with_cookie(Some(SESSION_COOKIE))
    }

    /// Client without a session
    pub fn anonymous_api(&self) -> Result<HttpEmotionApi> {
        self.api_with_cookie(None)
    }

    fn api_with_cookie(&self, cookie: Option<&str>) -> Result<HttpEmotionApi> {
        let config = ApiConfig {
            base_url: self.base_url(),
            timeout_secs: 5,
            session_cookie: cookie.map(str::to_string),
        };
        Ok(HttpEmotionApi::new(&config)?)
    }

    /// Add a record as the backend would return it
    pub fn seed(&self, emotion: Value, owned: bool) {
        let mut state = self.state.lock();
        if owned {
            if let Some(id) = emotion["id"].as_i64() {
                state.owned.push(id);
            }
        }
        state.emotions.push(emotion);
    }

    pub fn seed_comment(&self, comment: Value) {
        self.state.lock().comments.push(comment);
    }

    /// Make every route answer 500
    pub fn set_failing(&self, failing: bool) {
        self.state.lock().failing = failing;
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.lock().requests.clone()
    }

    /// Last request matching `method` and `path`
    pub fn last_request(&self, method: &Method, path: &str) -> Option<Recorded> {
        self.requests()
            .into_iter()
            .rev()
            .find(|r| r.method == *method && r.path == path)
    }

    pub fn emotion_ids(&self) -> Vec<i64> {
        self.state
            .lock()
            .emotions
            .iter()
            .filter_map(|e| e["id"].as_i64())
            .collect()
    }
}

// ============================================================================
// Routes
// ============================================================================

fn router(state: Shared) -> Router {
    Router::new()
        .route("/api/emotions", get(list_emotions).post(create_emotion))
        .route(
            "/api/emotions/:id",
            get(get_emotion).put(update_emotion).delete(delete_emotion),
        )
        .route("/api/emotions/:id/like", post(toggle_like).delete(toggle_like))
        .route("/api/emotions/:id/collect", post(collect).delete(uncollect))
        .route("/api/emotions/:id/comments", get(list_comments).post(create_comment))
        .route("/api/comments/:id/like", post(toggle_like).delete(toggle_like))
        .route("/api/user/stats", get(user_stats))
        .route("/api/user/emotions", get(user_emotions))
        .route("/api/user/collections", get(user_collections))
        .route("/api/user/emotion-analysis", get(emotion_analysis))
        .with_state(state)
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Record the request; `Err` carries the response of a failure mode
fn enter(
    state: &Shared,
    method: Method,
    uri: &Uri,
    headers: &HeaderMap,
    body: Option<Value>,
    needs_session: bool,
) -> Result<(), Response> {
    let mut guard = state.lock();
    guard.requests.push(Recorded {
        method,
        path: uri.path().to_string(),
        body,
    });
    if guard.failing {
        return Err(error(StatusCode::INTERNAL_SERVER_ERROR, "数据库错误"));
    }
    let signed_in = headers
        .get("cookie")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains(SESSION_COOKIE));
    if needs_session && !signed_in {
        return Err(error(StatusCode::UNAUTHORIZED, "需要登录"));
    }
    Ok(())
}

async fn list_emotions(State(state): State<Shared>, method: Method, uri: Uri, headers: HeaderMap) -> Response {
    if let Err(resp) = enter(&state, method, &uri, &headers, None, false) {
        return resp;
    }
    let emotions = state.lock().emotions.clone();
    Json(json!({ "emotions": emotions })).into_response()
}

async fn get_emotion(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    if let Err(resp) = enter(&state, method, &uri, &headers, None, false) {
        return resp;
    }
    let guard = state.lock();
    match guard.emotions.iter().find(|e| e["id"] == id) {
        Some(emotion) => Json(json!({ "emotion": emotion })).into_response(),
        None => error(StatusCode::NOT_FOUND, "情绪不存在"),
    }
}

async fn create_emotion(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(resp) = enter(&state, method, &uri, &headers, Some(body.clone()), true) {
        return resp;
    }
    let mut guard = state.lock();
    guard.next_id += 1;
    let id = guard.next_id;
    let emotion = json!({
        "id": id,
        "emotion_type": body["emotion_type"],
        "custom_emoji": body.get("custom_emoji"),
        "emotion_text": body["description"],
        "latitude": body["latitude"],
        "longitude": body["longitude"],
        "intensity": body["intensity"],
        "is_public": body["privacy_setting"] == "public",
        "privacy_setting": body["privacy_setting"],
        "allow_collection": body["allow_collection"],
        "created_at": Utc::now().naive_utc().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
        "username": "stub-user",
    });
    guard.emotions.push(emotion.clone());
    guard.owned.push(id);
    (StatusCode::CREATED, Json(json!({ "emotion": emotion }))).into_response()
}

async fn update_emotion(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(resp) = enter(&state, method, &uri, &headers, Some(body.clone()), true) {
        return resp;
    }
    let mut guard = state.lock();
    if !guard.owned.contains(&id) {
        return error(StatusCode::FORBIDDEN, "无权修改此情绪");
    }
    if let Some(emotion) = guard.emotions.iter_mut().find(|e| e["id"] == id) {
        if let Some(text) = body.get("content") {
            emotion["emotion_text"] = text.clone();
        }
        if let Some(kind) = body.get("emotion_type") {
            emotion["emotion_type"] = kind.clone();
        }
        if let Some(privacy) = body.get("privacy_setting") {
            emotion["is_public"] = json!(privacy == "public");
        }
        if let Some(allow) = body.get("allow_collection") {
            emotion["allow_collection"] = allow.clone();
        }
    }
    Json(json!({ "success": true })).into_response()
}

async fn delete_emotion(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    if let Err(resp) = enter(&state, method, &uri, &headers, None, true) {
        return resp;
    }
    let mut guard = state.lock();
    if !guard.owned.contains(&id) {
        return error(StatusCode::FORBIDDEN, "无权删除此情绪");
    }
    guard.emotions.retain(|e| e["id"] != id);
    guard.owned.retain(|o| *o != id);
    Json(json!({ "success": true })).into_response()
}

async fn toggle_like(
    State(state): State<Shared>,
    Path(_id): Path<i64>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let liked = method == Method::POST;
    if let Err(resp) = enter(&state, method, &uri, &headers, None, true) {
        return resp;
    }
    let (action, count) = if liked { ("liked", 1) } else { ("unliked", 0) };
    Json(json!({ "action": action, "likes_count": count })).into_response()
}

async fn collect(
    State(state): State<Shared>,
    Path(_id): Path<i64>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    if let Err(resp) = enter(&state, method, &uri, &headers, None, true) {
        return resp;
    }
    Json(json!({ "action": "collected", "collections_count": 1 })).into_response()
}

/// Nothing is ever collected in the stub, so removal always misses
async fn uncollect(
    State(state): State<Shared>,
    Path(_id): Path<i64>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    if let Err(resp) = enter(&state, method, &uri, &headers, None, true) {
        return resp;
    }
    error(StatusCode::NOT_FOUND, "未收藏")
}

async fn list_comments(
    State(state): State<Shared>,
    Path(_id): Path<i64>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    if let Err(resp) = enter(&state, method, &uri, &headers, None, false) {
        return resp;
    }
    let comments = state.lock().comments.clone();
    Json(json!({ "comments": comments })).into_response()
}

async fn create_comment(
    State(state): State<Shared>,
    Path(_id): Path<i64>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(resp) = enter(&state, method, &uri, &headers, Some(body.clone()), true) {
        return resp;
    }
    let mut guard = state.lock();
    guard.next_id += 1;
    let comment = json!({
        "id": guard.next_id,
        "content": body["content"],
        "username": "stub-user",
        "created_at": Utc::now().to_rfc3339(),
    });
    guard.comments.push(comment.clone());
    (StatusCode::CREATED, Json(json!({ "comment": comment }))).into_response()
}

async fn user_stats(State(state): State<Shared>, method: Method, uri: Uri, headers: HeaderMap) -> Response {
    if let Err(resp) = enter(&state, method, &uri, &headers, None, true) {
        return resp;
    }
    let count = state.lock().owned.len();
    Json(json!({ "stats": { "emotions_count": count, "total_likes": 0, "total_collections": 0 } }))
        .into_response()
}

async fn user_emotions(
    State(state): State<Shared>,
    Query(query): Query<HashMap<String, u32>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    if let Err(resp) = enter(&state, method, &uri, &headers, None, true) {
        return resp;
    }
    let page = query.get("page").copied().unwrap_or(1).max(1) as usize;
    let limit = query.get("limit").copied().unwrap_or(10).max(1) as usize;
    let guard = state.lock();
    let mine: Vec<&Value> = guard
        .emotions
        .iter()
        .filter(|e| e["id"].as_i64().is_some_and(|id| guard.owned.contains(&id)))
        .collect();
    let total_pages = mine.len().div_ceil(limit).max(1);
    let items: Vec<&Value> = mine.into_iter().skip((page - 1) * limit).take(limit).collect();
    Json(json!({ "emotions": items, "page": page, "total_pages": total_pages })).into_response()
}

async fn user_collections(State(state): State<Shared>, method: Method, uri: Uri, headers: HeaderMap) -> Response {
    if let Err(resp) = enter(&state, method, &uri, &headers, None, true) {
        return resp;
    }
    Json(json!({ "collections": [], "page": 1, "total_pages": 1 })).into_response()
}

async fn emotion_analysis(State(state): State<Shared>, method: Method, uri: Uri, headers: HeaderMap) -> Response {
    if let Err(resp) = enter(&state, method, &uri, &headers, None, true) {
        return resp;
    }
    let guard = state.lock();
    let mut distribution: HashMap<String, u32> = HashMap::new();
    for emotion in &guard.emotions {
        if let Some(kind) = emotion["emotion_type"].as_str() {
            *distribution.entry(kind.to_string()).or_default() += 1;
        }
    }
    let most_common = distribution
        .iter()
        .max_by_key(|(kind, count)| (**count, std::cmp::Reverse((*kind).clone())))
        .map(|(kind, _)| kind.clone());
    Json(json!({
        "analysis": {
            "emotion_distribution": distribution,
            "most_common_emotion": most_common,
            "most_active_hour": 9,
            "daily_average": 0.3,
        }
    }))
    .into_response()
}

/// Give a spawned task a moment to run
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}
