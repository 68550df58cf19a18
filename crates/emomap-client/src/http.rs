//! REST backend adapter

use async_trait::async_trait;
use emomap_common::ApiConfig;
use emomap_core::{
    ApiResult, CollectedEmotion, Comment, CommentId, DomainError, EmotionAnalysis, EmotionApi,
    EmotionId, EmotionRecord, EmotionUpdate, NewComment, NewEmotion, Page, ToggleOutcome,
    UserStats,
};
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::envelope::{
    AnalysisEnvelope, CommentEnvelope, CommentList, EmotionEnvelope, EmotionList, PagedList,
    StatsEnvelope,
};
use crate::error::{status_error, transport_error};

/// `EmotionApi` over HTTP
#[derive(Debug, Clone)]
pub struct HttpEmotionApi {
    client: Client,
    base_url: String,
}

impl HttpEmotionApi {
    /// Build a client from configuration
    pub fn new(config: &ApiConfig) -> ApiResult<Self> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = &config.session_cookie {
            let value = HeaderValue::from_str(cookie)
                .map_err(|e| DomainError::InternalError(format!("invalid session cookie: {e}")))?;
            headers.insert(COOKIE, value);
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()
            .map_err(transport_error)?;

        Ok(Self::with_client(client, &config.base_url))
    }

    /// Wrap an existing `reqwest` client
    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, format!("{}{}", self.base_url, path))
    }

    async fn send(&self, builder: RequestBuilder) -> ApiResult<Response> {
        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "Backend responded");

        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let err = status_error(status.as_u16(), &body);
        warn!(status = status.as_u16(), code = err.code(), "Backend request failed");
        Err(err)
    }

    async fn json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ApiResult<T> {
        let response = self.send(builder).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| DomainError::Decode(e.to_string()))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.json(self.request(Method::GET, path)).await
    }

    async fn with_body<B, T>(&self, method: Method, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        self.json(self.request(method, path).json(body)).await
    }

    /// Toggle endpoints answer with `{action, likes_count}`; an empty body is fine too
    async fn toggle(&self, method: Method, path: &str) -> ApiResult<ToggleOutcome> {
        let response = self.send(self.request(method, path)).await?;
        let body = response.text().await.map_err(transport_error)?;
        if body.trim().is_empty() {
            return Ok(ToggleOutcome::default());
        }
        serde_json::from_str(&body).map_err(|e| DomainError::Decode(e.to_string()))
    }
}

#[async_trait]
impl EmotionApi for HttpEmotionApi {
    #[instrument(skip(self))]
    async fn list_emotions(&self) -> ApiResult<Vec<EmotionRecord>> {
        let list: EmotionList = self.get("/api/emotions").await?;
        debug!(count = list.emotions.len(), "Emotions fetched");
        Ok(list.emotions)
    }

    #[instrument(skip(self))]
    async fn get_emotion(&self, id: EmotionId) -> ApiResult<EmotionRecord> {
        let envelope: EmotionEnvelope = self
            .get(&format!("/api/emotions/{id}"))
            .await
            .map_err(|e| match e {
                DomainError::NotFound(_) => DomainError::EmotionNotFound(id),
                other => other,
            })?;
        Ok(envelope.emotion)
    }

    #[instrument(skip(self, request), fields(emotion_type = %request.emotion_type))]
    async fn create_emotion(&self, request: &NewEmotion) -> ApiResult<EmotionRecord> {
        let envelope: EmotionEnvelope = self
            .with_body(Method::POST, "/api/emotions", request)
            .await?;
        Ok(envelope.emotion)
    }

    #[instrument(skip(self, update))]
    async fn update_emotion(&self, id: EmotionId, update: &EmotionUpdate) -> ApiResult<()> {
        self.send(self.request(Method::PUT, &format!("/api/emotions/{id}")).json(update))
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_emotion(&self, id: EmotionId) -> ApiResult<()> {
        self.send(self.request(Method::DELETE, &format!("/api/emotions/{id}")))
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn like_emotion(&self, id: EmotionId) -> ApiResult<ToggleOutcome> {
        self.toggle(Method::POST, &format!("/api/emotions/{id}/like"))
            .await
    }

    #[instrument(skip(self))]
    async fn unlike_emotion(&self, id: EmotionId) -> ApiResult<ToggleOutcome> {
        self.toggle(Method::DELETE, &format!("/api/emotions/{id}/like"))
            .await
    }

    #[instrument(skip(self))]
    async fn collect_emotion(&self, id: EmotionId) -> ApiResult<ToggleOutcome> {
        self.toggle(Method::POST, &format!("/api/emotions/{id}/collect"))
            .await
    }

    #[instrument(skip(self))]
    async fn uncollect_emotion(&self, id: EmotionId) -> ApiResult<ToggleOutcome> {
        match self
            .toggle(Method::DELETE, &format!("/api/emotions/{id}/collect"))
            .await
        {
            // Nothing left to remove
            Err(DomainError::NotFound(_)) => Ok(ToggleOutcome {
                action: Some("uncollected".to_string()),
                count: None,
            }),
            other => other,
        }
    }

    #[instrument(skip(self))]
    async fn list_comments(&self, id: EmotionId) -> ApiResult<Vec<Comment>> {
        let list: CommentList = self.get(&format!("/api/emotions/{id}/comments")).await?;
        Ok(list.comments)
    }

    #[instrument(skip(self, request))]
    async fn create_comment(&self, id: EmotionId, request: &NewComment) -> ApiResult<Comment> {
        let envelope: CommentEnvelope = self
            .with_body(Method::POST, &format!("/api/emotions/{id}/comments"), request)
            .await?;
        Ok(envelope.comment)
    }

    #[instrument(skip(self))]
    async fn like_comment(&self, id: CommentId) -> ApiResult<ToggleOutcome> {
        self.toggle(Method::POST, &format!("/api/comments/{id}/like"))
            .await
    }

    #[instrument(skip(self))]
    async fn unlike_comment(&self, id: CommentId) -> ApiResult<ToggleOutcome> {
        self.toggle(Method::DELETE, &format!("/api/comments/{id}/like"))
            .await
    }

    #[instrument(skip(self))]
    async fn user_stats(&self) -> ApiResult<UserStats> {
        let envelope: StatsEnvelope = self.get("/api/user/stats").await?;
        Ok(envelope.stats)
    }

    #[instrument(skip(self))]
    async fn user_emotions(&self, page: u32, limit: u32) -> ApiResult<Page<EmotionRecord>> {
        let list: PagedList<EmotionRecord> = self
            .json(
                self.request(Method::GET, "/api/user/emotions")
                    .query(&[("page", page), ("limit", limit)]),
            )
            .await?;
        Ok(list.into_page(page))
    }

    #[instrument(skip(self))]
    async fn user_collections(&self, page: u32, limit: u32) -> ApiResult<Page<CollectedEmotion>> {
        let list: PagedList<CollectedEmotion> = self
            .json(
                self.request(Method::GET, "/api/user/collections")
                    .query(&[("page", page), ("limit", limit)]),
            )
            .await?;
        Ok(list.into_page(page))
    }

    #[instrument(skip(self))]
    async fn emotion_analysis(&self) -> ApiResult<EmotionAnalysis> {
        let envelope: AnalysisEnvelope = self.get("/api/user/emotion-analysis").await?;
        Ok(envelope.analysis)
    }
}
