//! Backend ports
//!
//! The presentation core talks to the REST backend and to the reverse
//! geocoding service only through these traits. The HTTP client crate
//! provides the production implementations; tests plug in in-memory ones.

use async_trait::async_trait;

use crate::entities::{
    CollectedEmotion, Comment, EmotionAnalysis, EmotionRecord, EmotionUpdate, NewComment,
    NewEmotion, Page, ToggleOutcome, UserStats,
};
use crate::error::DomainError;
use crate::value_objects::{CommentId, EmotionId, LatLng};

/// Result type for backend operations
pub type ApiResult<T> = Result<T, DomainError>;

// ============================================================================
// Emotion Backend
// ============================================================================

#[async_trait]
pub trait EmotionApi: Send + Sync {
    // -- emotions --

    /// List every emotion visible on the map
    async fn list_emotions(&self) -> ApiResult<Vec<EmotionRecord>>;

    /// Fetch one emotion with viewer-relative flags
    async fn get_emotion(&self, id: EmotionId) -> ApiResult<EmotionRecord>;

    /// Create an emotion and return the stored record
    async fn create_emotion(&self, request: &NewEmotion) -> ApiResult<EmotionRecord>;

    /// Update an emotion owned by the viewer
    async fn update_emotion(&self, id: EmotionId, update: &EmotionUpdate) -> ApiResult<()>;

    /// Delete an emotion owned by the viewer
    async fn delete_emotion(&self, id: EmotionId) -> ApiResult<()>;

    // -- reactions --

    async fn like_emotion(&self, id: EmotionId) -> ApiResult<ToggleOutcome>;

    async fn unlike_emotion(&self, id: EmotionId) -> ApiResult<ToggleOutcome>;

    async fn collect_emotion(&self, id: EmotionId) -> ApiResult<ToggleOutcome>;

    /// Remove the viewer's collection entry; removing a missing entry succeeds
    async fn uncollect_emotion(&self, id: EmotionId) -> ApiResult<ToggleOutcome>;

    // -- comments --

    async fn list_comments(&self, id: EmotionId) -> ApiResult<Vec<Comment>>;

    async fn create_comment(&self, id: EmotionId, request: &NewComment) -> ApiResult<Comment>;

    async fn like_comment(&self, id: CommentId) -> ApiResult<ToggleOutcome>;

    async fn unlike_comment(&self, id: CommentId) -> ApiResult<ToggleOutcome>;

    // -- profile --

    async fn user_stats(&self) -> ApiResult<UserStats>;

    /// Emotions authored by the viewer, one page
    async fn user_emotions(&self, page: u32, limit: u32) -> ApiResult<Page<EmotionRecord>>;

    /// Emotions collected by the viewer, one page
    async fn user_collections(&self, page: u32, limit: u32) -> ApiResult<Page<CollectedEmotion>>;

    async fn emotion_analysis(&self) -> ApiResult<EmotionAnalysis>;
}

// ============================================================================
// Reverse Geocoding
// ============================================================================

#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    /// Human-readable address of a coordinate, `None` when the service has none
    async fn reverse(&self, position: LatLng) -> ApiResult<Option<String>>;
}
