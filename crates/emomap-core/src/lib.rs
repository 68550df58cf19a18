//! # emomap-core
//!
//! Domain layer containing emotion records, value objects, domain errors, and
//! the ports (traits) through which the presentation core reaches the backend
//! and the reverse-geocoding service.
//! This crate has zero dependencies on infrastructure (HTTP client, map library, etc.).

pub mod entities;
pub mod error;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    Author, CollectedEmotion, Comment, EmotionAnalysis, EmotionRecord, EmotionUpdate, NewComment,
    NewEmotion, Page, ToggleOutcome, UserStats,
};
pub use error::{DomainError, ErrorCategory, ErrorSurface};
pub use traits::{ApiResult, EmotionApi, ReverseGeocoder};
pub use value_objects::{
    CommentId, EmotionFilter, EmotionId, EmotionKind, EmotionType, FilterState, IdParseError,
    Intensity, LatLng, Privacy, SessionContext, SessionUser, TimeWindow, Timestamp,
};
