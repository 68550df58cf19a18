//! Domain entities - records exchanged with the backend

mod comment;
mod emotion;
mod profile;
mod requests;

pub use comment::{Author, Comment};
pub use emotion::EmotionRecord;
pub use profile::{CollectedEmotion, EmotionAnalysis, Page, UserStats};
pub use requests::{
    EmotionUpdate, NewComment, NewEmotion, ToggleOutcome, MAX_COMMENT_LENGTH, MAX_EMOTION_LENGTH,
};
