//! Value objects - immutable types that represent domain concepts

mod coordinates;
mod emotion_id;
mod emotion_type;
mod filter;
mod privacy;
mod session;
mod timestamp;

pub use coordinates::LatLng;
pub use emotion_id::{CommentId, EmotionId, IdParseError};
pub use emotion_type::{EmotionKind, EmotionType, Intensity};
pub use filter::{EmotionFilter, FilterState, TimeWindow};
pub use privacy::Privacy;
pub use session::{SessionContext, SessionUser};
pub use timestamp::Timestamp;
