//! # emomap-pages
//!
//! Controllers for the pages around the map. Each one takes a
//! [`PageContext`] carrying the backend, geolocation and toast ports:
//!
//! - [`EmotionManager`] drives the quick-share modal on the map page
//! - [`AddEmotionPage`] is the full-page share form
//! - [`EmotionDetail`] handles likes, collections, comments and sharing
//! - [`ProfileManager`] shows the viewer's own records and analysis

pub mod add_emotion;
pub mod context;
pub mod emotion_detail;
pub mod emotion_manager;
pub mod error;
pub mod form;
pub mod profile;
pub mod sink;

/// Inline error slot of the emotion type picker
pub const FIELD_EMOTION_TYPE: &str = "emotion_type";
/// Inline error slot of the location picker
pub const FIELD_LOCATION: &str = "location";
/// Message area under the submit button
pub const FIELD_SUBMIT: &str = "submit";

pub use add_emotion::{AddEmotionPage, SubmitMessage};
pub use context::{PageContext, PageContextBuilder};
pub use emotion_detail::{EmotionDetail, ShareAction, ShareTarget};
pub use emotion_manager::{EmotionManager, FormMode, LocationStatus, SubmitOutcome};
pub use error::{FieldError, PageError, PageResult};
pub use form::{CharCount, CharCounter, CounterLevel, EmotionForm};
pub use profile::{
    insights, pagination, AnalysisView, EditDialog, PageButton, ProfileManager, ProfileTab,
    TabContent,
};
pub use sink::{EmotionSink, RecordingSink};
