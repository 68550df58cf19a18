//! Request payloads sent to the backend
//!
//! Every payload implements `Validate` so a form can be checked before any
//! network call. Length limits count characters, not bytes.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::value_objects::{EmotionType, Intensity, LatLng, Privacy};

/// Hard limit on emotion text
pub const MAX_EMOTION_LENGTH: usize = 200;

/// Hard limit on comment text
pub const MAX_COMMENT_LENGTH: usize = 500;

// ============================================================================
// Emotion Requests
// ============================================================================

/// Create emotion request
#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
#[validate(schema(function = "validate_new_emotion"))]
pub struct NewEmotion {
    pub emotion_type: EmotionType,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_emoji: Option<String>,

    #[serde(rename = "description")]
    #[validate(length(max = 200, message = "情绪描述不能超过200个字符"))]
    pub emotion_text: String,

    pub intensity: Intensity,

    pub latitude: f64,
    pub longitude: f64,

    pub privacy_setting: Privacy,
    pub allow_collection: bool,
}

impl NewEmotion {
    /// Public emotion of the given type at `position`, collectable, default intensity
    pub fn new(emotion_type: EmotionType, position: LatLng) -> Self {
        Self {
            emotion_type,
            custom_emoji: None,
            emotion_text: String::new(),
            intensity: Intensity::default(),
            latitude: position.lat,
            longitude: position.lng,
            privacy_setting: Privacy::Public,
            allow_collection: true,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.emotion_text = text.into().trim().to_string();
        self
    }

    pub fn with_custom_emoji(mut self, emoji: impl Into<String>) -> Self {
        self.custom_emoji = Some(emoji.into());
        self
    }

    pub fn with_intensity(mut self, intensity: Intensity) -> Self {
        self.intensity = intensity;
        self
    }

    /// Set visibility; a private emotion is never collectable
    pub fn with_privacy(mut self, privacy: Privacy, allow_collection: bool) -> Self {
        self.privacy_setting = privacy;
        self.allow_collection = privacy.is_public() && allow_collection;
        self
    }

    pub fn position(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }
}

fn validate_new_emotion(req: &NewEmotion) -> Result<(), ValidationError> {
    if req.emotion_type.is_custom()
        && req.custom_emoji.as_deref().is_none_or(|e| e.trim().is_empty())
    {
        return Err(ValidationError::new("custom_emoji").with_message("请选择一个自定义心情表情".into()));
    }
    if !req.position().is_valid() {
        return Err(ValidationError::new("location").with_message("请选择一个位置".into()));
    }
    if !req.privacy_setting.is_public() && req.allow_collection {
        return Err(ValidationError::new("allow_collection").with_message("私密情绪不能被收藏".into()));
    }
    Ok(())
}

/// Update emotion request; absent fields are left unchanged
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_emotion_update"))]
pub struct EmotionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emotion_type: Option<EmotionType>,

    #[serde(rename = "content", skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 200, message = "情绪内容不能超过200个字符"))]
    pub emotion_text: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub privacy_setting: Option<Privacy>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_collection: Option<bool>,
}

impl EmotionUpdate {
    /// Build the edit-form payload, forcing collection off for private emotions
    pub fn from_form(
        emotion_type: EmotionType,
        text: &str,
        is_public: bool,
        allow_collection: bool,
    ) -> Self {
        Self {
            emotion_type: Some(emotion_type),
            emotion_text: Some(text.trim().to_string()),
            privacy_setting: Some(Privacy::from_public(is_public)),
            allow_collection: Some(is_public && allow_collection),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.emotion_type.is_none()
            && self.emotion_text.is_none()
            && self.privacy_setting.is_none()
            && self.allow_collection.is_none()
    }
}

fn validate_emotion_update(req: &EmotionUpdate) -> Result<(), ValidationError> {
    if req.is_empty() {
        return Err(ValidationError::new("empty").with_message("没有可更新的字段".into()));
    }
    if req.privacy_setting == Some(Privacy::Private) && req.allow_collection == Some(true) {
        return Err(ValidationError::new("allow_collection").with_message("私密情绪不能被收藏".into()));
    }
    Ok(())
}

// ============================================================================
// Comment Requests
// ============================================================================

/// Create comment request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Validate)]
pub struct NewComment {
    #[serde(rename = "content")]
    #[validate(
        length(min = 1, max = 500, message = "评论内容须为1-500个字符"),
        custom(function = "not_blank")
    )]
    pub comment_text: String,
}

impl NewComment {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            comment_text: text.into().trim().to_string(),
        }
    }
}

fn not_blank(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("请输入评论内容".into()));
    }
    Ok(())
}

// ============================================================================
// Toggle Responses
// ============================================================================

/// Body of a like/collect toggle response
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ToggleOutcome {
    /// "liked", "unliked", "collected", "uncollected"
    #[serde(default)]
    pub action: Option<String>,

    /// Fresh counter, when the backend sends one
    #[serde(default, alias = "likes_count", alias = "collections_count")]
    pub count: Option<u32>,
}

impl ToggleOutcome {
    /// Whether the toggle ended in the "on" state, if the backend said so
    pub fn is_active(&self) -> Option<bool> {
        match self.action.as_deref()? {
            "liked" | "collected" => Some(true),
            "unliked" | "uncollected" => Some(false),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    fn here() -> LatLng {
        LatLng::new(39.9, 116.4)
    }

    #[test]
    fn test_new_emotion_validation() {
        let valid = NewEmotion::new(EmotionType::Happy, here()).with_text("sunny");
        assert!(valid.validate().is_ok());

        let too_long = NewEmotion::new(EmotionType::Happy, here()).with_text("字".repeat(201));
        assert!(too_long.validate().is_err());

        // 200 multi-byte characters are within the limit
        let at_limit = NewEmotion::new(EmotionType::Happy, here()).with_text("字".repeat(200));
        assert!(at_limit.validate().is_ok());
    }

    #[test]
    fn test_custom_requires_emoji() {
        let missing = NewEmotion::new(EmotionType::Custom, here());
        assert!(missing.validate().is_err());

        let given = NewEmotion::new(EmotionType::Custom, here()).with_custom_emoji("🥳");
        assert!(given.validate().is_ok());
    }

    #[test]
    fn test_location_must_be_valid() {
        let nowhere = NewEmotion::new(EmotionType::Calm, LatLng::new(f64::NAN, 0.0));
        assert!(nowhere.validate().is_err());
    }

    #[test]
    fn test_private_is_never_collectable() {
        let req = NewEmotion::new(EmotionType::Sad, here()).with_privacy(Privacy::Private, true);
        assert!(!req.allow_collection);
        assert!(req.validate().is_ok());

        let update = EmotionUpdate::from_form(EmotionType::Sad, "x", false, true);
        assert_eq!(update.allow_collection, Some(false));
        assert_eq!(update.privacy_setting, Some(Privacy::Private));
    }

    #[test]
    fn test_new_emotion_wire_shape() {
        let req = NewEmotion::new(EmotionType::Love, here()).with_text("hi");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["emotion_type"], "love");
        assert_eq!(json["description"], "hi");
        assert_eq!(json["privacy_setting"], "public");
        assert_eq!(json["intensity"], 5);
        assert!(json.get("custom_emoji").is_none());
    }

    #[test]
    fn test_empty_update_rejected() {
        assert!(EmotionUpdate::default().validate().is_err());
    }

    #[test]
    fn test_comment_validation() {
        assert!(NewComment::new("nice").validate().is_ok());
        assert!(NewComment::new("   ").validate().is_err());
        assert!(NewComment::new("a".repeat(501)).validate().is_err());
    }

    #[test]
    fn test_toggle_outcome() {
        let outcome: ToggleOutcome =
            serde_json::from_str(r#"{"action": "liked", "likes_count": 3}"#).unwrap();
        assert_eq!(outcome.is_active(), Some(true));
        assert_eq!(outcome.count, Some(3));

        let outcome: ToggleOutcome = serde_json::from_str("{}").unwrap();
        assert_eq!(outcome.is_active(), None);
    }
}
