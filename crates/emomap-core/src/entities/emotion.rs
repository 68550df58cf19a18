//! Emotion record - one shared emotion pinned on the map

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Author;
use crate::value_objects::{EmotionId, EmotionKind, Intensity, LatLng, Privacy, Timestamp};

fn default_true() -> bool {
    true
}

// Out-of-range intensities from old rows are dropped, not fatal
fn lenient_intensity<'de, D>(deserializer: D) -> Result<Option<Intensity>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<i64>::deserialize(deserializer)?;
    Ok(raw
        .and_then(|v| u8::try_from(v).ok())
        .and_then(|v| Intensity::new(v).ok()))
}

/// Emotion record as returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionRecord {
    pub id: EmotionId,
    #[serde(default)]
    pub emotion_type: EmotionKind,
    #[serde(default)]
    pub custom_emoji: Option<String>,
    #[serde(default, alias = "content")]
    pub emotion_text: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub created_at: Timestamp,
    #[serde(default = "default_true")]
    pub is_public: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privacy_setting: Option<Privacy>,
    #[serde(default = "default_true")]
    pub allow_collection: bool,
    #[serde(default, deserialize_with = "lenient_intensity")]
    pub intensity: Option<Intensity>,
    #[serde(default)]
    pub likes_count: u32,
    #[serde(default)]
    pub comments_count: u32,
    #[serde(default)]
    pub collections_count: u32,
    #[serde(default)]
    pub is_liked: bool,
    #[serde(default)]
    pub is_collected: bool,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Author>,
}

impl EmotionRecord {
    /// Create a minimal public record
    pub fn new(id: EmotionId, emotion_type: impl Into<EmotionKind>, created_at: Timestamp) -> Self {
        Self {
            id,
            emotion_type: emotion_type.into(),
            custom_emoji: None,
            emotion_text: None,
            latitude: None,
            longitude: None,
            created_at,
            is_public: true,
            privacy_setting: None,
            allow_collection: true,
            intensity: None,
            likes_count: 0,
            comments_count: 0,
            collections_count: 0,
            is_liked: false,
            is_collected: false,
            username: None,
            avatar_url: None,
            user: None,
        }
    }

    /// Builder-style coordinate setter
    pub fn at(mut self, position: LatLng) -> Self {
        self.latitude = Some(position.lat);
        self.longitude = Some(position.lng);
        self
    }

    /// Map position, if both components are present and finite.
    ///
    /// Backend rows are not range-checked; only new emotions are.
    pub fn coordinates(&self) -> Option<LatLng> {
        let point = LatLng::new(self.latitude?, self.longitude?);
        point.is_finite().then_some(point)
    }

    /// Age in hours; infinite for an unparseable timestamp
    #[inline]
    pub fn age_hours(&self, now: DateTime<Utc>) -> f64 {
        self.created_at.age_hours(now)
    }

    /// Non-blank text, if any
    pub fn text(&self) -> Option<&str> {
        self.emotion_text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Content readable by everyone.
    ///
    /// Newer rows carry `privacy_setting`, older ones only `is_public`; either
    /// marking the record private wins.
    pub fn is_publicly_visible(&self) -> bool {
        self.is_public && self.privacy_setting.is_none_or(Privacy::is_public)
    }

    /// Author name or a placeholder
    pub fn author(&self) -> &str {
        self.username
            .as_deref()
            .or_else(|| self.user.as_ref().and_then(Author::name))
            .unwrap_or("匿名用户")
    }

    /// Author avatar, if any
    pub fn avatar(&self) -> Option<&str> {
        self.avatar_url
            .as_deref()
            .or_else(|| self.user.as_ref().and_then(|u| u.avatar_url.as_deref()))
    }

    /// Reflect a confirmed like/unlike
    pub fn set_liked(&mut self, liked: bool) {
        if liked != self.is_liked {
            self.is_liked = liked;
            self.likes_count = adjust(self.likes_count, liked);
        }
    }

    /// Reflect a confirmed collect/uncollect
    pub fn set_collected(&mut self, collected: bool) {
        if collected != self.is_collected {
            self.is_collected = collected;
            self.collections_count = adjust(self.collections_count, collected);
        }
    }
}

fn adjust(count: u32, up: bool) -> u32 {
    if up {
        count.saturating_add(1)
    } else {
        count.saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::EmotionType;

    fn record() -> EmotionRecord {
        EmotionRecord::new(EmotionId::new(1), EmotionType::Happy, Timestamp::new("2024-01-01T00:00:00Z"))
    }

    #[test]
    fn test_deserialize_backend_shape() {
        let json = r#"{
            "id": 5,
            "emotion_type": "custom",
            "custom_emoji": "🥳",
            "content": "party",
            "latitude": 39.9,
            "longitude": 116.4,
            "created_at": "2024-06-01T10:00:00",
            "intensity": 8
        }"#;
        let rec: EmotionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.id, EmotionId::new(5));
        assert!(rec.emotion_type.is(EmotionType::Custom));
        assert_eq!(rec.text(), Some("party"));
        assert!(rec.is_public);
        assert!(rec.allow_collection);
        assert_eq!(rec.likes_count, 0);
        assert_eq!(rec.intensity.map(Intensity::value), Some(8));
    }

    #[test]
    fn test_coordinates_require_both_parts() {
        let mut rec = record();
        assert_eq!(rec.coordinates(), None);

        rec.latitude = Some(39.9);
        assert_eq!(rec.coordinates(), None);

        rec.longitude = Some(116.4);
        assert_eq!(rec.coordinates(), Some(LatLng::new(39.9, 116.4)));

        rec.latitude = Some(95.0);
        assert_eq!(rec.coordinates(), Some(LatLng::new(95.0, 116.4)));

        rec.latitude = Some(f64::NAN);
        assert_eq!(rec.coordinates(), None);
    }

    #[test]
    fn test_null_coordinates_deserialize() {
        let rec: EmotionRecord =
            serde_json::from_str(r#"{"id": 2, "emotion_type": "sad", "latitude": null, "longitude": null}"#)
                .unwrap();
        assert_eq!(rec.coordinates(), None);
    }

    #[test]
    fn test_out_of_range_intensity_is_dropped() {
        let rec: EmotionRecord =
            serde_json::from_str(r#"{"id": 3, "emotion_type": "calm", "intensity": 42}"#).unwrap();
        assert_eq!(rec.intensity, None);
    }

    #[test]
    fn test_privacy_setting_marks_private() {
        let rec: EmotionRecord = serde_json::from_str(
            r#"{"id": 4, "emotion_type": "sad", "privacy_setting": "private", "user": {"username": "amy"}}"#,
        )
        .unwrap();
        assert!(rec.is_public);
        assert!(!rec.is_publicly_visible());
        assert_eq!(rec.author(), "amy");

        let mut rec = record();
        assert!(rec.is_publicly_visible());
        rec.is_public = false;
        assert!(!rec.is_publicly_visible());
    }

    #[test]
    fn test_blank_text_is_none() {
        let mut rec = record();
        rec.emotion_text = Some("   ".to_string());
        assert_eq!(rec.text(), None);
    }

    #[test]
    fn test_like_and_collect_counters() {
        let mut rec = record();
        rec.set_liked(true);
        rec.set_liked(true);
        assert_eq!(rec.likes_count, 1);
        rec.set_liked(false);
        assert_eq!(rec.likes_count, 0);

        rec.is_collected = true;
        rec.set_collected(false);
        assert_eq!(rec.collections_count, 0);
    }
}
