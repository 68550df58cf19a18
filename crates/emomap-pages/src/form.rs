//! Emotion form state shared by the share modal and the edit dialog

use emomap_core::{EmotionRecord, EmotionType, EmotionUpdate, Intensity, LatLng, NewEmotion, Privacy};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{PageError, PageResult};

// ============================================================================
// Character Counter
// ============================================================================

/// Colour band of the character counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterLevel {
    Normal,
    /// Above 70% of the limit
    Warning,
    /// Above 90% of the limit
    Danger,
}

impl CounterLevel {
    pub fn color(self) -> &'static str {
        match self {
            Self::Normal => "#6c757d",
            Self::Warning => "#ffc107",
            Self::Danger => "#dc3545",
        }
    }
}

/// Counter reading for one text value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharCount {
    pub length: usize,
    pub max: usize,
    pub level: CounterLevel,
}

impl CharCount {
    pub fn is_over(&self) -> bool {
        self.length > self.max
    }
}

impl fmt::Display for CharCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.length, self.max)
    }
}

/// Live "n/max" counter under a text box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharCounter {
    max: usize,
}

impl CharCounter {
    pub fn new(max: usize) -> Self {
        Self { max }
    }

    pub fn max(&self) -> usize {
        self.max
    }

    /// Count characters, not bytes
    pub fn measure(&self, text: &str) -> CharCount {
        let length = text.chars().count();
        // length * 10 > max * 9 is length > 90% without floats
        let level = if length * 10 > self.max * 9 {
            CounterLevel::Danger
        } else if length * 10 > self.max * 7 {
            CounterLevel::Warning
        } else {
            CounterLevel::Normal
        };
        CharCount {
            length,
            max: self.max,
            level,
        }
    }
}

// ============================================================================
// Form State
// ============================================================================

/// What the user has entered so far
#[derive(Debug, Clone, PartialEq)]
pub struct EmotionForm {
    pub selected: Option<EmotionType>,
    pub custom_emoji: Option<String>,
    pub text: String,
    pub intensity: Intensity,
    pub is_public: bool,
    pub allow_collection: bool,
}

impl Default for EmotionForm {
    fn default() -> Self {
        Self {
            selected: None,
            custom_emoji: None,
            text: String::new(),
            intensity: Intensity::default(),
            is_public: true,
            allow_collection: true,
        }
    }
}

impl EmotionForm {
    /// Prefill from an existing record (edit mode)
    pub fn from_record(record: &EmotionRecord) -> Self {
        Self {
            selected: record.emotion_type.known(),
            custom_emoji: record.custom_emoji.clone(),
            text: record.emotion_text.clone().unwrap_or_default(),
            intensity: record.intensity.unwrap_or_default(),
            is_public: record.is_publicly_visible(),
            allow_collection: record.allow_collection,
        }
    }

    /// Choose a type; a non-custom type drops any custom emoji
    pub fn select(&mut self, emotion_type: EmotionType) {
        self.selected = Some(emotion_type);
        if !emotion_type.is_custom() {
            self.custom_emoji = None;
        }
    }

    pub fn privacy(&self) -> Privacy {
        Privacy::from_public(self.is_public)
    }

    /// Create payload at `position`; `None` until a type is chosen
    pub fn to_new_emotion(&self, position: LatLng) -> Option<NewEmotion> {
        let emotion_type = self.selected?;
        let mut request = NewEmotion::new(emotion_type, position)
            .with_text(self.text.as_str())
            .with_intensity(self.intensity)
            .with_privacy(self.privacy(), self.allow_collection);
        if let Some(emoji) = self.custom_emoji.as_deref().filter(|_| emotion_type.is_custom()) {
            request = request.with_custom_emoji(emoji);
        }
        Some(request)
    }

    /// Update payload; `None` until a type is chosen
    pub fn to_update(&self) -> Option<EmotionUpdate> {
        let emotion_type = self.selected?;
        Some(EmotionUpdate::from_form(
            emotion_type,
            &self.text,
            self.is_public,
            self.allow_collection,
        ))
    }
}

// ============================================================================
// Submit Guard
// ============================================================================

/// Holds a form's in-flight flag until dropped
pub(crate) struct SubmitGuard<'a>(&'a AtomicBool);

impl<'a> SubmitGuard<'a> {
    /// Fails with [`PageError::Busy`] while another submit holds the flag
    pub(crate) fn acquire(flag: &'a AtomicBool) -> PageResult<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self(flag))
            .map_err(|_| PageError::Busy)
    }
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
