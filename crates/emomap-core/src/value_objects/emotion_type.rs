//! Emotion labels and intensity

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// Closed set of emotion labels the application knows how to draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionType {
    Happy,
    Sad,
    Angry,
    Excited,
    Calm,
    Anxious,
    Love,
    Tired,
    Surprised,
    Confused,
    Grateful,
    Lonely,
    Custom,
}

impl EmotionType {
    /// Every label, in picker order
    pub const ALL: [EmotionType; 13] = [
        Self::Happy,
        Self::Sad,
        Self::Angry,
        Self::Excited,
        Self::Calm,
        Self::Anxious,
        Self::Love,
        Self::Tired,
        Self::Surprised,
        Self::Confused,
        Self::Grateful,
        Self::Lonely,
        Self::Custom,
    ];

    /// Wire name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Happy => "happy",
            Self::Sad => "sad",
            Self::Angry => "angry",
            Self::Excited => "excited",
            Self::Calm => "calm",
            Self::Anxious => "anxious",
            Self::Love => "love",
            Self::Tired => "tired",
            Self::Surprised => "surprised",
            Self::Confused => "confused",
            Self::Grateful => "grateful",
            Self::Lonely => "lonely",
            Self::Custom => "custom",
        }
    }

    #[inline]
    pub fn is_custom(self) -> bool {
        matches!(self, Self::Custom)
    }
}

impl fmt::Display for EmotionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmotionType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DomainError::InvalidEmotionType(s.to_string()))
    }
}

/// Emotion label as received from the backend.
///
/// Records written by older clients may carry labels this build does not know;
/// those are kept verbatim instead of failing the whole list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EmotionKind {
    Known(EmotionType),
    Unknown(String),
}

impl EmotionKind {
    /// Known label, if any
    pub fn known(&self) -> Option<EmotionType> {
        match self {
            Self::Known(t) => Some(*t),
            Self::Unknown(_) => None,
        }
    }

    /// Raw wire string
    pub fn as_str(&self) -> &str {
        match self {
            Self::Known(t) => t.as_str(),
            Self::Unknown(raw) => raw,
        }
    }

    #[inline]
    pub fn is(&self, emotion_type: EmotionType) -> bool {
        self.known() == Some(emotion_type)
    }
}

impl Default for EmotionKind {
    fn default() -> Self {
        Self::Unknown(String::new())
    }
}

impl From<EmotionType> for EmotionKind {
    fn from(t: EmotionType) -> Self {
        Self::Known(t)
    }
}

impl From<&str> for EmotionKind {
    fn from(raw: &str) -> Self {
        raw.parse::<EmotionType>()
            .map_or_else(|_| Self::Unknown(raw.to_string()), Self::Known)
    }
}

impl fmt::Display for EmotionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EmotionKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EmotionKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map_or_else(Self::default, |s| Self::from(s.as_str())))
    }
}

/// Self-reported strength of an emotion, 1 to 10
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Intensity(u8);

impl Intensity {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    pub fn new(value: u8) -> Result<Self, DomainError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(DomainError::InvalidIntensity(value))
        }
    }

    #[inline]
    pub fn value(self) -> u8 {
        self.0
    }

    /// Slider caption: mild, moderate or strong
    pub fn label(self) -> &'static str {
        match self.0 {
            0..=3 => "轻微",
            4..=7 => "中等",
            _ => "强烈",
        }
    }
}

impl Default for Intensity {
    fn default() -> Self {
        Self(5)
    }
}

impl TryFrom<u8> for Intensity {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Intensity> for u8 {
    fn from(i: Intensity) -> Self {
        i.0
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.0)
    }
}
