//! Map filter state

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::EmotionType;
use crate::error::DomainError;

/// Relative-age cutoff for map markers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeWindow {
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "6h")]
    SixHours,
    #[serde(rename = "24h")]
    OneDay,
    #[serde(rename = "7d")]
    SevenDays,
    #[default]
    #[serde(rename = "all")]
    All,
}

impl TimeWindow {
    /// Maximum age in hours, `None` for no limit
    pub fn threshold_hours(self) -> Option<f64> {
        match self {
            Self::OneHour => Some(1.0),
            Self::SixHours => Some(6.0),
            Self::OneDay => Some(24.0),
            Self::SevenDays => Some(168.0),
            Self::All => None,
        }
    }

    /// Whether a record of the given age falls inside the window.
    ///
    /// The boundary itself is inside.
    pub fn admits(self, age_hours: f64) -> bool {
        match self.threshold_hours() {
            None => true,
            Some(limit) => age_hours <= limit,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OneHour => "1h",
            Self::SixHours => "6h",
            Self::OneDay => "24h",
            Self::SevenDays => "7d",
            Self::All => "all",
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeWindow {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1h" => Ok(Self::OneHour),
            "6h" => Ok(Self::SixHours),
            "24h" => Ok(Self::OneDay),
            "7d" => Ok(Self::SevenDays),
            "all" => Ok(Self::All),
            other => Err(DomainError::InvalidTimeWindow(other.to_string())),
        }
    }
}

/// Emotion-type filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EmotionFilter {
    #[default]
    All,
    Only(EmotionType),
}

impl EmotionFilter {
    pub fn admits(self, emotion_type: Option<EmotionType>) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => emotion_type == Some(wanted),
        }
    }
}

impl fmt::Display for EmotionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(t) => f.write_str(t.as_str()),
        }
    }
}

impl FromStr for EmotionFilter {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            Ok(Self::All)
        } else {
            s.parse().map(Self::Only)
        }
    }
}

/// Current filter selection of the map page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterState {
    pub emotion: EmotionFilter,
    pub window: TimeWindow,
}

impl FilterState {
    pub fn new(emotion: EmotionFilter, window: TimeWindow) -> Self {
        Self { emotion, window }
    }

    /// Parse the two select-box values of the filter popups
    pub fn parse(emotion: &str, window: &str) -> Result<Self, DomainError> {
        Ok(Self {
            emotion: emotion.parse()?,
            window: window.parse()?,
        })
    }

    /// True when nothing is filtered out
    pub fn is_unfiltered(&self) -> bool {
        self.emotion == EmotionFilter::All && self.window == TimeWindow::All
    }
}

impl fmt::Display for FilterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.emotion, self.window)
    }
}
