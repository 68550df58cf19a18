//! Profile page data: statistics, paged lists and the emotion analysis

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::EmotionRecord;
use crate::value_objects::{EmotionKind, Timestamp};

/// Aggregate counters of the signed-in user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserStats {
    #[serde(default)]
    pub emotions_count: u32,
    #[serde(default)]
    pub total_likes: u32,
    #[serde(default)]
    pub total_collections: u32,
}

/// One entry of the collections list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectedEmotion {
    #[serde(default)]
    pub collection_id: Option<i64>,
    #[serde(default, alias = "created_at")]
    pub collected_at: Timestamp,
    pub emotion: EmotionRecord,
}

/// Emotion history summary
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EmotionAnalysis {
    #[serde(default)]
    pub emotion_distribution: BTreeMap<String, u32>,
    #[serde(default)]
    pub most_common_emotion: Option<EmotionKind>,
    #[serde(default)]
    pub most_active_hour: Option<u8>,
    #[serde(default)]
    pub daily_average: Option<f64>,
}

impl EmotionAnalysis {
    /// No data to analyse yet
    pub fn is_empty(&self) -> bool {
        self.emotion_distribution.is_empty()
            && self.most_common_emotion.is_none()
            && self.most_active_hour.is_none()
            && self.daily_average.is_none()
    }

    /// Share of each label in percent, in label order
    pub fn distribution_percentages(&self) -> Vec<(EmotionKind, f64)> {
        let total: u32 = self.emotion_distribution.values().sum();
        self.emotion_distribution
            .iter()
            .map(|(label, count)| {
                let share = if total == 0 {
                    0.0
                } else {
                    f64::from(*count) * 100.0 / f64::from(total)
                };
                (EmotionKind::from(label.as_str()), share)
            })
            .collect()
    }
}

/// One page of a profile list
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: u32, total_pages: u32) -> Self {
        Self {
            items,
            page,
            total_pages: total_pages.max(1),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::new(Vec::new(), 1, 1)
    }
}
