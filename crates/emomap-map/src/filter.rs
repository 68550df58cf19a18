//! Marker visibility

use chrono::{DateTime, Utc};
use emomap_core::{EmotionRecord, FilterState};

use crate::marker::MarkerEntry;

/// Whether a record passes both the type and the time-window filter
#[inline]
pub fn matches(record: &EmotionRecord, filter: &FilterState, now: DateTime<Utc>) -> bool {
    filter.emotion.admits(record.emotion_type.known())
        && filter.window.admits(record.age_hours(now))
}

/// Entries visible under `filter`, in input order
pub fn visible_markers<'a>(
    entries: &'a [MarkerEntry],
    filter: &FilterState,
    now: DateTime<Utc>,
) -> Vec<&'a MarkerEntry> {
    entries
        .iter()
        .filter(|entry| matches(&entry.record, filter, now))
        .collect()
}
