//! Emotion markers
//!
//! Styling is an exhaustive match over [`EmotionType`], so adding a label
//! without a visual is a compile error. Labels unknown to this build get a
//! neutral fallback.

use chrono::{DateTime, Utc};
use emomap_core::{EmotionId, EmotionKind, EmotionRecord, EmotionType, LatLng, SessionContext};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::popup::{select_content, PopupContent};

/// Glyph shown for a custom emotion without its own emoji
pub const CUSTOM_FALLBACK_GLYPH: &str = "🎭";

/// How an emotion looks on the map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmotionVisual {
    pub name: &'static str,
    pub glyph: String,
    pub color: &'static str,
}

impl EmotionVisual {
    fn fixed(name: &'static str, glyph: &str, color: &'static str) -> Self {
        Self {
            name,
            glyph: glyph.to_string(),
            color,
        }
    }
}

/// Display name, glyph and colour for an emotion label
pub fn visual_for(kind: &EmotionKind, custom_emoji: Option<&str>) -> EmotionVisual {
    let Some(known) = kind.known() else {
        return EmotionVisual::fixed("未知", "❓", "#808080");
    };

    match known {
        EmotionType::Happy => EmotionVisual::fixed("开心", "😊", "#FFD700"),
        EmotionType::Sad => EmotionVisual::fixed("难过", "😢", "#4169E1"),
        EmotionType::Angry => EmotionVisual::fixed("愤怒", "😠", "#FF4500"),
        EmotionType::Excited => EmotionVisual::fixed("兴奋", "🤩", "#FF69B4"),
        EmotionType::Calm => EmotionVisual::fixed("平静", "😌", "#98FB98"),
        EmotionType::Anxious => EmotionVisual::fixed("焦虑", "😰", "#DDA0DD"),
        EmotionType::Grateful => EmotionVisual::fixed("感激", "🙏", "#F0E68C"),
        EmotionType::Lonely => EmotionVisual::fixed("孤独", "😔", "#708090"),
        EmotionType::Love => EmotionVisual::fixed("恋爱", "😍", "#FF1493"),
        EmotionType::Tired => EmotionVisual::fixed("疲惫", "😴", "#A9A9A9"),
        EmotionType::Surprised => EmotionVisual::fixed("惊讶", "😲", "#FFA500"),
        EmotionType::Confused => EmotionVisual::fixed("困惑", "😕", "#D2B48C"),
        EmotionType::Custom => {
            let glyph = custom_emoji
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .unwrap_or(CUSTOM_FALLBACK_GLYPH);
            EmotionVisual::fixed("自定义", glyph, "#9370DB")
        }
    }
}

/// Marker icon geometry, in pixels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerIcon {
    pub glyph: String,
    pub color: &'static str,
    pub size: (u32, u32),
    /// Point of the icon placed on the coordinate
    pub anchor: (i32, i32),
    /// Popup tip relative to the anchor
    pub popup_anchor: (i32, i32),
}

impl MarkerIcon {
    pub const SIZE: u32 = 32;

    pub fn for_visual(visual: &EmotionVisual) -> Self {
        let half = (Self::SIZE / 2) as i32;
        Self {
            glyph: visual.glyph.clone(),
            color: visual.color,
            size: (Self::SIZE, Self::SIZE),
            anchor: (half, half),
            popup_anchor: (0, -half),
        }
    }
}

type ClickCallback = Arc<dyn Fn(&SessionContext, DateTime<Utc>) -> PopupContent + Send + Sync>;

/// A marker as handed to the map surface
#[derive(Clone)]
pub struct MarkerHandle {
    pub id: EmotionId,
    pub position: LatLng,
    pub visual: EmotionVisual,
    pub icon: MarkerIcon,
    pub title: String,
    on_click: ClickCallback,
}

impl MarkerHandle {
    /// Popup content for a click by `session` at `now`
    pub fn click(&self, session: &SessionContext, now: DateTime<Utc>) -> PopupContent {
        (self.on_click)(session, now)
    }
}

impl fmt::Debug for MarkerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkerHandle")
            .field("id", &self.id)
            .field("position", &self.position)
            .field("title", &self.title)
            .finish_non_exhaustive()
    }
}

/// Build the marker for a record at `position`
pub fn build_marker(record: &EmotionRecord, position: LatLng) -> MarkerHandle {
    let visual = visual_for(&record.emotion_type, record.custom_emoji.as_deref());
    let icon = MarkerIcon::for_visual(&visual);
    let snapshot = record.clone();

    MarkerHandle {
        id: record.id,
        position,
        title: visual.name.to_string(),
        visual,
        icon,
        on_click: Arc::new(move |session, now| select_content(&snapshot, session, now)),
    }
}

/// A record paired with its marker
#[derive(Debug, Clone)]
pub struct MarkerEntry {
    pub record: EmotionRecord,
    pub handle: MarkerHandle,
}

impl MarkerEntry {
    /// `None` when the record has no usable coordinates
    pub fn from_record(record: EmotionRecord) -> Option<Self> {
        let position = record.coordinates()?;
        let handle = build_marker(&record, position);
        Some(Self { record, handle })
    }

    #[inline]
    pub fn id(&self) -> EmotionId {
        self.record.id
    }
}

/// Turn fetched records into marker entries, dropping records without coordinates
pub fn ingest(records: impl IntoIterator<Item = EmotionRecord>) -> Vec<MarkerEntry> {
    let mut dropped = 0usize;
    let entries: Vec<MarkerEntry> = records
        .into_iter()
        .filter_map(|record| {
            let id = record.id;
            let entry = MarkerEntry::from_record(record);
            if entry.is_none() {
                dropped += 1;
                debug!(emotion_id = %id, "Skipping emotion without coordinates");
            }
            entry
        })
        .collect();

    debug!(markers = entries.len(), dropped, "Ingested emotions");
    entries
}
